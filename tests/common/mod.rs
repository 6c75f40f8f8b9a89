#![allow(dead_code)]

//! In-memory stand-in for the monitoring backend, mirroring its lifecycle
//! semantics closely enough to exercise the controller end to end.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use opsdash::alerts::{Alert, AlertHistoryEntry, AlertStatus, NewAlert, Severity};
use opsdash::client::{ApiError, ApiResult, MetricHistory, MonitorApi, StatusReply};
use opsdash::pipeline::{PerfReport, RawSeries};

#[derive(Default)]
pub struct FakeState {
    pub running: bool,
    pub metrics: BTreeMap<String, RawSeries>,
    pub performance: PerfReport,
    pub alerts: Vec<Alert>,
    pub history: Vec<AlertHistoryEntry>,
    /// Every API invocation in order, for call-count assertions.
    pub calls: Vec<String>,
    /// When set, the next mutating call fails with this message.
    pub fail_next: Option<String>,
    clock: f64,
}

impl FakeState {
    fn tick(&mut self) -> f64 {
        self.clock += 1.0;
        10_000.0 + self.clock
    }

    fn record_history(&mut self, alert: &str, action: &str) {
        let timestamp = self.tick();
        self.history.push(AlertHistoryEntry {
            timestamp,
            alert: alert.to_string(),
            action: action.to_string(),
            details: BTreeMap::new(),
        });
    }

    fn take_failure(&mut self) -> Option<ApiError> {
        self.fail_next.take().map(ApiError::Rejected)
    }
}

#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn fail_next(&self, message: &str) {
        self.state().fail_next = Some(message.to_string());
    }

    pub fn set_metrics(&self, metrics: &[(&str, &[(f64, f64)])]) {
        self.state().metrics = metrics
            .iter()
            .map(|(name, points)| (name.to_string(), points.to_vec()))
            .collect();
    }

    pub fn seed_alert(&self, name: &str, severity: Severity) {
        let mut state = self.state();
        let triggered_at = state.tick();
        state.alerts.push(make_alert(name, severity, triggered_at));
        state.record_history(name, "trigger");
    }
}

pub fn make_alert(name: &str, severity: Severity, triggered_at: f64) -> Alert {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "description": format!("{name} description"),
        "severity": severity.name(),
        "category": "system",
        "status": "active",
        "triggered_at": triggered_at,
        "silenced": false,
        "trigger_count": 1
    }))
    .expect("valid alert json")
}

#[async_trait]
impl MonitorApi for FakeApi {
    async fn status(&self) -> ApiResult<StatusReply> {
        let mut state = self.state();
        state.calls.push("status".to_string());
        Ok(StatusReply {
            status: if state.running { "active" } else { "stopped" }.to_string(),
            system_info: None,
        })
    }

    async fn metrics(&self, category: &str) -> ApiResult<BTreeMap<String, RawSeries>> {
        let mut state = self.state();
        state.calls.push(format!("metrics:{category}"));
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
        let prefix = format!("{category}.");
        Ok(state
            .metrics
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, points)| (name.clone(), points.clone()))
            .collect())
    }

    async fn metric_history(&self, name: &str, limit: usize) -> ApiResult<MetricHistory> {
        let mut state = self.state();
        state.calls.push(format!("history:{name}"));
        let points = state
            .metrics
            .get(name)
            .ok_or_else(|| ApiError::Rejected(format!("Metric not found: {name}")))?;
        let start = points.len().saturating_sub(limit);
        Ok(MetricHistory {
            name: name.to_string(),
            values: points[start..].to_vec(),
        })
    }

    async fn performance(&self, _category: Option<&str>) -> ApiResult<PerfReport> {
        let mut state = self.state();
        state.calls.push("performance".to_string());
        Ok(state.performance.clone())
    }

    async fn active_alerts(&self) -> ApiResult<Vec<Alert>> {
        let mut state = self.state();
        state.calls.push("alerts".to_string());
        Ok(state
            .alerts
            .iter()
            .filter(|a| a.status != AlertStatus::Resolved)
            .cloned()
            .collect())
    }

    async fn alert_history(&self, limit: usize) -> ApiResult<Vec<AlertHistoryEntry>> {
        let mut state = self.state();
        state.calls.push("alert_history".to_string());
        let start = state.history.len().saturating_sub(limit);
        Ok(state.history[start..].to_vec())
    }

    async fn create_alert(&self, alert: &NewAlert) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.push(format!("create:{}", alert.name));
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
        let triggered_at = state.tick();
        let mut created = make_alert(&alert.name, alert.severity, triggered_at);
        created.description = alert.description.clone();
        created.category = alert.category.clone();
        state.alerts.push(created);
        state.record_history(&alert.name, "trigger");
        Ok(())
    }

    async fn acknowledge_alert(&self, name: &str, user: &str) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.push(format!("acknowledge:{name}"));
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
        let acknowledged_at = state.tick();
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.name == name && a.status == AlertStatus::Active)
            .ok_or_else(|| ApiError::Rejected(format!("Alert not found or not active: {name}")))?;
        alert.status = AlertStatus::Acknowledged;
        alert.acknowledged_at = Some(acknowledged_at);
        alert.acknowledged_by = Some(user.to_string());
        state.record_history(name, "acknowledge");
        Ok(())
    }

    async fn resolve_alert(&self, name: &str) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.push(format!("resolve:{name}"));
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
        let resolved_at = state.tick();
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.name == name && a.status != AlertStatus::Resolved)
            .ok_or_else(|| {
                ApiError::Rejected(format!("Alert not found or already resolved: {name}"))
            })?;
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(resolved_at);
        state.record_history(name, "resolve");
        Ok(())
    }

    async fn silence_alert(&self, name: &str, silence: bool) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.push(format!("silence:{name}"));
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| ApiError::Rejected(format!("Alert not found: {name}")))?;
        alert.silenced = silence;
        state.record_history(name, if silence { "silence" } else { "unsilence" });
        Ok(())
    }

    async fn start_monitoring(&self) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.push("start".to_string());
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
        state.running = true;
        Ok(())
    }

    async fn stop_monitoring(&self) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.push("stop".to_string());
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
        state.running = false;
        Ok(())
    }
}
