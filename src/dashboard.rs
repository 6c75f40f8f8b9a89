//! Dashboard state controller: owns the view state, wires user intent to
//! the fetch pipeline, chart registry, alert lifecycle, log view, scheduler
//! and notice board, and orchestrates per-tab refresh.
//!
//! All state lives on the controller instance; nothing is shared through
//! globals. Passive loads degrade gracefully: a failed fetch is logged and
//! the last good view stays on screen. User-initiated mutations surface
//! their outcome on the notice board and never touch local state on failure.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use crate::alerts::{
    count_by_severity, sort_by_severity, Alert, AlertHistoryEntry, NewAlert, SeverityCounts,
};
use crate::charts::{ChartKind, ChartRegistry};
use crate::client::{MonitorApi, SystemInfo};
use crate::logs::{simulated_buffer, LogView};
use crate::notify::NoticeBoard;
use crate::pipeline::{
    classify_system, flatten_performance, CategorySnapshot, MetricSeries, PerfRow, SystemBuckets,
};
use crate::scheduler::AutoRefresh;

/// Auto-refresh interval choices in seconds, `0` meaning off.
pub const REFRESH_PRESETS: [u64; 6] = [0, 5, 10, 30, 60, 300];

/// How many history entries to request when reloading the alert view.
const ALERT_HISTORY_LIMIT: usize = 50;

/// The four dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    System,
    Performance,
    Alerts,
    Logs,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::System, Tab::Performance, Tab::Alerts, Tab::Logs]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tab::System => "System",
            Tab::Performance => "Performance",
            Tab::Alerts => "Alerts",
            Tab::Logs => "Logs",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::System => 0,
            Tab::Performance => 1,
            Tab::Alerts => 2,
            Tab::Logs => 3,
        }
    }

    pub fn next(&self) -> Tab {
        match self {
            Tab::System => Tab::Performance,
            Tab::Performance => Tab::Alerts,
            Tab::Alerts => Tab::Logs,
            Tab::Logs => Tab::System,
        }
    }

    /// Parse a tab name as given on the command line. Unknown names yield
    /// `None` and the caller keeps the current tab.
    pub fn parse(value: &str) -> Option<Tab> {
        match value.to_ascii_lowercase().as_str() {
            "system" => Some(Tab::System),
            "performance" => Some(Tab::Performance),
            "alerts" => Some(Tab::Alerts),
            "logs" => Some(Tab::Logs),
            _ => None,
        }
    }
}

/// Logical resources with independently sequenced requests.
#[derive(Debug, Clone, Copy)]
enum Resource {
    Status,
    Metrics,
    Performance,
    Alerts,
    Focus,
}

const RESOURCE_COUNT: usize = 5;

/// Monotonic per-resource sequence numbers. A response is applied only when
/// it carries the latest sequence issued for its resource, so the most
/// recently expressed intent wins even if an older request completes later.
#[derive(Debug, Default)]
struct Sequencer {
    issued: [u64; RESOURCE_COUNT],
}

impl Sequencer {
    fn begin(&mut self, resource: Resource) -> u64 {
        let slot = &mut self.issued[resource as usize];
        *slot += 1;
        *slot
    }

    fn is_latest(&self, resource: Resource, seq: u64) -> bool {
        self.issued[resource as usize] == seq
    }
}

/// The interactive state every view reads.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub current_tab: Tab,
    pub monitoring_active: bool,
    pub refresh_interval_secs: u64,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            current_tab: Tab::System,
            monitoring_active: false,
            refresh_interval_secs: 0,
            last_refresh: None,
        }
    }
}

/// Top-level owner of dashboard state and the components behind each tab.
pub struct Dashboard<A> {
    api: A,
    actor: String,
    history_points: usize,
    pub state: DashboardState,
    pub system_info: Option<SystemInfo>,
    pub system: Option<CategorySnapshot>,
    pub buckets: SystemBuckets,
    pub perf_rows: Vec<PerfRow>,
    pub focused_metric: Option<String>,
    pub alerts: Vec<Alert>,
    pub alert_counts: SeverityCounts,
    pub alert_history: Vec<AlertHistoryEntry>,
    pub logs: LogView,
    pub charts: ChartRegistry,
    pub notices: NoticeBoard,
    scheduler: AutoRefresh,
    refresh_tx: mpsc::Sender<()>,
    seq: Sequencer,
}

impl<A: MonitorApi> Dashboard<A> {
    pub fn new(api: A, actor: String, history_points: usize, refresh_tx: mpsc::Sender<()>) -> Self {
        Self {
            api,
            actor,
            history_points,
            state: DashboardState::default(),
            system_info: None,
            system: None,
            buckets: SystemBuckets::default(),
            perf_rows: Vec::new(),
            focused_metric: None,
            alerts: Vec::new(),
            alert_counts: SeverityCounts::default(),
            alert_history: Vec::new(),
            logs: LogView::default(),
            charts: ChartRegistry::new(),
            notices: NoticeBoard::default(),
            scheduler: AutoRefresh::new(),
            refresh_tx,
            seq: Sequencer::default(),
        }
    }

    /// Switch the active view and load its data.
    pub async fn switch_tab(&mut self, tab: Tab) {
        self.state.current_tab = tab;
        self.load_tab(tab).await;
    }

    /// Stamp the refresh time, reload the current tab and re-check the
    /// monitoring run state. Scheduled and manual refresh both land here.
    pub async fn refresh(&mut self) {
        self.state.last_refresh = Some(Utc::now());
        self.load_tab(self.state.current_tab).await;
        self.check_status().await;
    }

    /// Request a start or stop depending on the current run state. The local
    /// flag only flips once the server confirms.
    pub async fn toggle_monitoring(&mut self) {
        let result = if self.state.monitoring_active {
            self.api.stop_monitoring().await
        } else {
            self.api.start_monitoring().await
        };
        match result {
            Ok(()) => {
                self.state.monitoring_active = !self.state.monitoring_active;
                let verb = if self.state.monitoring_active {
                    "started"
                } else {
                    "stopped"
                };
                self.notices.success(format!("monitoring {verb}"));
            }
            Err(err) => self.notices.error(format!("monitoring toggle failed: {err}")),
        }
    }

    /// Re-arm the refresh schedule; zero seconds disables it.
    pub fn set_auto_refresh(&mut self, seconds: u64) {
        self.state.refresh_interval_secs = seconds;
        self.scheduler
            .schedule(Duration::from_secs(seconds), self.refresh_tx.clone());
    }

    /// Advance to the next interval preset and return it.
    pub fn cycle_auto_refresh(&mut self) -> u64 {
        let current = self.state.refresh_interval_secs;
        let position = REFRESH_PRESETS.iter().position(|p| *p == current);
        let next = match position {
            Some(i) => REFRESH_PRESETS[(i + 1) % REFRESH_PRESETS.len()],
            None => REFRESH_PRESETS[0],
        };
        self.set_auto_refresh(next);
        next
    }

    async fn load_tab(&mut self, tab: Tab) {
        match tab {
            Tab::System => self.load_system().await,
            Tab::Performance => self.load_performance().await,
            Tab::Alerts => self.load_alerts().await,
            Tab::Logs => self.load_logs(),
        }
    }

    async fn check_status(&mut self) {
        let seq = self.seq.begin(Resource::Status);
        match self.api.status().await {
            Ok(reply) => {
                if !self.seq.is_latest(Resource::Status, seq) {
                    return;
                }
                self.state.monitoring_active = reply.is_running();
                if reply.system_info.is_some() {
                    self.system_info = reply.system_info;
                }
            }
            Err(err) => warn!(error = %err, "status check failed"),
        }
    }

    /// Fetch the system category, rebuild the chart buckets and update the
    /// chart slots. On failure the stale snapshot stays in place.
    pub async fn load_system(&mut self) {
        let seq = self.seq.begin(Resource::Metrics);
        match self.api.metrics("system").await {
            Ok(raw) => {
                if !self.seq.is_latest(Resource::Metrics, seq) {
                    return;
                }
                let snapshot = CategorySnapshot::from_raw("system", raw);
                self.buckets = classify_system(&snapshot);
                self.system = Some(snapshot);
                self.render_system_charts();
            }
            Err(err) => warn!(error = %err, "system metrics fetch failed, keeping last view"),
        }
    }

    fn render_system_charts(&mut self) {
        if let Some(series) = self.buckets.cpu_chart() {
            let (labels, values) = (series.labels(), series.values());
            self.charts.render(
                "system.cpu",
                ChartKind::Percentage,
                labels,
                vec![("CPU %".to_string(), values)],
            );
        }
        if let Some(series) = self.buckets.memory_chart() {
            let (labels, values) = (series.labels(), series.values());
            self.charts.render(
                "system.memory",
                ChartKind::Percentage,
                labels,
                vec![("Memory %".to_string(), values)],
            );
        }

        let disk = self.buckets.disk_chart();
        if let Some(first) = disk.first() {
            let labels = first.labels();
            let series = disk
                .iter()
                .map(|s| (series_label(&s.name), s.values()))
                .collect();
            self.charts
                .render("system.disk", ChartKind::Raw, labels, series);
        }

        let network = self.buckets.network_chart();
        if let Some(first) = network.first() {
            let labels = first.labels();
            let series = network
                .iter()
                .map(|s| (series_label(&s.name), s.values()))
                .collect();
            self.charts
                .render("system.network", ChartKind::ByteRate, labels, series);
        }
    }

    /// Fetch performance statistics across all categories and flatten them
    /// for the table.
    pub async fn load_performance(&mut self) {
        let seq = self.seq.begin(Resource::Performance);
        match self.api.performance(None).await {
            Ok(report) => {
                if !self.seq.is_latest(Resource::Performance, seq) {
                    return;
                }
                self.perf_rows = flatten_performance(&report);
            }
            Err(err) => warn!(error = %err, "performance fetch failed, keeping last view"),
        }
    }

    /// Load one metric's recent history into the focus chart.
    pub async fn focus_metric(&mut self, name: &str) {
        let seq = self.seq.begin(Resource::Focus);
        match self.api.metric_history(name, self.history_points).await {
            Ok(history) => {
                if !self.seq.is_latest(Resource::Focus, seq) {
                    return;
                }
                let series = MetricSeries {
                    name: history.name.clone(),
                    points: history.values,
                };
                self.charts.render(
                    "performance.focus",
                    ChartKind::Seconds,
                    series.labels(),
                    vec![("seconds".to_string(), series.values())],
                );
                self.focused_metric = Some(history.name);
            }
            Err(err) => warn!(error = %err, metric = name, "metric history fetch failed"),
        }
    }

    /// Reload active alerts and history together.
    pub async fn load_alerts(&mut self) {
        let seq = self.seq.begin(Resource::Alerts);
        let alerts = self.api.active_alerts().await;
        let history = self.api.alert_history(ALERT_HISTORY_LIMIT).await;
        if !self.seq.is_latest(Resource::Alerts, seq) {
            return;
        }
        match (alerts, history) {
            (Ok(mut alerts), Ok(history)) => {
                sort_by_severity(&mut alerts);
                self.alert_counts = count_by_severity(&alerts);
                self.alerts = alerts;
                self.alert_history = history;
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "alert fetch failed, keeping last view");
            }
        }
    }

    /// (Re)build the simulated log buffer. Filter state survives the reload.
    pub fn load_logs(&mut self) {
        self.logs.load(simulated_buffer(Utc::now()));
    }

    /// Validate and submit a new alert. Validation failures never reach the
    /// network.
    pub async fn create_alert(&mut self, draft: NewAlert) {
        if let Err(message) = draft.validate() {
            self.notices.error(message);
            return;
        }
        match self.api.create_alert(&draft).await {
            Ok(()) => {
                self.notices.success(format!("alert created: {}", draft.name));
                self.load_alerts().await;
            }
            Err(err) => self.notices.error(format!("create failed: {err}")),
        }
    }

    pub async fn acknowledge_alert(&mut self, name: &str) {
        let actor = self.actor.clone();
        match self.api.acknowledge_alert(name, &actor).await {
            Ok(()) => {
                self.notices.success(format!("alert acknowledged: {name}"));
                self.load_alerts().await;
            }
            Err(err) => self.notices.error(format!("acknowledge failed: {err}")),
        }
    }

    pub async fn resolve_alert(&mut self, name: &str) {
        match self.api.resolve_alert(name).await {
            Ok(()) => {
                self.notices.success(format!("alert resolved: {name}"));
                self.load_alerts().await;
            }
            Err(err) => self.notices.error(format!("resolve failed: {err}")),
        }
    }

    /// Flip the silence flag of the named alert to the opposite of what the
    /// active view currently shows.
    pub async fn toggle_silence(&mut self, name: &str) {
        let silence = !self
            .alerts
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.silenced)
            .unwrap_or(false);
        match self.api.silence_alert(name, silence).await {
            Ok(()) => {
                let verb = if silence { "silenced" } else { "unsilenced" };
                self.notices.success(format!("alert {verb}: {name}"));
                self.load_alerts().await;
            }
            Err(err) => self.notices.error(format!("silence failed: {err}")),
        }
    }
}

/// Short legend label for a dotted metric name.
fn series_label(name: &str) -> String {
    for tag in ["read", "write", "recv", "sent"] {
        if name.contains(tag) {
            return tag.to_string();
        }
    }
    name.rsplit('.').next().unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_round_trip() {
        assert_eq!(Tab::all().len(), 4);
        for tab in Tab::all() {
            assert_eq!(Tab::parse(tab.name()), Some(*tab));
            assert_eq!(Tab::all()[tab.index()], *tab);
        }
        assert_eq!(Tab::parse("unknown"), None);
    }

    #[test]
    fn tab_next_wraps() {
        assert_eq!(Tab::System.next(), Tab::Performance);
        assert_eq!(Tab::Logs.next(), Tab::System);
    }

    #[test]
    fn sequencer_discards_superseded_responses() {
        let mut seq = Sequencer::default();
        let first = seq.begin(Resource::Metrics);
        let second = seq.begin(Resource::Metrics);
        assert!(!seq.is_latest(Resource::Metrics, first));
        assert!(seq.is_latest(Resource::Metrics, second));
        // other resources sequence independently
        let status = seq.begin(Resource::Status);
        assert!(seq.is_latest(Resource::Status, status));
        assert!(seq.is_latest(Resource::Metrics, second));
    }

    #[test]
    fn refresh_presets_cycle_back_to_off() {
        let mut value = REFRESH_PRESETS[0];
        for expected in REFRESH_PRESETS.iter().cycle().skip(1).take(6) {
            let position = REFRESH_PRESETS.iter().position(|p| *p == value).unwrap();
            value = REFRESH_PRESETS[(position + 1) % REFRESH_PRESETS.len()];
            assert_eq!(value, *expected);
        }
        assert_eq!(value, 0);
    }

    #[test]
    fn series_labels_shorten_io_counters() {
        assert_eq!(series_label("system.disk_read_bytes"), "read");
        assert_eq!(series_label("system.network_total_bytes_sent_per_sec"), "sent");
        assert_eq!(series_label("system.process_count"), "process_count");
    }
}
