//! HTTP client for the monitoring service API.
//!
//! Success is signalled in-band: mutating endpoints answer with a `status`
//! field that must equal `"success"`, anything else carries a server message
//! and is reported as a rejection. The [`MonitorApi`] trait is the seam the
//! controller is written against; tests substitute an in-memory fake.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::alerts::{Alert, AlertHistoryEntry, NewAlert};
use crate::pipeline::{PerfReport, RawSeries};

/// Failure classes for API operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The server answered and refused the operation.
    #[error("{0}")]
    Rejected(String),

    /// The operation was invalid before any request was sent.
    #[error("{0}")]
    Validation(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Reply to `GET /api/monitoring`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReply {
    pub status: String,
    #[serde(default)]
    pub system_info: Option<SystemInfo>,
}

impl StatusReply {
    pub fn is_running(&self) -> bool {
        self.status == "active"
    }
}

/// Host facts reported alongside the monitoring status. Decoded permissively
/// since the backend grows fields over time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    #[serde(default)]
    pub memory_total: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MetricHistory {
    pub name: String,
    pub values: RawSeries,
}

#[derive(Debug, Deserialize)]
struct AlertsReply {
    #[serde(default)]
    alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct HistoryReply {
    #[serde(default)]
    history: Vec<AlertHistoryEntry>,
}

/// Common shape of every mutating reply.
#[derive(Debug, Deserialize)]
struct Ack {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl Ack {
    fn into_result(self) -> ApiResult<()> {
        if self.status == "success" {
            Ok(())
        } else {
            Err(ApiError::Rejected(self.message.unwrap_or_else(|| {
                format!("server reported status '{}'", self.status)
            })))
        }
    }
}

#[derive(Serialize)]
struct AcknowledgeBody<'a> {
    user: &'a str,
}

#[derive(Serialize)]
struct SilenceBody {
    silence: bool,
}

/// The operations the dashboard engine needs from the monitoring backend.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    async fn status(&self) -> ApiResult<StatusReply>;
    async fn metrics(&self, category: &str) -> ApiResult<BTreeMap<String, RawSeries>>;
    async fn metric_history(&self, name: &str, limit: usize) -> ApiResult<MetricHistory>;
    async fn performance(&self, category: Option<&str>) -> ApiResult<PerfReport>;
    async fn active_alerts(&self) -> ApiResult<Vec<Alert>>;
    async fn alert_history(&self, limit: usize) -> ApiResult<Vec<AlertHistoryEntry>>;
    async fn create_alert(&self, alert: &NewAlert) -> ApiResult<()>;
    async fn acknowledge_alert(&self, name: &str, user: &str) -> ApiResult<()>;
    async fn resolve_alert(&self, name: &str) -> ApiResult<()>;
    async fn silence_alert(&self, name: &str, silence: bool) -> ApiResult<()>;
    async fn start_monitoring(&self) -> ApiResult<()>;
    async fn stop_monitoring(&self) -> ApiResult<()>;
}

/// Reqwest-backed implementation talking to a single base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/monitoring{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self.http.get(self.url(path)).query(query).send().await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Rejected(server_message(status, &body)));
    }
    serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Pull a human-readable message out of an error body, falling back to the
/// HTTP status line.
fn server_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct Failure {
        #[serde(default)]
        detail: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }
    serde_json::from_str::<Failure>(body)
        .ok()
        .and_then(|f| f.detail.or(f.message))
        .unwrap_or_else(|| format!("request failed with HTTP {status}"))
}

#[async_trait]
impl MonitorApi for ApiClient {
    async fn status(&self) -> ApiResult<StatusReply> {
        self.get_json("", &[]).await
    }

    async fn metrics(&self, category: &str) -> ApiResult<BTreeMap<String, RawSeries>> {
        self.get_json("/metrics", &[("category", category.to_string())])
            .await
    }

    async fn metric_history(&self, name: &str, limit: usize) -> ApiResult<MetricHistory> {
        self.get_json(&format!("/metrics/{name}"), &[("limit", limit.to_string())])
            .await
    }

    async fn performance(&self, category: Option<&str>) -> ApiResult<PerfReport> {
        let query: Vec<(&str, String)> = category
            .map(|c| vec![("category", c.to_string())])
            .unwrap_or_default();
        self.get_json("/performance", &query).await
    }

    async fn active_alerts(&self) -> ApiResult<Vec<Alert>> {
        let reply: AlertsReply = self.get_json("/alerts", &[]).await?;
        Ok(reply.alerts)
    }

    async fn alert_history(&self, limit: usize) -> ApiResult<Vec<AlertHistoryEntry>> {
        let reply: HistoryReply = self
            .get_json("/alerts/history", &[("limit", limit.to_string())])
            .await?;
        Ok(reply.history)
    }

    async fn create_alert(&self, alert: &NewAlert) -> ApiResult<()> {
        let response = self
            .http
            .post(self.url("/alerts"))
            .json(alert)
            .send()
            .await?;
        read_json::<Ack>(response).await?.into_result()
    }

    async fn acknowledge_alert(&self, name: &str, user: &str) -> ApiResult<()> {
        let response = self
            .http
            .put(self.url(&format!("/alerts/{name}/acknowledge")))
            .json(&AcknowledgeBody { user })
            .send()
            .await?;
        read_json::<Ack>(response).await?.into_result()
    }

    async fn resolve_alert(&self, name: &str) -> ApiResult<()> {
        let response = self
            .http
            .put(self.url(&format!("/alerts/{name}/resolve")))
            .send()
            .await?;
        read_json::<Ack>(response).await?.into_result()
    }

    async fn silence_alert(&self, name: &str, silence: bool) -> ApiResult<()> {
        let response = self
            .http
            .put(self.url(&format!("/alerts/{name}/silence")))
            .json(&SilenceBody { silence })
            .send()
            .await?;
        read_json::<Ack>(response).await?.into_result()
    }

    async fn start_monitoring(&self) -> ApiResult<()> {
        let response = self.http.post(self.url("/control/start")).send().await?;
        read_json::<Ack>(response).await?.into_result()
    }

    async fn stop_monitoring(&self) -> ApiResult<()> {
        let response = self.http.post(self.url("/control/stop")).send().await?;
        read_json::<Ack>(response).await?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_distinguishes_success_from_rejection() {
        let ok: Ack = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert!(ok.into_result().is_ok());

        let rejected: Ack =
            serde_json::from_str(r#"{"status": "error", "message": "Alert not found: x"}"#)
                .unwrap();
        match rejected.into_result() {
            Err(ApiError::Rejected(message)) => assert_eq!(message, "Alert not found: x"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn status_reply_reports_run_state() {
        let reply: StatusReply = serde_json::from_str(
            r#"{"status": "active", "system_info": {"hostname": "mon-1", "cpu_count": 8}}"#,
        )
        .unwrap();
        assert!(reply.is_running());
        assert_eq!(reply.system_info.unwrap().hostname, "mon-1");

        let stopped: StatusReply = serde_json::from_str(r#"{"status": "stopped"}"#).unwrap();
        assert!(!stopped.is_running());
    }

    #[test]
    fn metric_payloads_decode_from_pairs() {
        let series: BTreeMap<String, RawSeries> = serde_json::from_str(
            r#"{"system.cpu_percent": [[1000, 10.0], [2000, 55.0]]}"#,
        )
        .unwrap();
        assert_eq!(series["system.cpu_percent"], vec![(1000.0, 10.0), (2000.0, 55.0)]);

        let history: MetricHistory = serde_json::from_str(
            r#"{"name": "system.cpu_percent", "values": [[1000, 10.0]]}"#,
        )
        .unwrap();
        assert_eq!(history.name, "system.cpu_percent");
        assert_eq!(history.values.len(), 1);
    }

    #[test]
    fn server_message_prefers_detail_field() {
        assert_eq!(
            server_message(StatusCode::NOT_FOUND, r#"{"detail": "Alert not found: x"}"#),
            "Alert not found: x"
        );
        assert!(
            server_message(StatusCode::INTERNAL_SERVER_ERROR, "boom")
                .contains("500")
        );
    }
}
