//! Alert data model and the pure pieces of the alert view: severity
//! ordering, status counters, and creation-form validation.
//!
//! Lifecycle transitions themselves go through the API client; after every
//! successful transition the controller reloads both the active set and the
//! history so the view always reflects server truth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Display rank, most severe first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Severity> {
        match value.to_ascii_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn name(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }
}

/// An alert as reported by the backend. Timestamps are epoch seconds.
/// Unknown wire fields are ignored; the client never mutates alerts locally.
#[derive(Debug, Clone, Deserialize)]
pub struct Alert {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    #[serde(default = "default_category")]
    pub category: String,
    pub status: AlertStatus,
    #[serde(default)]
    pub triggered_at: Option<f64>,
    #[serde(default)]
    pub acknowledged_at: Option<f64>,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<f64>,
    #[serde(default)]
    pub silenced: bool,
    #[serde(default)]
    pub trigger_count: u32,
    #[serde(default)]
    pub details: Option<BTreeMap<String, Value>>,
}

fn default_category() -> String {
    "general".to_string()
}

impl Alert {
    /// Seconds the alert has been open, for the duration column.
    pub fn open_for(&self, now_secs: f64) -> Option<f64> {
        self.triggered_at.map(|t| (now_secs - t).max(0.0))
    }
}

/// One append-only history record; the client is a read-only renderer.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertHistoryEntry {
    pub timestamp: f64,
    pub alert: String,
    pub action: String,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

/// Payload of the creation call. Name and description are required before
/// any request is made.
#[derive(Debug, Clone, Serialize)]
pub struct NewAlert {
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub category: String,
}

impl NewAlert {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            severity: Severity::Warning,
            category: "custom".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("alert name is required".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("alert description is required".to_string());
        }
        Ok(())
    }
}

/// Order the active view by severity rank; the sort is stable so ties keep
/// the server-given order.
pub fn sort_by_severity(alerts: &mut [Alert]) {
    alerts.sort_by_key(|a| a.severity.rank());
}

/// Per-severity counters over the active set, zero for absent severities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

pub fn count_by_severity(alerts: &[Alert]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for alert in alerts {
        match alert.severity {
            Severity::Critical => counts.critical += 1,
            Severity::Error => counts.error += 1,
            Severity::Warning => counts.warning += 1,
            Severity::Info => counts.info += 1,
        }
    }
    counts
}
