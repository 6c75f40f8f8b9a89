//! Client-side log inspection: an in-memory buffer of log entries plus a
//! three-way filter (level, component, free text).
//!
//! Filtering only flips per-entry visibility; the buffer itself is immutable
//! between loads. The component option list is recomputed from the buffer on
//! every load.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    visible: bool,
}

impl LogEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        level: LogLevel,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            component: component.into(),
            message: message.into(),
            visible: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The full line as shown in the log list; free-text search runs over
    /// this rendering.
    pub fn rendered(&self) -> String {
        format!(
            "{} [{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level.name(),
            self.component,
            self.message
        )
    }
}

/// The three filter predicates. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub level: Option<LogLevel>,
    pub component: String,
    pub search: String,
}

impl LogFilter {
    fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(level) = self.level {
            if entry.level != level {
                return false;
            }
        }
        if !self.component.is_empty() && !entry.component.contains(&self.component) {
            return false;
        }
        if !self.search.is_empty() {
            let haystack = entry.rendered().to_lowercase();
            if !haystack.contains(&self.search.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Loaded log buffer plus the active filter state.
#[derive(Debug, Default)]
pub struct LogView {
    entries: Vec<LogEntry>,
    components: Vec<String>,
    pub filter: LogFilter,
}

impl LogView {
    /// Replace the buffer wholesale and re-apply the active filter.
    pub fn load(&mut self, entries: Vec<LogEntry>) {
        self.entries = entries;
        self.components = distinct_components(&self.entries);
        self.apply();
    }

    /// Distinct components present in the buffer, sorted, recomputed at load.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn set_filter(&mut self, level: Option<LogLevel>, component: &str, search: &str) {
        self.filter.level = level;
        self.filter.component = component.to_string();
        self.filter.search = search.to_string();
        self.apply();
    }

    pub fn set_level(&mut self, level: Option<LogLevel>) {
        self.filter.level = level;
        self.apply();
    }

    pub fn set_component(&mut self, component: &str) {
        self.filter.component = component.to_string();
        self.apply();
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.search = search.to_string();
        self.apply();
    }

    /// Reset all three predicates and reveal every entry.
    pub fn clear_filter(&mut self) {
        self.filter = LogFilter::default();
        self.apply();
    }

    fn apply(&mut self) {
        for entry in &mut self.entries {
            entry.visible = self.filter.matches(entry);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn visible(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.is_visible())
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }
}

fn distinct_components(entries: &[LogEntry]) -> Vec<String> {
    let mut components: Vec<String> = entries.iter().map(|e| e.component.clone()).collect();
    components.sort();
    components.dedup();
    components
}

// TODO: replace with a paginated fetch once the backend exposes a
// log-retrieval endpoint; the filter contract above stays as is.
/// Deterministic stand-in buffer. Entry times count backwards from `now` so
/// the view looks live while still being reproducible in tests.
pub fn simulated_buffer(now: DateTime<Utc>) -> Vec<LogEntry> {
    const COMPONENTS: &[&str] = &["api", "scheduler", "metrics", "alerting", "storage"];
    const LINES: &[(LogLevel, &str)] = &[
        (LogLevel::Info, "request completed in 42ms"),
        (LogLevel::Debug, "cache refreshed, 128 entries"),
        (LogLevel::Info, "collection cycle finished"),
        (LogLevel::Warning, "slow response from upstream provider"),
        (LogLevel::Info, "heartbeat ok"),
        (LogLevel::Error, "write failed, retry scheduled"),
        (LogLevel::Debug, "tick elapsed under budget"),
        (LogLevel::Critical, "disk usage above 95 percent"),
        (LogLevel::Info, "configuration reloaded"),
        (LogLevel::Warning, "queue depth climbing"),
    ];

    (0..40)
        .map(|i| {
            let (level, message) = LINES[i % LINES.len()];
            LogEntry::new(
                now - Duration::seconds(7 * i as i64),
                level,
                COMPONENTS[i % COMPONENTS.len()],
                message,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_view() -> LogView {
        let base = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let mut view = LogView::default();
        view.load(vec![
            LogEntry::new(base, LogLevel::Info, "api", "request completed"),
            LogEntry::new(base, LogLevel::Error, "storage", "write failed"),
            LogEntry::new(base, LogLevel::Error, "api", "request aborted"),
            LogEntry::new(base, LogLevel::Warning, "scheduler", "tick drift"),
        ]);
        view
    }

    #[test]
    fn level_filter_is_exact_after_clear() {
        let mut view = sample_view();
        view.set_filter(Some(LogLevel::Warning), "sched", "drift");
        view.clear_filter();
        assert_eq!(view.visible_count(), 4);

        view.set_filter(Some(LogLevel::Error), "", "");
        let visible: Vec<_> = view.visible().collect();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|e| e.level == LogLevel::Error));
    }

    #[test]
    fn component_filter_matches_substring() {
        let mut view = sample_view();
        view.set_filter(None, "ap", "");
        assert_eq!(view.visible_count(), 2);
        view.set_filter(None, "torage", "");
        assert_eq!(view.visible_count(), 1);
    }

    #[test]
    fn search_is_case_insensitive_over_rendered_text() {
        let mut view = sample_view();
        view.set_filter(None, "", "REQUEST");
        assert_eq!(view.visible_count(), 2);
        // level token is part of the rendered line
        view.set_filter(None, "", "error");
        assert_eq!(view.visible_count(), 2);
    }

    #[test]
    fn filtering_never_mutates_the_buffer() {
        let mut view = sample_view();
        view.set_filter(Some(LogLevel::Critical), "", "");
        assert_eq!(view.visible_count(), 0);
        assert_eq!(view.entries().len(), 4);
    }

    #[test]
    fn components_are_distinct_and_sorted() {
        let view = sample_view();
        assert_eq!(view.components(), &["api", "scheduler", "storage"]);
    }

    #[test]
    fn simulated_buffer_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let a = simulated_buffer(now);
        let b = simulated_buffer(now);
        assert_eq!(a.len(), b.len());
        assert!(a
            .iter()
            .zip(&b)
            .all(|(x, y)| x.rendered() == y.rendered()));
    }
}
