//! Normalization of raw API payloads into per-chart series and table rows.
//!
//! The backend hands back maps of dotted metric names to `[timestamp, value]`
//! pairs; this module reshapes them into the system chart buckets and the
//! flattened performance rows the views consume.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::format;

/// Wire shape of one metric's samples, epoch seconds paired with values,
/// ordered oldest first.
pub type RawSeries = Vec<(f64, f64)>;

/// An immutable snapshot of one metric's samples for the current refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

impl MetricSeries {
    pub fn latest(&self) -> Option<f64> {
        self.points.last().map(|(_, v)| *v)
    }

    /// Clock-time labels for the x axis, one per sample.
    pub fn labels(&self) -> Vec<String> {
        self.points
            .iter()
            .map(|(ts, _)| format::clock_time(*ts))
            .collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }
}

/// All metrics returned for one requested category, keyed by full name.
/// Superseded wholesale on every refresh.
#[derive(Debug, Clone, Default)]
pub struct CategorySnapshot {
    pub category: String,
    pub series: BTreeMap<String, MetricSeries>,
}

impl CategorySnapshot {
    pub fn from_raw(category: &str, raw: BTreeMap<String, RawSeries>) -> Self {
        let series = raw
            .into_iter()
            .map(|(name, points)| {
                let series = MetricSeries {
                    name: name.clone(),
                    points,
                };
                (name, series)
            })
            .collect();
        Self {
            category: category.to_string(),
            series,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The four system chart buckets. Classification is a substring match on the
/// metric name in this fixed order; the first matching bucket wins and
/// unmatched series only show up in the raw metric table.
#[derive(Debug, Clone, Default)]
pub struct SystemBuckets {
    pub cpu: Vec<MetricSeries>,
    pub memory: Vec<MetricSeries>,
    pub disk: Vec<MetricSeries>,
    pub network: Vec<MetricSeries>,
}

pub fn classify_system(snapshot: &CategorySnapshot) -> SystemBuckets {
    let mut buckets = SystemBuckets::default();
    for series in snapshot.series.values() {
        let bucket = if series.name.contains("cpu") {
            &mut buckets.cpu
        } else if series.name.contains("memory") {
            &mut buckets.memory
        } else if series.name.contains("disk") {
            &mut buckets.disk
        } else if series.name.contains("network") {
            &mut buckets.network
        } else {
            continue;
        };
        bucket.push(series.clone());
    }
    buckets
}

impl SystemBuckets {
    /// The series charted for a percentage bucket: the `percent` series when
    /// one exists, otherwise the first series in the bucket.
    fn percent_series(bucket: &[MetricSeries]) -> Option<&MetricSeries> {
        bucket
            .iter()
            .find(|s| s.name.contains("percent"))
            .or_else(|| bucket.first())
    }

    pub fn cpu_chart(&self) -> Option<&MetricSeries> {
        Self::percent_series(&self.cpu)
    }

    pub fn memory_chart(&self) -> Option<&MetricSeries> {
        Self::percent_series(&self.memory)
    }

    /// Disk read/write byte counters, at most two series.
    pub fn disk_chart(&self) -> Vec<&MetricSeries> {
        self.disk
            .iter()
            .filter(|s| s.name.contains("bytes"))
            .take(2)
            .collect()
    }

    /// Network recv/sent rates, at most two series. BTreeMap iteration keeps
    /// recv ahead of sent so dataset order is stable between refreshes.
    pub fn network_chart(&self) -> Vec<&MetricSeries> {
        let rates: Vec<&MetricSeries> = self
            .network
            .iter()
            .filter(|s| s.name.contains("per_sec"))
            .take(2)
            .collect();
        if !rates.is_empty() {
            return rates;
        }
        self.network.iter().take(2).collect()
    }
}

/// Per-metric performance statistics, seconds-denominated.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PerfStat {
    pub latest: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

/// Two-level wire mapping: category, then metric, then its stats.
pub type PerfReport = BTreeMap<String, BTreeMap<String, PerfStat>>;

/// One row of the flattened performance table.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfRow {
    pub category: String,
    pub metric: String,
    pub stat: PerfStat,
}

impl PerfRow {
    /// Fully-qualified metric name used for focused history fetches.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.category, self.metric)
    }
}

/// Flatten the two-level report into one list sorted by category then
/// metric, both ascending. The BTreeMap layers already iterate in that
/// order, so no further sort is needed.
pub fn flatten_performance(report: &PerfReport) -> Vec<PerfRow> {
    report
        .iter()
        .flat_map(|(category, metrics)| {
            metrics.iter().map(move |(metric, stat)| PerfRow {
                category: category.clone(),
                metric: metric.clone(),
                stat: *stat,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(names: &[&str]) -> CategorySnapshot {
        let raw: BTreeMap<String, RawSeries> = names
            .iter()
            .map(|n| (n.to_string(), vec![(1000.0, 1.0), (2000.0, 2.0)]))
            .collect();
        CategorySnapshot::from_raw("system", raw)
    }

    #[test]
    fn classification_uses_first_matching_bucket() {
        let buckets = classify_system(&snapshot(&[
            "system.cpu_percent",
            "system.memory_percent",
            "system.disk_percent",
            "system.network_total_bytes_recv_per_sec",
            "system.process_count",
        ]));
        assert_eq!(buckets.cpu.len(), 1);
        assert_eq!(buckets.memory.len(), 1);
        assert_eq!(buckets.disk.len(), 1);
        assert_eq!(buckets.network.len(), 1);
    }

    #[test]
    fn unmatched_series_are_dropped_from_buckets() {
        let snap = snapshot(&["system.process_count", "system.uptime_seconds"]);
        let buckets = classify_system(&snap);
        assert!(buckets.cpu.is_empty());
        assert!(buckets.network.is_empty());
        // still present in the raw table
        assert_eq!(snap.series.len(), 2);
    }

    #[test]
    fn percentage_buckets_prefer_the_percent_series() {
        let buckets = classify_system(&snapshot(&[
            "system.memory_available",
            "system.memory_percent",
            "system.memory_used",
        ]));
        assert_eq!(
            buckets.memory_chart().unwrap().name,
            "system.memory_percent"
        );
    }

    #[test]
    fn network_chart_keeps_recv_before_sent() {
        let buckets = classify_system(&snapshot(&[
            "system.network_total_bytes_recv_per_sec",
            "system.network_total_bytes_sent_per_sec",
        ]));
        let chart = buckets.network_chart();
        assert_eq!(chart.len(), 2);
        assert!(chart[0].name.contains("recv"));
        assert!(chart[1].name.contains("sent"));
    }

    #[test]
    fn series_labels_come_from_sample_timestamps() {
        let snap = snapshot(&["system.cpu_percent"]);
        let series = &snap.series["system.cpu_percent"];
        assert_eq!(series.labels(), vec!["00:16:40", "00:33:20"]);
        assert_eq!(series.values(), vec![1.0, 2.0]);
        assert_eq!(series.latest(), Some(2.0));
    }

    #[test]
    fn performance_rows_are_sorted_by_category_then_metric() {
        let stat = PerfStat {
            latest: 0.1,
            average: 0.2,
            min: 0.05,
            max: 0.4,
            count: 12,
        };
        let mut report = PerfReport::new();
        report
            .entry("workflow".to_string())
            .or_default()
            .insert("step_run".to_string(), stat);
        report
            .entry("api".to_string())
            .or_default()
            .insert("request".to_string(), stat);
        report
            .entry("api".to_string())
            .or_default()
            .insert("auth".to_string(), stat);

        let rows = flatten_performance(&report);
        let keys: Vec<_> = rows
            .iter()
            .map(|r| (r.category.as_str(), r.metric.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("api", "auth"), ("api", "request"), ("workflow", "step_run")]
        );
        assert_eq!(rows[0].full_name(), "api.auth");
    }
}
