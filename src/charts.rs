//! Chart reconciliation: one long-lived slot per visualization, created on
//! first data arrival and mutated in place on every refresh after that.
//!
//! Recreating a chart on refresh would drop axis state and flicker, so a
//! slot's handle survives for the whole session; only its label sequence and
//! dataset values change.

use std::collections::HashMap;

/// Cap on visible x-axis tick labels regardless of sample count.
pub const MAX_X_TICKS: usize = 10;

/// Value domain of a slot, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Percentages, value axis clamped to 0..=100.
    Percentage,
    /// Byte rates, converted to kilobytes/sec at ingest.
    ByteRate,
    /// Durations, left in seconds.
    Seconds,
    /// Anything else, plotted as-is.
    Raw,
}

impl ChartKind {
    fn scale(&self, value: f64) -> f64 {
        match self {
            ChartKind::ByteRate => value / 1024.0,
            _ => value,
        }
    }

    pub fn axis_title(&self) -> &'static str {
        match self {
            ChartKind::Percentage => "%",
            ChartKind::ByteRate => "KB/s",
            ChartKind::Seconds => "s",
            ChartKind::Raw => "",
        }
    }
}

/// One named value sequence within a slot. Order is stable across updates so
/// series identity (color, legend position) never shifts between refreshes.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
}

/// The owned handle for a visualization slot.
#[derive(Debug)]
pub struct ChartSlot {
    pub id: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Bumped once at creation only; a stable generation across renders is
    /// how tests observe that the handle was reused rather than rebuilt.
    pub generation: u64,
    pub updates: u64,
}

impl ChartSlot {
    /// X tick labels with automatic skipping so at most [`MAX_X_TICKS`]
    /// remain visible.
    pub fn tick_labels(&self) -> Vec<&str> {
        if self.labels.len() <= MAX_X_TICKS {
            return self.labels.iter().map(String::as_str).collect();
        }
        let step = self.labels.len().div_ceil(MAX_X_TICKS);
        self.labels
            .iter()
            .step_by(step)
            .map(String::as_str)
            .collect()
    }

    /// Value-axis bounds for the slot's domain.
    pub fn y_bounds(&self) -> [f64; 2] {
        match self.kind {
            ChartKind::Percentage => [0.0, 100.0],
            _ => {
                let max = self
                    .datasets
                    .iter()
                    .flat_map(|d| d.values.iter().copied())
                    .fold(0.0f64, f64::max);
                [0.0, if max > 0.0 { max * 1.05 } else { 1.0 }]
            }
        }
    }

    /// Points for plotting, x being the sample index.
    pub fn points(&self, dataset: usize) -> Vec<(f64, f64)> {
        self.datasets
            .get(dataset)
            .map(|d| {
                d.values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as f64, *v))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Registry of chart slots keyed by slot id.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    slots: HashMap<String, ChartSlot>,
    generations: u64,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the slot on first call, mutate it in place afterwards.
    ///
    /// Incoming series are matched to existing datasets by label so dataset
    /// order stays stable; labels not seen before are appended at the end.
    pub fn render(
        &mut self,
        id: &str,
        kind: ChartKind,
        labels: Vec<String>,
        series: Vec<(String, Vec<f64>)>,
    ) {
        let generations = &mut self.generations;
        let slot = self.slots.entry(id.to_string()).or_insert_with(|| {
            *generations += 1;
            ChartSlot {
                id: id.to_string(),
                kind,
                labels: Vec::new(),
                datasets: Vec::new(),
                generation: *generations,
                updates: 0,
            }
        });

        let kind = slot.kind;
        slot.labels.clear();
        slot.labels.extend(labels);

        let mut incoming: Vec<Option<(String, Vec<f64>)>> = series.into_iter().map(Some).collect();
        for dataset in &mut slot.datasets {
            let position = incoming
                .iter()
                .position(|e| e.as_ref().is_some_and(|(label, _)| *label == dataset.label));
            if let Some((_, values)) = position.and_then(|i| incoming[i].take()) {
                dataset.values = values.into_iter().map(|v| kind.scale(v)).collect();
            }
        }
        for (label, values) in incoming.into_iter().flatten() {
            let values = values.into_iter().map(|v| kind.scale(v)).collect();
            slot.datasets.push(Dataset { label, values });
        }

        slot.updates += 1;
    }

    pub fn get(&self, id: &str) -> Option<&ChartSlot> {
        self.slots.get(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("00:00:{i:02}")).collect()
    }

    #[test]
    fn second_render_mutates_instead_of_recreating() {
        let mut registry = ChartRegistry::new();
        registry.render(
            "system.cpu",
            ChartKind::Percentage,
            labels(2),
            vec![("CPU %".into(), vec![10.0, 55.0])],
        );
        registry.render(
            "system.cpu",
            ChartKind::Percentage,
            labels(3),
            vec![("CPU %".into(), vec![12.0, 40.0, 61.0])],
        );

        assert_eq!(registry.len(), 1);
        let slot = registry.get("system.cpu").unwrap();
        assert_eq!(slot.generation, 1, "handle must survive the second render");
        assert_eq!(slot.updates, 2);
        assert_eq!(slot.datasets[0].values, vec![12.0, 40.0, 61.0]);
    }

    #[test]
    fn dataset_order_is_stable_across_updates() {
        let mut registry = ChartRegistry::new();
        registry.render(
            "system.network",
            ChartKind::ByteRate,
            labels(1),
            vec![("recv".into(), vec![1024.0]), ("sent".into(), vec![2048.0])],
        );
        // reversed incoming order must not reorder the datasets
        registry.render(
            "system.network",
            ChartKind::ByteRate,
            labels(1),
            vec![("sent".into(), vec![4096.0]), ("recv".into(), vec![3072.0])],
        );

        let slot = registry.get("system.network").unwrap();
        let order: Vec<_> = slot.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(order, vec!["recv", "sent"]);
        assert_eq!(slot.datasets[0].values, vec![3.0]);
        assert_eq!(slot.datasets[1].values, vec![4.0]);
    }

    #[test]
    fn byte_rates_are_converted_to_kilobytes() {
        let mut registry = ChartRegistry::new();
        registry.render(
            "system.network",
            ChartKind::ByteRate,
            labels(2),
            vec![("recv".into(), vec![1024.0, 5120.0])],
        );
        let slot = registry.get("system.network").unwrap();
        assert_eq!(slot.datasets[0].values, vec![1.0, 5.0]);
    }

    #[test]
    fn percentage_axis_is_clamped() {
        let mut registry = ChartRegistry::new();
        registry.render(
            "system.cpu",
            ChartKind::Percentage,
            labels(2),
            vec![("CPU %".into(), vec![10.0, 55.0])],
        );
        assert_eq!(registry.get("system.cpu").unwrap().y_bounds(), [0.0, 100.0]);
    }

    #[test]
    fn tick_labels_are_capped_with_skipping() {
        let mut registry = ChartRegistry::new();
        registry.render(
            "perf.focus",
            ChartKind::Seconds,
            labels(60),
            vec![("api".into(), vec![0.0; 60])],
        );
        let slot = registry.get("perf.focus").unwrap();
        let ticks = slot.tick_labels();
        assert!(ticks.len() <= MAX_X_TICKS, "got {} ticks", ticks.len());
        assert_eq!(ticks[0], "00:00:00");

        registry.render(
            "perf.short",
            ChartKind::Seconds,
            labels(4),
            vec![("api".into(), vec![0.0; 4])],
        );
        assert_eq!(registry.get("perf.short").unwrap().tick_labels().len(), 4);
    }
}
