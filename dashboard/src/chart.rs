//! Line chart construction and the single live chart instance.

use crate::api::Record;
use crate::error::RenderError;
use crate::format::{coerce_number, format_timestamp, TimeMode};

/// Fields tried, in order, for the x-axis label.
pub const TIMESTAMP_ALIASES: [&str; 4] = ["t", "timestamp", "time", "date"];
/// Fields tried, in order, for the primary series.
pub const CLOSE_ALIASES: [&str; 2] = ["close", "c"];
pub const CUM_RETURN: &str = "cum_return";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub axis: Axis,
    pub title: String,
}

/// `None` points are gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub label: String,
    pub axis: Axis,
    pub points: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub labels: Vec<String>,
    pub series: Vec<LineSeries>,
    pub axes: Vec<AxisSpec>,
}

impl ChartSpec {
    pub fn has_secondary_axis(&self) -> bool {
        self.axes.iter().any(|a| a.axis == Axis::Right)
    }

    /// Tooltip title for the point at `idx`: its formatted label.
    pub fn tooltip_title(&self, idx: usize) -> &str {
        self.labels.get(idx).map(String::as_str).unwrap_or("")
    }
}

// first alias whose value is present and non-null
fn first_present<'a>(record: &'a Record, aliases: &[&str]) -> Option<&'a serde_json::Value> {
    aliases
        .iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

/// Close on the left axis; cumulative return on a right axis only when at
/// least one record carries a finite value for it.
pub fn build_chart_spec(records: &[Record], mode: TimeMode) -> Result<ChartSpec, RenderError> {
    if records.is_empty() {
        return Err(RenderError::Empty);
    }

    let labels = records
        .iter()
        .map(|r| format_timestamp(first_present(r, &TIMESTAMP_ALIASES), mode))
        .collect();
    let close = records
        .iter()
        .map(|r| coerce_number(first_present(r, &CLOSE_ALIASES)))
        .collect();
    let cum: Vec<Option<f64>> = records
        .iter()
        .map(|r| coerce_number(r.get(CUM_RETURN)))
        .collect();

    let mut series = vec![LineSeries {
        label: "Close".to_string(),
        axis: Axis::Left,
        points: close,
    }];
    let mut axes = vec![AxisSpec {
        axis: Axis::Left,
        title: "Price".to_string(),
    }];

    if cum.iter().any(Option::is_some) {
        series.push(LineSeries {
            label: "Cum Return".to_string(),
            axis: Axis::Right,
            points: cum,
        });
        axes.push(AxisSpec {
            axis: Axis::Right,
            title: "Cum Return".to_string(),
        });
    }

    Ok(ChartSpec { labels, series, axes })
}

/// A built chart that owns drawing resources until destroyed.
pub trait ChartInstance {
    fn destroy(&mut self);
}

/// The charting capability: a multi-series line plot from a spec.
pub trait ChartWidget {
    type Instance: ChartInstance;

    fn build_chart(&mut self, spec: &ChartSpec) -> Self::Instance;
}

/// Holds at most one live chart. Rebuilding always tears down the old
/// instance before the new one is constructed.
#[derive(Debug)]
pub struct ChartSlot<I: ChartInstance> {
    live: Option<I>,
    builds: u64,
}

impl<I: ChartInstance> Default for ChartSlot<I> {
    fn default() -> Self {
        Self { live: None, builds: 0 }
    }
}

impl<I: ChartInstance> ChartSlot<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_with(&mut self, build: impl FnOnce() -> I) {
        self.clear();
        self.live = Some(build());
        self.builds += 1;
    }

    pub fn clear(&mut self) {
        if let Some(mut old) = self.live.take() {
            old.destroy();
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn builds(&self) -> u64 {
        self.builds
    }
}

impl<I: ChartInstance> Drop for ChartSlot<I> {
    fn drop(&mut self) {
        self.clear();
    }
}
