//! Chart-ready analysis result document.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::SystemTime;

/// Output of one metric run over a fixed input snapshot. Immutable once
/// serialized; a re-run supersedes rather than mutates.
///
/// `series` holds positionally parallel arrays of one shared length; a `None`
/// cell means "no data", which consumers must keep distinct from zero.
/// `samples` holds free-length sample sets (e.g. per-path terminal returns)
/// and `grids` row-major matrices (e.g. a bundle of equity curves).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub id: u32,
    pub metric_name: String,
    pub computed_at: DateTime<Utc>,
    pub series: BTreeMap<String, Vec<Option<f64>>>,
    pub scalars: BTreeMap<String, f64>,
    pub labels: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub samples: BTreeMap<String, Vec<f64>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub grids: BTreeMap<String, Vec<Vec<f64>>>,
}

impl AnalysisResult {
    pub fn new(metric_name: &str) -> Self {
        AnalysisResult {
            id: 0,
            metric_name: metric_name.to_string(),
            computed_at: DateTime::<Utc>::from(SystemTime::now()),
            series: BTreeMap::new(),
            scalars: BTreeMap::new(),
            labels: BTreeMap::new(),
            samples: BTreeMap::new(),
            grids: BTreeMap::new(),
        }
    }

    pub fn with_series(mut self, name: &str, values: Vec<Option<f64>>) -> Self {
        self.series.insert(name.to_string(), values);
        self
    }

    /// Series with every cell populated.
    pub fn with_dense_series(self, name: &str, values: Vec<f64>) -> Self {
        let values = values.into_iter().map(Some).collect();
        self.with_series(name, values)
    }

    pub fn with_scalar(mut self, name: &str, value: f64) -> Self {
        self.scalars.insert(name.to_string(), value);
        self
    }

    pub fn with_labels(mut self, name: &str, values: Vec<String>) -> Self {
        self.labels.insert(name.to_string(), values);
        self
    }

    pub fn with_samples(mut self, name: &str, values: Vec<f64>) -> Self {
        self.samples.insert(name.to_string(), values);
        self
    }

    pub fn with_grid(mut self, name: &str, rows: Vec<Vec<f64>>) -> Self {
        self.grids.insert(name.to_string(), rows);
        self
    }

    /// Shared length of the parallel series, or an error message naming the
    /// first offender. Consumers index by position, so misaligned arrays are
    /// a bug, not a degraded chart.
    pub fn aligned_len(&self) -> Result<usize, String> {
        let mut len: Option<(usize, &str)> = None;
        for (name, values) in &self.series {
            match len {
                None => len = Some((values.len(), name)),
                Some((expected, first)) if values.len() != expected => {
                    return Err(format!(
                        "series {name} has {} points, {first} has {expected}",
                        values.len()
                    ));
                }
                Some(_) => {}
            }
        }
        for (name, rows) in &self.grids {
            let widths: Vec<usize> = rows.iter().map(Vec::len).collect();
            if let Some(&first) = widths.first() {
                if widths.iter().any(|&w| w != first) {
                    return Err(format!("grid {name} has ragged rows"));
                }
            }
        }
        Ok(len.map(|(n, _)| n).unwrap_or(0))
    }

    /// True when a scalar is present and finite (serializer guards against
    /// emitting NaN into chart payloads).
    pub fn scalars_finite(&self) -> bool {
        self.scalars.values().all(|v| v.is_finite())
    }
}
