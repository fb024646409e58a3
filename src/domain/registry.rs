//! Metric registry: explicit mapping from metric id and name to its handler.
//!
//! Metrics only read the shared input, so the registry runs them in parallel;
//! each failure stays scoped to its own metric.

use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::market::{MarketTable, Trade};
use crate::domain::result::AnalysisResult;
use crate::domain::{
    activity, calibration, categories, hourly, kelly, longshot, maker_taker, size_dist, surface,
    volume_concentration,
};
use rayon::prelude::*;

/// Read-only view over one pipeline run's normalized tables.
pub struct AnalysisInput<'a> {
    pub trades: &'a [Trade],
    pub markets: &'a MarketTable,
}

type MetricFn = fn(&AnalysisInput, &AnalysisConfig) -> Result<AnalysisResult, AnalysisError>;

#[derive(Clone, Copy)]
pub struct MetricHandler {
    pub id: u32,
    pub name: &'static str,
    pub compute: MetricFn,
}

/// Every registered metric, in display order.
pub fn all() -> Vec<MetricHandler> {
    vec![
        MetricHandler {
            id: 1,
            name: activity::NAME,
            compute: activity::compute,
        },
        MetricHandler {
            id: 2,
            name: calibration::NAME,
            compute: calibration::compute,
        },
        MetricHandler {
            id: 3,
            name: longshot::NAME,
            compute: longshot::compute,
        },
        MetricHandler {
            id: 4,
            name: maker_taker::NAME,
            compute: maker_taker::compute,
        },
        MetricHandler {
            id: 5,
            name: size_dist::NAME,
            compute: size_dist::compute,
        },
        MetricHandler {
            id: 6,
            name: volume_concentration::NAME,
            compute: volume_concentration::compute,
        },
        MetricHandler {
            id: 7,
            name: hourly::NAME,
            compute: hourly::compute,
        },
        MetricHandler {
            id: 8,
            name: surface::NAME,
            compute: surface::compute,
        },
        MetricHandler {
            id: 9,
            name: categories::NAME,
            compute: categories::compute,
        },
        MetricHandler {
            id: 10,
            name: kelly::NAME,
            compute: kelly::compute,
        },
    ]
}

pub fn find(name: &str) -> Option<MetricHandler> {
    all().into_iter().find(|h| h.name == name)
}

pub struct MetricOutcome {
    pub id: u32,
    pub name: &'static str,
    pub result: Result<AnalysisResult, AnalysisError>,
}

/// Run a set of handlers over the shared input. Handlers only borrow the
/// input, so they run concurrently; output order follows the handler list.
pub fn run(
    handlers: &[MetricHandler],
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Vec<MetricOutcome> {
    handlers
        .par_iter()
        .map(|handler| {
            let result = (handler.compute)(input, cfg).map(|mut r| {
                r.id = handler.id;
                r
            });
            MetricOutcome {
                id: handler.id,
                name: handler.name,
                result,
            }
        })
        .collect()
}
