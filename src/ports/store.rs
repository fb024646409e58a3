//! Trade storage port trait.

use crate::domain::error::AnalysisError;
use crate::domain::market::{MarketTable, Platform, Trade};
use chrono::{DateTime, Utc};

/// Filters applied while loading. The loader owns all schema handling;
/// downstream code assumes the returned tables are valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadFilter {
    pub platform: Option<Platform>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Drop legs whose market never resolved (metrics that need ground truth
    /// filter again on `outcome`, but this trims the table up front).
    pub resolved_only: bool,
}

pub trait TradeStore {
    fn load_markets(&self, filter: &LoadFilter) -> Result<MarketTable, AnalysisError>;

    fn load_trades(
        &self,
        markets: &MarketTable,
        filter: &LoadFilter,
    ) -> Result<Vec<Trade>, AnalysisError>;
}
