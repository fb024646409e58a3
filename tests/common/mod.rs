#![allow(dead_code)]

use chrono::{DateTime, Utc};
use marketlens::domain::error::AnalysisError;
use marketlens::domain::market::{Market, MarketTable, Platform, Side, Trade};
use marketlens::ports::store::{LoadFilter, TradeStore};

/// In-memory trade store for pipeline tests.
pub struct MockStore {
    pub markets: Vec<Market>,
    pub trades: Vec<Trade>,
    pub failure: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            markets: Vec::new(),
            trades: Vec::new(),
            failure: None,
        }
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.markets.push(market);
        self
    }

    pub fn with_trades(mut self, trades: Vec<Trade>) -> Self {
        self.trades.extend(trades);
        self
    }

    pub fn with_failure(mut self, path: &str) -> Self {
        self.failure = Some(path.to_string());
        self
    }
}

impl TradeStore for MockStore {
    fn load_markets(&self, filter: &LoadFilter) -> Result<MarketTable, AnalysisError> {
        if let Some(path) = &self.failure {
            return Err(AnalysisError::DataUnavailable { path: path.clone() });
        }
        let mut table = MarketTable::new();
        for market in &self.markets {
            if filter.platform.is_none_or(|p| p == market.platform) {
                table.insert(market.clone());
            }
        }
        Ok(table)
    }

    fn load_trades(
        &self,
        _markets: &MarketTable,
        filter: &LoadFilter,
    ) -> Result<Vec<Trade>, AnalysisError> {
        if let Some(path) = &self.failure {
            return Err(AnalysisError::DataUnavailable { path: path.clone() });
        }
        Ok(self
            .trades
            .iter()
            .filter(|t| filter.platform.is_none_or(|p| p == t.platform))
            .filter(|t| filter.start.is_none_or(|s| t.timestamp >= s))
            .filter(|t| filter.end.is_none_or(|e| t.timestamp <= e))
            .filter(|t| !filter.resolved_only || t.outcome.is_some())
            .cloned()
            .collect())
    }
}

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    chrono::NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn make_trade(price: u8, side: Side, outcome: Option<bool>) -> Trade {
    Trade {
        platform: Platform::Kalshi,
        market_id: "MKT".into(),
        timestamp: ts(2024, 3, 15, 14),
        price,
        size: 1,
        side,
        outcome,
    }
}

pub fn make_market(id: &str, category: &str, resolved_outcome: Option<bool>) -> Market {
    Market {
        market_id: id.into(),
        platform: Platform::Kalshi,
        category: category.into(),
        open_time: ts(2024, 1, 1, 0),
        close_time: ts(2024, 6, 1, 0),
        resolution_time: resolved_outcome.map(|_| ts(2024, 6, 2, 0)),
        resolved_outcome,
    }
}

/// Taker legs at one price whose outcomes hit the implied rate exactly.
pub fn calibrated_trades(price: u8, count: usize) -> Vec<Trade> {
    (0..count)
        .map(|i| make_trade(price, Side::Taker, Some(i % 100 < price as usize)))
        .collect()
}
