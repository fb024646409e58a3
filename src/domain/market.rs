//! Normalized trade and market records shared by every metric.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Kalshi,
    Polymarket,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Kalshi, Platform::Polymarket];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Kalshi => "kalshi",
            Platform::Polymarket => "polymarket",
        }
    }

    pub fn parse(input: &str) -> Option<Platform> {
        match input.to_lowercase().as_str() {
            "kalshi" => Some(Platform::Kalshi),
            "polymarket" => Some(Platform::Polymarket),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Maker,
    Taker,
}

/// One executed leg of a fill. A raw fill expands into a taker leg and a
/// maker leg during loading; each leg carries the price its side paid and
/// whether the contract it holds eventually settled true.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub platform: Platform,
    pub market_id: String,
    pub timestamp: DateTime<Utc>,
    /// Implied probability in integer cents, 1..=99.
    pub price: u8,
    /// Contracts, positive.
    pub size: u32,
    pub side: Side,
    /// None until the market resolves.
    pub outcome: Option<bool>,
}

impl Trade {
    pub fn implied_prob(&self) -> f64 {
        self.price as f64 / 100.0
    }

    pub fn won(&self) -> bool {
        self.outcome == Some(true)
    }

    /// outcome (1 or 0) minus implied probability; None while unresolved.
    pub fn excess_return(&self) -> Option<f64> {
        self.outcome
            .map(|won| if won { 1.0 } else { 0.0 } - self.implied_prob())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    pub market_id: String,
    pub platform: Platform,
    pub category: String,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub resolution_time: Option<DateTime<Utc>>,
    pub resolved_outcome: Option<bool>,
}

impl Market {
    pub fn is_resolved(&self) -> bool {
        self.resolved_outcome.is_some()
    }

    /// resolution_time and resolved_outcome must be present or absent together.
    pub fn resolution_consistent(&self) -> bool {
        self.resolution_time.is_some() == self.resolved_outcome.is_some()
    }
}

/// Market lookup table keyed by market id within each platform.
#[derive(Debug, Clone, Default)]
pub struct MarketTable {
    by_platform: [HashMap<String, Market>; 2],
}

fn slot(platform: Platform) -> usize {
    match platform {
        Platform::Kalshi => 0,
        Platform::Polymarket => 1,
    }
}

impl MarketTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, market: Market) {
        self.by_platform[slot(market.platform)].insert(market.market_id.clone(), market);
    }

    pub fn get(&self, platform: Platform, market_id: &str) -> Option<&Market> {
        self.by_platform[slot(platform)].get(market_id)
    }

    pub fn len(&self) -> usize {
        self.by_platform.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.by_platform.iter().flat_map(HashMap::values)
    }

    /// Hours between a trade and its market's close; None when the market is
    /// unknown or the trade printed at or after the close.
    pub fn hours_to_close(&self, trade: &Trade) -> Option<f64> {
        let market = self.get(trade.platform, &trade.market_id)?;
        let seconds = (market.close_time - trade.timestamp).num_seconds();
        if seconds <= 0 {
            return None;
        }
        Some(seconds as f64 / 3600.0)
    }
}
