//! Shared bucketing for the metric routines.
//!
//! Trades partition into price buckets of fixed width and/or time-to-close
//! bands; each bucket accumulates running sums from which the per-bucket
//! statistics derive. Buckets under the configured sample threshold report
//! null downstream, never zero.

use crate::domain::market::Trade;

/// Time-to-close bands, ordered nearest first. Upper bounds in hours,
/// exclusive; the last band is open-ended.
pub const TIME_BANDS: [(&str, f64); 7] = [
    ("<1h", 1.0),
    ("1-6h", 6.0),
    ("6-24h", 24.0),
    ("1-3d", 72.0),
    ("3-7d", 168.0),
    ("7-30d", 720.0),
    (">30d", f64::INFINITY),
];

pub fn time_band(hours_to_close: f64) -> usize {
    TIME_BANDS
        .iter()
        .position(|(_, upper)| hours_to_close < *upper)
        .unwrap_or(TIME_BANDS.len() - 1)
}

pub fn time_band_labels() -> Vec<String> {
    TIME_BANDS.iter().map(|(label, _)| label.to_string()).collect()
}

/// Running sums for one aggregation bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketAccum {
    pub count: u64,
    /// Total contracts.
    pub volume: u64,
    /// Legs whose contract settled true.
    pub wins: u64,
    /// Sum of implied probabilities, for buckets that mix price levels.
    pub implied_sum: f64,
    /// Size-weighted notional P&L in contract units: size * (outcome - p/100).
    pub pnl: f64,
}

impl BucketAccum {
    /// Fold a resolved leg into the sums. Unresolved legs still count toward
    /// `count` and `volume` so bucket totals reconcile with the input.
    pub fn observe(&mut self, trade: &Trade) {
        self.count += 1;
        self.volume += trade.size as u64;
        self.implied_sum += trade.implied_prob();
        if trade.won() {
            self.wins += 1;
        }
        if let Some(excess) = trade.excess_return() {
            self.pnl += trade.size as f64 * excess;
        }
    }

    pub fn win_rate(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.wins as f64 / self.count as f64)
    }

    /// Mean excess return per leg against each leg's own price:
    /// win_rate - mean implied probability.
    pub fn mean_excess(&self) -> Option<f64> {
        self.win_rate().map(|w| w - self.implied_sum / self.count as f64)
    }

    /// Mean excess return per leg: win_rate - implied probability.
    pub fn mispricing(&self, implied_prob: f64) -> Option<f64> {
        self.win_rate().map(|w| w - implied_prob)
    }

    /// Expected payout per unit staked minus one: win_rate / implied - 1.
    pub fn ev_per_dollar(&self, implied_prob: f64) -> Option<f64> {
        if implied_prob <= 0.0 {
            return None;
        }
        self.win_rate().map(|w| w / implied_prob - 1.0)
    }
}

/// Fixed-width price buckets covering 1..=99 cents.
#[derive(Debug, Clone)]
pub struct PriceBuckets {
    width: u8,
    accums: Vec<BucketAccum>,
}

impl PriceBuckets {
    pub fn new(width: u8) -> Self {
        let width = width.clamp(1, 99);
        let buckets = (99 + width as usize - 1) / width as usize;
        PriceBuckets {
            width,
            accums: vec![BucketAccum::default(); buckets],
        }
    }

    pub fn index(&self, price: u8) -> usize {
        ((price.clamp(1, 99) - 1) / self.width) as usize
    }

    /// Midpoint of bucket `idx` in cents.
    pub fn midpoint(&self, idx: usize) -> f64 {
        let lo = 1 + idx as u8 * self.width;
        let hi = (lo + self.width - 1).min(99);
        (lo as f64 + hi as f64) / 2.0
    }

    pub fn observe(&mut self, trade: &Trade) {
        let idx = self.index(trade.price);
        self.accums[idx].observe(trade);
    }

    pub fn len(&self) -> usize {
        self.accums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accums.is_empty()
    }

    pub fn get(&self, idx: usize) -> &BucketAccum {
        &self.accums[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &BucketAccum)> {
        self.accums.iter().enumerate()
    }

    /// Total legs observed across every bucket, including below-threshold
    /// ones; must reconcile with the filtered input count.
    pub fn total_count(&self) -> u64 {
        self.accums.iter().map(|a| a.count).sum()
    }
}
