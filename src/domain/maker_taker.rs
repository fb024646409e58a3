//! Maker vs taker excess returns per price level.
//!
//! Every fill has a passive and an aggressive leg; the spread between their
//! mean excess returns is the structural edge liquidity providers collect.

use crate::domain::bucket::{BucketAccum, PriceBuckets};
use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::market::Side;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;

pub const NAME: &str = "maker_taker";

pub fn compute(
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let mut maker = PriceBuckets::new(cfg.price_width);
    let mut taker = PriceBuckets::new(cfg.price_width);
    let mut resolved = 0u64;
    for trade in input.trades.iter().filter(|t| t.outcome.is_some()) {
        match trade.side {
            Side::Maker => maker.observe(trade),
            Side::Taker => taker.observe(trade),
        }
        resolved += 1;
    }
    if resolved == 0 {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: "no resolved trades after filtering".into(),
        });
    }

    let buckets = maker.len();
    let mut price = Vec::with_capacity(buckets);
    let mut maker_excess = Vec::with_capacity(buckets);
    let mut taker_excess = Vec::with_capacity(buckets);
    let mut maker_pnl = Vec::with_capacity(buckets);
    let mut taker_pnl = Vec::with_capacity(buckets);
    for idx in 0..buckets {
        let implied = maker.midpoint(idx) / 100.0;
        price.push(maker.midpoint(idx));
        maker_excess.push(side_excess(maker.get(idx), implied, cfg.min_bucket_samples));
        taker_excess.push(side_excess(taker.get(idx), implied, cfg.min_bucket_samples));
        maker_pnl.push(side_pnl(maker.get(idx)));
        taker_pnl.push(side_pnl(taker.get(idx)));
    }

    let total_maker: f64 = maker_pnl.iter().flatten().sum();
    let total_taker: f64 = taker_pnl.iter().flatten().sum();

    Ok(AnalysisResult::new(NAME)
        .with_dense_series("price", price)
        .with_series("maker_excess", maker_excess)
        .with_series("taker_excess", taker_excess)
        .with_series("maker_pnl", maker_pnl)
        .with_series("taker_pnl", taker_pnl)
        .with_scalar("total_maker_pnl", total_maker)
        .with_scalar("total_taker_pnl", total_taker))
}

/// Mean excess return in percentage points, null under the sample threshold.
fn side_excess(accum: &BucketAccum, implied_prob: f64, min_samples: u64) -> Option<f64> {
    if accum.count < min_samples {
        return None;
    }
    accum.mispricing(implied_prob).map(|m| m * 100.0)
}

fn side_pnl(accum: &BucketAccum) -> Option<f64> {
    if accum.count == 0 {
        return None;
    }
    Some(accum.pnl)
}
