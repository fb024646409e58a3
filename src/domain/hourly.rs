//! Excess returns and volume by UTC hour of day.

use crate::domain::bucket::BucketAccum;
use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::market::Side;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;
use chrono::Timelike;

pub const NAME: &str = "hourly";

pub fn compute(
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let mut hours = [BucketAccum::default(); 24];
    let mut resolved = 0u64;
    for trade in input
        .trades
        .iter()
        .filter(|t| t.side == Side::Taker && t.outcome.is_some())
    {
        hours[trade.timestamp.hour() as usize].observe(trade);
        resolved += 1;
    }
    if resolved == 0 {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: "no resolved taker trades after filtering".into(),
        });
    }

    let mut hour = Vec::with_capacity(24);
    let mut excess = Vec::with_capacity(24);
    let mut volume = Vec::with_capacity(24);
    let mut n_trades = Vec::with_capacity(24);
    for (h, accum) in hours.iter().enumerate() {
        hour.push(h as f64);
        volume.push(accum.volume as f64);
        n_trades.push(accum.count as f64);
        // mean excess over the hour's legs, in percentage points
        excess.push(if accum.count >= cfg.min_bucket_samples {
            accum.mean_excess().map(|e| e * 100.0)
        } else {
            None
        });
    }

    Ok(AnalysisResult::new(NAME)
        .with_dense_series("hour", hour)
        .with_series("excess_return", excess)
        .with_dense_series("volume", volume)
        .with_dense_series("n_trades", n_trades)
        .with_scalar("resolved_legs", resolved as f64))
}
