//! Calibration curve: actual win rate vs contract price.
//!
//! Perfect calibration puts every bucket on the diagonal. Points above the
//! line were underpriced, points below overpriced.

use crate::domain::bucket::PriceBuckets;
use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;

pub const NAME: &str = "calibration";

pub fn compute(
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let mut buckets = PriceBuckets::new(cfg.price_width);
    let mut resolved = 0u64;
    for trade in input.trades.iter().filter(|t| t.outcome.is_some()) {
        buckets.observe(trade);
        resolved += 1;
    }
    if resolved == 0 {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: "no resolved trades after filtering".into(),
        });
    }

    let mut price = Vec::with_capacity(buckets.len());
    let mut win_rate = Vec::with_capacity(buckets.len());
    let mut trade_count = Vec::with_capacity(buckets.len());
    for (idx, accum) in buckets.iter() {
        price.push(buckets.midpoint(idx));
        // marker sizing only; counts stay dense even under the threshold
        trade_count.push(accum.count as f64);
        win_rate.push(if accum.count >= cfg.min_bucket_samples {
            accum.win_rate().map(|w| w * 100.0)
        } else {
            None
        });
    }

    Ok(AnalysisResult::new(NAME)
        .with_dense_series("price", price)
        .with_series("win_rate", win_rate)
        .with_dense_series("trade_count", trade_count)
        .with_scalar("resolved_legs", resolved as f64))
}
