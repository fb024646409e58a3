//! Trade size distribution: log-spaced histogram plus summary quantiles.

use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;

pub const NAME: &str = "size_dist";

pub fn compute(
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    if input.trades.is_empty() {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: "no trades after filtering".into(),
        });
    }

    let mut sizes: Vec<f64> = input.trades.iter().map(|t| t.size as f64).collect();
    sizes.sort_by(f64::total_cmp);
    let max_size = *sizes.last().unwrap();

    // log-spaced bin edges from 1 to the largest observed size
    let bins = cfg.hist_bins;
    let log_max = max_size.max(2.0).log10();
    let edges: Vec<f64> = (0..=bins)
        .map(|i| 10f64.powf(log_max * i as f64 / bins as f64))
        .collect();

    let mut counts = vec![0u64; bins];
    for &size in &sizes {
        // edges are monotone; the last bin is inclusive of the max
        let idx = edges[1..]
            .iter()
            .position(|&hi| size < hi)
            .unwrap_or(bins - 1);
        counts[idx] += 1;
    }

    let hist_lo: Vec<f64> = edges[..bins].to_vec();
    let hist_hi: Vec<f64> = edges[1..].to_vec();
    let hist_count: Vec<f64> = counts.iter().map(|&c| c as f64).collect();

    Ok(AnalysisResult::new(NAME)
        .with_dense_series("hist_lo", hist_lo)
        .with_dense_series("hist_hi", hist_hi)
        .with_dense_series("hist_count", hist_count)
        .with_scalar("median", quantile(&sizes, 0.50))
        .with_scalar("mean", sizes.iter().sum::<f64>() / sizes.len() as f64)
        .with_scalar("p99", quantile(&sizes, 0.99))
        .with_scalar("n_trades", sizes.len() as f64))
}

/// Linear-interpolated quantile over an ascending-sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
