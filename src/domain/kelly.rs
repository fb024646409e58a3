//! Kelly risk-sizing metric: Monte Carlo sweep over the longshot taker cohort.

use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::monte_carlo::{build_cohort, percentile, simulate};
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;

pub const NAME: &str = "kelly";

pub fn compute(
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let mc = &cfg.monte_carlo;
    let cohort = build_cohort(input.trades, mc.cohort_min_price, mc.cohort_max_price);
    let summary = simulate(&cohort, mc)?;

    let fractions: Vec<f64> = summary.sweep.iter().map(|p| p.fraction * 100.0).collect();
    let median: Vec<f64> = summary.sweep.iter().map(|p| p.median * 100.0).collect();
    let p5: Vec<f64> = summary.sweep.iter().map(|p| p.p5 * 100.0).collect();
    let p95: Vec<f64> = summary.sweep.iter().map(|p| p.p95 * 100.0).collect();

    let mut drawdowns = summary.max_drawdowns.clone();
    drawdowns.sort_by(f64::total_cmp);
    let profitable = summary
        .terminal_returns
        .iter()
        .filter(|&&r| r > 0.0)
        .count() as f64
        / summary.terminal_returns.len() as f64;

    Ok(AnalysisResult::new(NAME)
        .with_dense_series("kelly_fraction", fractions)
        .with_dense_series("median_return", median)
        .with_dense_series("p5_return", p5)
        .with_dense_series("p95_return", p95)
        .with_samples("terminal_returns", summary.terminal_returns)
        .with_samples("max_drawdowns", summary.max_drawdowns)
        .with_grid("equity_curves", summary.equity_curves)
        .with_scalar("cohort_size", summary.cohort_size as f64)
        .with_scalar("cohort_win_rate", summary.cohort_win_rate * 100.0)
        .with_scalar("cohort_mean_return", summary.cohort_mean_return * 100.0)
        .with_scalar("display_fraction", mc.display_fraction * 100.0)
        .with_scalar("median_drawdown", percentile(&drawdowns, 50.0) * 100.0)
        .with_scalar("p95_drawdown", percentile(&drawdowns, 95.0) * 100.0)
        .with_scalar("profitable_pct", profitable * 100.0))
}
