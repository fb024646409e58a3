//! Volume concentration: Lorenz curve, Gini coefficient and the share of
//! trades carrying half of all volume.

use crate::domain::concentration::{downsample_indices, gini, lorenz, top_share_for_volume};
use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;

pub const NAME: &str = "concentration";

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

    let volumes: Vec<f64> = input.trades.iter().map(|t| t.size as f64).collect();
    let curve = lorenz(&volumes).ok_or_else(|| AnalysisError::InsufficientData {
        metric: NAME.into(),
        reason: "total volume is zero".into(),
    })?;
    let gini_value = gini(&volumes).unwrap_or(0.0);
    let top_half = top_share_for_volume(&curve, 50.0).unwrap_or(100.0);

    // thin the curve for serialization; the endpoint always survives so the
    // serialized curve still closes at 100%
    let indices = downsample_indices(curve.len(), cfg.lorenz_points);
    let pct_trades: Vec<f64> = indices.iter().map(|&i| curve.pct_units[i]).collect();
    let pct_volume: Vec<f64> = indices.iter().map(|&i| curve.pct_volume[i]).collect();

    Ok(AnalysisResult::new(NAME)
        .with_dense_series("lorenz_pct_trades", pct_trades)
        .with_dense_series("lorenz_pct_volume", pct_volume)
        .with_scalar("gini", gini_value)
        .with_scalar("top_pct_half_volume", top_half)
        .with_scalar("n_trades", volumes.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{MarketTable, Platform, Side, Trade};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn trade_of_size(size: u32) -> Trade {
        Trade {
            platform: Platform::Polymarket,
            market_id: "0xabc".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc(),
            price: 50,
            size,
            side: Side::Taker,
            outcome: None,
        }
    }

    fn run(trades: &[Trade]) -> Result<AnalysisResult, AnalysisError> {
        let markets = MarketTable::new();
        compute(
            &AnalysisInput {
                trades,
                markets: &markets,
            },
            &AnalysisConfig::default(),
        )
    }

    #[test]
    fn empty_input_is_insufficient() {
        let err = run(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn equal_sizes_have_zero_gini() {
        let trades: Vec<Trade> = (0..10).map(|_| trade_of_size(7)).collect();
        let result = run(&trades).unwrap();
        assert_relative_eq!(result.scalars["gini"], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn whale_dominated_tape() {
        let mut trades: Vec<Trade> = (0..99).map(|_| trade_of_size(1)).collect();
        trades.push(trade_of_size(10_000));
        let result = run(&trades).unwrap();
        assert!(result.scalars["gini"] > 0.9);
        // the single whale is 1% of trades and carries >50% of volume
        assert_relative_eq!(result.scalars["top_pct_half_volume"], 1.0);
    }

    #[test]
    fn serialized_curve_closes_at_100() {
        let trades: Vec<Trade> = (1..=1000).map(trade_of_size).collect();
        let result = run(&trades).unwrap();
        let volume = &result.series["lorenz_pct_volume"];
        assert_relative_eq!(volume.last().unwrap().unwrap(), 100.0);
        assert!(volume.len() <= 1002);
    }
}
