//! Longshot bias: expected value per dollar staked on low-priced contracts.
//!
//! ev_per_dollar = win_rate / implied_prob - 1; negative means the price
//! overstated the true frequency (the classic lottery-ticket finding),
//! positive means the longshot was actually underpriced.

use crate::domain::bucket::BucketAccum;
use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::market::Side;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;

pub const NAME: &str = "longshot";

pub fn compute(
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let max_price = cfg.longshot_max_price;
    let mut accums = vec![BucketAccum::default(); max_price as usize];
    let mut observed = 0u64;
    for trade in input.trades.iter().filter(|t| {
        t.side == Side::Taker && t.outcome.is_some() && t.price <= max_price
    }) {
        accums[trade.price as usize - 1].observe(trade);
        observed += 1;
    }
    if observed == 0 {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: format!("no resolved taker trades at or below {max_price} cents"),
        });
    }

    let mut price = Vec::with_capacity(accums.len());
    let mut implied = Vec::with_capacity(accums.len());
    let mut actual = Vec::with_capacity(accums.len());
    let mut ev = Vec::with_capacity(accums.len());
    for (idx, accum) in accums.iter().enumerate() {
        let cents = (idx + 1) as f64;
        let implied_prob = cents / 100.0;
        price.push(cents);
        implied.push(implied_prob * 100.0);
        if accum.count >= cfg.min_bucket_samples {
            actual.push(accum.win_rate().map(|w| w * 100.0));
            ev.push(accum.ev_per_dollar(implied_prob));
        } else {
            actual.push(None);
            ev.push(None);
        }
    }

    Ok(AnalysisResult::new(NAME)
        .with_dense_series("price", price)
        .with_dense_series("implied_prob", implied)
        .with_series("actual_win_rate", actual)
        .with_series("ev_per_dollar", ev)
        .with_scalar("n_trades", observed as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{MarketTable, Platform, Trade};
    use chrono::NaiveDate;

    fn taker(price: u8, outcome: bool) -> Trade {
        Trade {
            platform: Platform::Kalshi,
            market_id: "M".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc(),
            price,
            size: 1,
            side: Side::Taker,
            outcome: Some(outcome),
        }
    }

    fn run(trades: &[Trade], cfg: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
        let markets = MarketTable::new();
        compute(
            &AnalysisInput {
                trades,
                markets: &markets,
            },
            cfg,
        )
    }

    #[test]
    fn empty_cohort_is_insufficient() {
        let err = run(&[], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn high_prices_are_out_of_scope() {
        // only a 50-cent trade: nothing at or below the longshot cutoff
        let trades = vec![taker(50, true)];
        let err = run(&trades, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn worked_example_positive_mispricing() {
        // 4 trades at 10 cents, one winner: win rate 25%, implied 10%,
        // ev_per_dollar = 0.25/0.10 - 1 = +1.5 (underpriced in this sample)
        let mut cfg = AnalysisConfig::default();
        cfg.min_bucket_samples = 1;
        let trades = vec![
            taker(10, true),
            taker(10, false),
            taker(10, false),
            taker(10, false),
        ];
        let result = run(&trades, &cfg).unwrap();
        assert!((result.series["actual_win_rate"][9].unwrap() - 25.0).abs() < 1e-9);
        assert!((result.series["implied_prob"][9].unwrap() - 10.0).abs() < 1e-9);
        assert!((result.series["ev_per_dollar"][9].unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn overpriced_longshot_has_negative_ev() {
        let mut cfg = AnalysisConfig::default();
        cfg.min_bucket_samples = 1;
        // 5-cent contracts that never win
        let trades: Vec<Trade> = (0..20).map(|_| taker(5, false)).collect();
        let result = run(&trades, &cfg).unwrap();
        assert!((result.series["ev_per_dollar"][4].unwrap() - (-1.0)).abs() < 1e-9);
    }

    #[test]
    fn table_length_matches_cutoff() {
        let mut cfg = AnalysisConfig::default();
        cfg.min_bucket_samples = 1;
        cfg.longshot_max_price = 20;
        let trades = vec![taker(3, false)];
        let result = run(&trades, &cfg).unwrap();
        assert_eq!(result.aligned_len().unwrap(), 20);
    }
}
