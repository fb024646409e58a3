//! Calibration surface: mispricing across price decile and time-to-close.
//!
//! A single calibration curve averages away timing; the surface shows where
//! and when prices drift from realized frequencies. Cells under the sample
//! threshold stay null.

use crate::domain::bucket::{time_band, time_band_labels, BucketAccum, TIME_BANDS};
use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;

pub const NAME: &str = "surface";

const PRICE_ROWS: usize = 10;

pub fn compute(
    input: &AnalysisInput,
    cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let bands = TIME_BANDS.len();
    let mut cells = vec![BucketAccum::default(); PRICE_ROWS * bands];
    let mut observed = 0u64;

    for trade in input.trades.iter().filter(|t| t.outcome.is_some()) {
        let Some(hours) = input.markets.hours_to_close(trade) else {
            continue;
        };
        let row = price_row(trade.price);
        let col = time_band(hours);
        cells[row * bands + col].observe(trade);
        observed += 1;
    }
    if observed == 0 {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: "no resolved trades with a known close time".into(),
        });
    }

    let mut result = AnalysisResult::new(NAME)
        .with_labels("price_bins", price_row_labels())
        .with_labels("time_bins", time_band_labels())
        .with_scalar("n_trades", observed as f64);

    // one column series per time band, rows indexed by price decile
    for col in 0..bands {
        let mut column = Vec::with_capacity(PRICE_ROWS);
        for row in 0..PRICE_ROWS {
            let accum = &cells[row * bands + col];
            let implied = row_midpoint(row) / 100.0;
            column.push(if accum.count >= cfg.surface_min_samples {
                accum.mispricing(implied).map(|m| m * 100.0)
            } else {
                None
            });
        }
        result = result.with_series(&format!("mispricing_{col}"), column);
    }
    Ok(result)
}

fn price_row(price: u8) -> usize {
    ((price / 10) as usize).min(PRICE_ROWS - 1)
}

/// Midpoint in cents of a decile row (0-10 maps to 5, 90-100 to 95).
fn row_midpoint(row: usize) -> f64 {
    row as f64 * 10.0 + 5.0
}

fn price_row_labels() -> Vec<String> {
    (0..PRICE_ROWS)
        .map(|row| format!("{}-{}¢", row * 10, row * 10 + 10))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{Market, MarketTable, Platform, Side, Trade};
    use chrono::{DateTime, NaiveDate, Utc};

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn market(close: DateTime<Utc>) -> Market {
        Market {
            market_id: "M".into(),
            platform: Platform::Kalshi,
            category: "Sports".into(),
            open_time: ts(1, 0),
            close_time: close,
            resolution_time: Some(close),
            resolved_outcome: Some(true),
        }
    }

    fn leg(price: u8, at: DateTime<Utc>, outcome: bool) -> Trade {
        Trade {
            platform: Platform::Kalshi,
            market_id: "M".into(),
            timestamp: at,
            price,
            size: 1,
            side: Side::Taker,
            outcome: Some(outcome),
        }
    }

    #[test]
    fn empty_input_is_insufficient() {
        let markets = MarketTable::new();
        let err = compute(
            &AnalysisInput {
                trades: &[],
                markets: &markets,
            },
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn unknown_market_is_insufficient() {
        // resolved legs but no market row to supply a close time
        let markets = MarketTable::new();
        let trades = vec![leg(50, ts(2, 0), true)];
        let err = compute(
            &AnalysisInput {
                trades: &trades,
                markets: &markets,
            },
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn cell_mispricing_against_row_midpoint() {
        let mut markets = MarketTable::new();
        markets.insert(market(ts(2, 12)));
        let mut cfg = AnalysisConfig::default();
        cfg.surface_min_samples = 1;

        // trades 2h before close at 25 cents, all winners:
        // row 2 (20-30), band 1 (1-6h), mispricing = 100 - 25 = +75pp
        let trades: Vec<Trade> = (0..4).map(|_| leg(25, ts(2, 10), true)).collect();
        let result = compute(
            &AnalysisInput {
                trades: &trades,
                markets: &markets,
            },
            &cfg,
        )
        .unwrap();

        assert_eq!(result.aligned_len().unwrap(), 10);
        assert!((result.series["mispricing_1"][2].unwrap() - 75.0).abs() < 1e-9);
        // every other cell in that column is empty
        assert_eq!(result.series["mispricing_1"][5], None);
        assert_eq!(result.series["mispricing_0"][2], None);
    }

    #[test]
    fn sparse_cells_stay_null() {
        let mut markets = MarketTable::new();
        markets.insert(market(ts(2, 12)));
        let cfg = AnalysisConfig::default(); // surface_min_samples = 100
        let trades = vec![leg(25, ts(2, 10), true)];
        let result = compute(
            &AnalysisInput {
                trades: &trades,
                markets: &markets,
            },
            &cfg,
        )
        .unwrap();
        assert_eq!(result.series["mispricing_1"][2], None);
    }

    #[test]
    fn labels_cover_grid() {
        let mut markets = MarketTable::new();
        markets.insert(market(ts(20, 0)));
        let mut cfg = AnalysisConfig::default();
        cfg.surface_min_samples = 1;
        let trades = vec![leg(95, ts(2, 0), true)];
        let result = compute(
            &AnalysisInput {
                trades: &trades,
                markets: &markets,
            },
            &cfg,
        )
        .unwrap();
        assert_eq!(result.labels["price_bins"].len(), 10);
        assert_eq!(result.labels["time_bins"].len(), 7);
        // 95-cent winner lands in the top row, ~18 days out (7-30d band)
        assert!(result.series["mispricing_5"][9].is_some());
    }
}
