//! Monte Carlo Kelly sizing over resampled historical outcomes.
//!
//! Instead of trusting a point estimate of edge, resample the observed
//! (price, outcome) pairs and look at the distribution of equity paths a
//! fixed-fraction bettor would have experienced. Sweeping the fraction maps
//! the risk/reward tradeoff.

use crate::domain::config::MonteCarloConfig;
use crate::domain::error::AnalysisError;
use crate::domain::market::{Side, Trade};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// One observed (price, outcome) draw from the historical cohort.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortDraw {
    pub price: u8,
    pub won: bool,
}

impl CohortDraw {
    /// Return per unit staked: a win pays (100 - p) / p, a loss forfeits it.
    pub fn return_per_stake(&self) -> f64 {
        if self.won {
            (100.0 - self.price as f64) / self.price as f64
        } else {
            -1.0
        }
    }
}

/// Resolved taker legs inside the configured price band.
pub fn build_cohort(trades: &[Trade], min_price: u8, max_price: u8) -> Vec<CohortDraw> {
    trades
        .iter()
        .filter(|t| {
            t.side == Side::Taker
                && t.outcome.is_some()
                && (min_price..=max_price).contains(&t.price)
        })
        .map(|t| CohortDraw {
            price: t.price,
            won: t.won(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub fraction: f64,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    /// Full equity curves (length path_length + 1, starting at 1.0) for the
    /// first `recorded_paths` paths at the display fraction.
    pub equity_curves: Vec<Vec<f64>>,
    /// Terminal return per path at the display fraction.
    pub terminal_returns: Vec<f64>,
    /// Max drawdown per path at the display fraction.
    pub max_drawdowns: Vec<f64>,
    /// Median/5th/95th percentile terminal return per swept fraction.
    pub sweep: Vec<SweepPoint>,
    pub cohort_size: usize,
    pub cohort_win_rate: f64,
    pub cohort_mean_return: f64,
}

/// Run the full simulation. Bit-reproducible for a fixed seed, cohort,
/// fraction sweep and path/length counts: every path owns a generator seeded
/// from (seed, stream, path index), so thread scheduling cannot reorder draws.
pub fn simulate(
    cohort: &[CohortDraw],
    cfg: &MonteCarloConfig,
) -> Result<SimulationSummary, AnalysisError> {
    if cohort.is_empty() {
        return Err(AnalysisError::EmptyCohort {
            reason: "no resolved trades in the cohort price band".into(),
        });
    }
    for &fraction in cfg.fractions.iter().chain([cfg.display_fraction].iter()) {
        if !(0.0..=1.0).contains(&fraction) || !fraction.is_finite() {
            return Err(AnalysisError::InvalidFraction { fraction });
        }
    }

    // the display-fraction distribution uses the stream index one past the
    // sweep so its draws never overlap a swept fraction's
    let display_stream = cfg.fractions.len();
    let display: Vec<PathResult> = (0..cfg.paths)
        .into_par_iter()
        .map(|path| {
            run_path(
                cohort,
                cfg.display_fraction,
                cfg,
                display_stream,
                path,
                path < cfg.recorded_paths,
            )
        })
        .collect();

    let sweep: Vec<SweepPoint> = cfg
        .fractions
        .par_iter()
        .enumerate()
        .map(|(stream, &fraction)| {
            let mut terminals: Vec<f64> = (0..cfg.paths)
                .into_par_iter()
                .map(|path| run_path(cohort, fraction, cfg, stream, path, false).terminal_return)
                .collect();
            terminals.sort_by(f64::total_cmp);
            SweepPoint {
                fraction,
                median: percentile(&terminals, 50.0),
                p5: percentile(&terminals, 5.0),
                p95: percentile(&terminals, 95.0),
            }
        })
        .collect();

    let wins = cohort.iter().filter(|d| d.won).count();
    let mean_return =
        cohort.iter().map(CohortDraw::return_per_stake).sum::<f64>() / cohort.len() as f64;

    Ok(SimulationSummary {
        equity_curves: display.iter().filter_map(|p| p.curve.clone()).collect(),
        terminal_returns: display.iter().map(|p| p.terminal_return).collect(),
        max_drawdowns: display.iter().map(|p| p.max_drawdown).collect(),
        sweep,
        cohort_size: cohort.len(),
        cohort_win_rate: wins as f64 / cohort.len() as f64,
        cohort_mean_return: mean_return,
    })
}

struct PathResult {
    curve: Option<Vec<f64>>,
    terminal_return: f64,
    max_drawdown: f64,
}

fn path_rng(seed: u64, stream: usize, path: usize) -> ChaCha8Rng {
    // stream in the high half, path in the low half: distinct (stream, path)
    // pairs get distinct, schedule-independent seeds
    ChaCha8Rng::seed_from_u64(seed ^ ((stream as u64) << 32).wrapping_add(path as u64))
}

fn run_path(
    cohort: &[CohortDraw],
    fraction: f64,
    cfg: &MonteCarloConfig,
    stream: usize,
    path: usize,
    record_curve: bool,
) -> PathResult {
    let mut rng = path_rng(cfg.seed, stream, path);
    let mut bankroll = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_drawdown = 0.0_f64;
    let mut curve = record_curve.then(|| {
        let mut c = Vec::with_capacity(cfg.path_length + 1);
        c.push(1.0);
        c
    });

    for _ in 0..cfg.path_length {
        // ruin is absorbing: a zero bankroll stakes zero forever after
        if bankroll > 0.0 {
            let draw = cohort[rng.gen_range(0..cohort.len())];
            let stake = fraction * bankroll * cfg.edge_adjustment;
            bankroll = (bankroll + stake * draw.return_per_stake()).max(0.0);
        }
        if bankroll > peak {
            peak = bankroll;
        } else if peak > 0.0 {
            let drawdown = (peak - bankroll) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }
        if let Some(c) = curve.as_mut() {
            c.push(bankroll);
        }
    }

    PathResult {
        curve,
        terminal_return: bankroll - 1.0,
        max_drawdown,
    }
}

/// Linear-interpolated percentile over an ascending-sorted slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::fraction_sweep;
    use approx::assert_relative_eq;

    fn small_cfg() -> MonteCarloConfig {
        MonteCarloConfig {
            seed: 42,
            paths: 40,
            path_length: 30,
            recorded_paths: 5,
            display_fraction: 0.05,
            fractions: fraction_sweep(0.05, 0.25, 5),
            cohort_min_price: 5,
            cohort_max_price: 15,
            edge_adjustment: 1.0,
        }
    }

    fn winning_cohort() -> Vec<CohortDraw> {
        // 10-cent contracts winning 20% of the time: positive edge
        let mut cohort = Vec::new();
        for i in 0..50 {
            cohort.push(CohortDraw {
                price: 10,
                won: i % 5 == 0,
            });
        }
        cohort
    }

    #[test]
    fn empty_cohort_is_rejected() {
        let err = simulate(&[], &small_cfg()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyCohort { .. }));
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        let mut cfg = small_cfg();
        cfg.fractions = vec![0.1, 1.5];
        let err = simulate(&winning_cohort(), &cfg).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidFraction { fraction } if (fraction - 1.5).abs() < 1e-12
        ));
    }

    #[test]
    fn negative_display_fraction_is_rejected() {
        let mut cfg = small_cfg();
        cfg.display_fraction = -0.01;
        let err = simulate(&winning_cohort(), &cfg).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidFraction { .. }));
    }

    #[test]
    fn shapes_match_config() {
        let cfg = small_cfg();
        let summary = simulate(&winning_cohort(), &cfg).unwrap();
        assert_eq!(summary.equity_curves.len(), 5);
        assert_eq!(summary.equity_curves[0].len(), 31);
        assert_eq!(summary.terminal_returns.len(), 40);
        assert_eq!(summary.max_drawdowns.len(), 40);
        assert_eq!(summary.sweep.len(), 5);
        assert_eq!(summary.cohort_size, 50);
        assert_relative_eq!(summary.cohort_win_rate, 0.2);
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let cfg = small_cfg();
        let cohort = winning_cohort();
        let a = simulate(&cohort, &cfg).unwrap();
        let b = simulate(&cohort, &cfg).unwrap();
        assert_eq!(a.equity_curves, b.equity_curves);
        assert_eq!(a.terminal_returns, b.terminal_returns);
        assert_eq!(a.max_drawdowns, b.max_drawdowns);
        assert_eq!(a.sweep, b.sweep);
    }

    #[test]
    fn different_seed_diverges() {
        let cohort = winning_cohort();
        let a = simulate(&cohort, &small_cfg()).unwrap();
        let mut cfg = small_cfg();
        cfg.seed = 43;
        let b = simulate(&cohort, &cfg).unwrap();
        assert_ne!(a.terminal_returns, b.terminal_returns);
    }

    #[test]
    fn ruin_is_absorbing() {
        // full-bankroll bets against a cohort that always loses: the first
        // bet zeroes the bankroll and every later point stays at zero
        let cohort = vec![CohortDraw {
            price: 10,
            won: false,
        }];
        let mut cfg = small_cfg();
        cfg.display_fraction = 1.0;
        cfg.fractions = vec![1.0];
        let summary = simulate(&cohort, &cfg).unwrap();
        for curve in &summary.equity_curves {
            assert!(curve[1..].iter().all(|&v| v == 0.0), "curve {curve:?}");
        }
        for &terminal in &summary.terminal_returns {
            assert_relative_eq!(terminal, -1.0);
        }
        for &dd in &summary.max_drawdowns {
            assert_relative_eq!(dd, 1.0);
        }
    }

    #[test]
    fn sure_winner_never_draws_down() {
        let cohort = vec![CohortDraw {
            price: 50,
            won: true,
        }];
        let summary = simulate(&cohort, &small_cfg()).unwrap();
        for &dd in &summary.max_drawdowns {
            assert_relative_eq!(dd, 0.0);
        }
        // 5% staked, 1:1 payout, 30 bets: (1.05)^30 - 1
        let expected = 1.05f64.powi(30) - 1.0;
        for &terminal in &summary.terminal_returns {
            assert_relative_eq!(terminal, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&sorted, 0.0), 1.0);
        assert_relative_eq!(percentile(&sorted, 50.0), 3.0);
        assert_relative_eq!(percentile(&sorted, 100.0), 5.0);
        assert_relative_eq!(percentile(&sorted, 25.0), 2.0);
        assert_relative_eq!(percentile(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn build_cohort_filters_band_and_side() {
        use crate::domain::market::{Platform, Trade};
        use chrono::NaiveDate;
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let leg = |price: u8, side: Side, outcome: Option<bool>| Trade {
            platform: Platform::Kalshi,
            market_id: "M".into(),
            timestamp: ts,
            price,
            size: 1,
            side,
            outcome,
        };
        let trades = vec![
            leg(10, Side::Taker, Some(true)),   // in
            leg(4, Side::Taker, Some(false)),   // below band
            leg(16, Side::Taker, Some(false)),  // above band
            leg(10, Side::Maker, Some(true)),   // wrong side
            leg(10, Side::Taker, None),         // unresolved
        ];
        let cohort = build_cohort(&trades, 5, 15);
        assert_eq!(cohort.len(), 1);
        assert!(cohort[0].won);
    }
}
