//! Analysis configuration.
//!
//! Every tuning knob is an explicit value passed into each metric call, never
//! process-wide state, so routines stay independently testable and safe to
//! run in parallel.

use crate::domain::error::AnalysisError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub seed: u64,
    pub paths: usize,
    pub path_length: usize,
    /// How many full equity curves to keep for visualization.
    pub recorded_paths: usize,
    /// Kelly fraction used for the recorded curves and distributions.
    pub display_fraction: f64,
    /// Fractions swept for the risk/reward curve, each in [0, 1].
    pub fractions: Vec<f64>,
    pub cohort_min_price: u8,
    pub cohort_max_price: u8,
    pub edge_adjustment: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Price bucket width in cents.
    pub price_width: u8,
    /// Buckets below this trade count report null, not zero.
    pub min_bucket_samples: u64,
    /// Per-cell threshold for the calibration surface.
    pub surface_min_samples: u64,
    /// Upper price bound (cents, inclusive) for the longshot table.
    pub longshot_max_price: u8,
    /// Log-spaced histogram bins for the size distribution.
    pub hist_bins: usize,
    /// Point budget for the serialized Lorenz curve.
    pub lorenz_points: usize,
    pub monte_carlo: MonteCarloConfig,
}

/// Evenly spaced fraction sweep, inclusive of both endpoints.
pub fn fraction_sweep(min: f64, max: f64, steps: usize) -> Vec<f64> {
    if steps <= 1 {
        return vec![min];
    }
    let step = (max - min) / (steps - 1) as f64;
    (0..steps).map(|i| min + step * i as f64).collect()
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            seed: 42,
            paths: 500,
            path_length: 200,
            recorded_paths: 50,
            display_fraction: 0.05,
            fractions: fraction_sweep(0.01, 0.30, 30),
            cohort_min_price: 5,
            cohort_max_price: 15,
            edge_adjustment: 1.0,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            price_width: 1,
            min_bucket_samples: 100,
            surface_min_samples: 100,
            longshot_max_price: 15,
            hist_bins: 50,
            lorenz_points: 500,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Build from an INI-backed config source, falling back to defaults for
    /// absent keys and rejecting out-of-range values.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AnalysisError> {
        let defaults = AnalysisConfig::default();
        let mc_defaults = &defaults.monte_carlo;

        let price_width = read_cents(config, "buckets", "price_width", defaults.price_width)?;
        let longshot_max_price = read_cents(
            config,
            "longshot",
            "max_price",
            defaults.longshot_max_price,
        )?;
        let cohort_min_price = read_cents(
            config,
            "monte_carlo",
            "cohort_min_price",
            mc_defaults.cohort_min_price,
        )?;
        let cohort_max_price = read_cents(
            config,
            "monte_carlo",
            "cohort_max_price",
            mc_defaults.cohort_max_price,
        )?;
        if cohort_min_price > cohort_max_price {
            return Err(AnalysisError::ConfigInvalid {
                section: "monte_carlo".into(),
                key: "cohort_min_price".into(),
                reason: "cohort price band is inverted".into(),
            });
        }

        let fraction_min = config.get_double("monte_carlo", "fraction_min", 0.01);
        let fraction_max = config.get_double("monte_carlo", "fraction_max", 0.30);
        let fraction_steps = read_positive(config, "monte_carlo", "fraction_steps", 30)?;
        if fraction_min > fraction_max {
            return Err(AnalysisError::ConfigInvalid {
                section: "monte_carlo".into(),
                key: "fraction_min".into(),
                reason: "fraction sweep is inverted".into(),
            });
        }

        let monte_carlo = MonteCarloConfig {
            seed: config.get_int("monte_carlo", "seed", mc_defaults.seed as i64) as u64,
            paths: read_positive(config, "monte_carlo", "paths", mc_defaults.paths)?,
            path_length: read_positive(
                config,
                "monte_carlo",
                "path_length",
                mc_defaults.path_length,
            )?,
            recorded_paths: config.get_int(
                "monte_carlo",
                "recorded_paths",
                mc_defaults.recorded_paths as i64,
            ) as usize,
            display_fraction: config.get_double(
                "monte_carlo",
                "display_fraction",
                mc_defaults.display_fraction,
            ),
            fractions: fraction_sweep(fraction_min, fraction_max, fraction_steps),
            cohort_min_price,
            cohort_max_price,
            edge_adjustment: config.get_double(
                "monte_carlo",
                "edge_adjustment",
                mc_defaults.edge_adjustment,
            ),
        };

        Ok(AnalysisConfig {
            price_width,
            min_bucket_samples: read_positive(
                config,
                "buckets",
                "min_samples",
                defaults.min_bucket_samples as usize,
            )? as u64,
            surface_min_samples: read_positive(
                config,
                "buckets",
                "surface_min_samples",
                defaults.surface_min_samples as usize,
            )? as u64,
            longshot_max_price,
            hist_bins: read_positive(config, "size_dist", "hist_bins", defaults.hist_bins)?,
            lorenz_points: read_positive(
                config,
                "size_dist",
                "lorenz_points",
                defaults.lorenz_points,
            )?,
            monte_carlo,
        })
    }
}

fn read_cents(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u8,
) -> Result<u8, AnalysisError> {
    let value = config.get_int(section, key, default as i64);
    if !(1..=99).contains(&value) {
        return Err(AnalysisError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{value} is outside 1..=99 cents"),
        });
    }
    Ok(value as u8)
}

fn read_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, AnalysisError> {
    let value = config.get_int(section, key, default as i64);
    if value < 1 {
        return Err(AnalysisError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{value} must be at least 1"),
        });
    }
    Ok(value as usize)
}
