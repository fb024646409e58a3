//! Monthly trading activity per platform.

use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::market::Platform;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;
use std::collections::BTreeMap;

pub const NAME: &str = "activity";

pub fn compute(
    input: &AnalysisInput,
    _cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    if input.trades.is_empty() {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: "no trades after filtering".into(),
        });
    }

    // month key "YYYY-MM" -> per-platform (trades, contracts); BTreeMap keeps
    // months chronologically ordered
    let mut months: BTreeMap<String, [(u64, u64); 2]> = BTreeMap::new();
    for trade in input.trades {
        let key = trade.timestamp.format("%Y-%m").to_string();
        let slot = match trade.platform {
            Platform::Kalshi => 0,
            Platform::Polymarket => 1,
        };
        let entry = months.entry(key).or_default();
        entry[slot].0 += 1;
        entry[slot].1 += trade.size as u64;
    }

    let labels: Vec<String> = months.keys().cloned().collect();
    let mut result = AnalysisResult::new(NAME).with_labels("months", labels);

    for (slot, platform) in Platform::ALL.iter().enumerate() {
        let trades: Vec<Option<f64>> = months
            .values()
            .map(|m| present(m[slot].0 as f64, m[slot].0))
            .collect();
        let contracts: Vec<Option<f64>> = months
            .values()
            .map(|m| present(m[slot].1 as f64, m[slot].0))
            .collect();
        let total: f64 = months.values().map(|m| m[slot].0 as f64).sum();
        result = result
            .with_series(&format!("{platform}_trades"), trades)
            .with_series(&format!("{platform}_contracts"), contracts)
            .with_scalar(&format!("{platform}_total"), total);
    }
    Ok(result)
}

/// A month where a platform printed nothing is a gap, not a zero.
fn present(value: f64, count: u64) -> Option<f64> {
    if count == 0 { None } else { Some(value) }
}
