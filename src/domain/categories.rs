//! Volume and market counts by category.

use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::registry::AnalysisInput;
use crate::domain::result::AnalysisResult;
use std::collections::HashMap;

pub const NAME: &str = "categories";

#[derive(Default)]
struct CategoryAccum {
    markets: u64,
    settled: u64,
    volume: u64,
}

pub fn compute(
    input: &AnalysisInput,
    _cfg: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    if input.markets.is_empty() {
        return Err(AnalysisError::InsufficientData {
            metric: NAME.into(),
            reason: "no markets after filtering".into(),
        });
    }

    let mut accums: HashMap<String, CategoryAccum> = HashMap::new();
    for market in input.markets.iter() {
        let entry = accums.entry(market.category.clone()).or_default();
        entry.markets += 1;
        if market.is_resolved() {
            entry.settled += 1;
        }
    }
    for trade in input.trades {
        if let Some(market) = input.markets.get(trade.platform, &trade.market_id) {
            if let Some(entry) = accums.get_mut(&market.category) {
                entry.volume += trade.size as u64;
            }
        }
    }

    // largest categories first; name breaks ties so output is stable
    let mut rows: Vec<(String, CategoryAccum)> = accums.into_iter().collect();
    rows.sort_by(|a, b| b.1.volume.cmp(&a.1.volume).then(a.0.cmp(&b.0)));

    let labels: Vec<String> = rows.iter().map(|(name, _)| name.clone()).collect();
    let market_count: Vec<f64> = rows.iter().map(|(_, a)| a.markets as f64).collect();
    let settled_count: Vec<f64> = rows.iter().map(|(_, a)| a.settled as f64).collect();
    let volume: Vec<f64> = rows.iter().map(|(_, a)| a.volume as f64).collect();

    Ok(AnalysisResult::new(NAME)
        .with_labels("categories", labels)
        .with_dense_series("market_count", market_count)
        .with_dense_series("settled_count", settled_count)
        .with_dense_series("volume", volume)
        .with_scalar("n_categories", rows.len() as f64))
}
