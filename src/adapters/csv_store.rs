//! CSV file trade store.
//!
//! Storage layout: one directory per platform under the root, each holding
//! `markets.csv` and `trades.csv`. The two platforms arrive in different raw
//! schemas; this adapter coerces both into the normalized Trade/Market shape
//! so downstream code never sees a platform-specific field. Each raw fill
//! expands into a taker leg and a maker leg.

use crate::domain::error::AnalysisError;
use crate::domain::market::{Market, MarketTable, Platform, Side, Trade};
use crate::ports::store::{LoadFilter, TradeStore};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn table_path(&self, platform: Platform, table: &str) -> PathBuf {
        self.root.join(platform.as_str()).join(format!("{table}.csv"))
    }

    /// Platforms to load: the filtered one (which must exist) or every
    /// platform directory present under the root.
    fn platforms(&self, filter: &LoadFilter) -> Result<Vec<Platform>, AnalysisError> {
        if let Some(platform) = filter.platform {
            let dir = self.root.join(platform.as_str());
            if !dir.is_dir() {
                return Err(AnalysisError::DataUnavailable {
                    path: dir.display().to_string(),
                });
            }
            return Ok(vec![platform]);
        }
        let present: Vec<Platform> = Platform::ALL
            .into_iter()
            .filter(|p| self.root.join(p.as_str()).is_dir())
            .collect();
        if present.is_empty() {
            return Err(AnalysisError::DataUnavailable {
                path: self.root.display().to_string(),
            });
        }
        Ok(present)
    }
}

impl TradeStore for CsvStore {
    fn load_markets(&self, filter: &LoadFilter) -> Result<MarketTable, AnalysisError> {
        let mut table = MarketTable::new();
        for platform in self.platforms(filter)? {
            let path = self.table_path(platform, "markets");
            match platform {
                Platform::Kalshi => load_kalshi_markets(&path, &mut table)?,
                Platform::Polymarket => load_polymarket_markets(&path, &mut table)?,
            }
        }
        Ok(table)
    }

    fn load_trades(
        &self,
        markets: &MarketTable,
        filter: &LoadFilter,
    ) -> Result<Vec<Trade>, AnalysisError> {
        let mut trades = Vec::new();
        for platform in self.platforms(filter)? {
            let path = self.table_path(platform, "trades");
            match platform {
                Platform::Kalshi => load_kalshi_trades(&path, markets, filter, &mut trades)?,
                Platform::Polymarket => {
                    load_polymarket_trades(&path, markets, filter, &mut trades)?
                }
            }
        }
        Ok(trades)
    }
}

fn read_file(path: &Path) -> Result<String, AnalysisError> {
    fs::read_to_string(path).map_err(|_| AnalysisError::DataUnavailable {
        path: path.display().to_string(),
    })
}

fn column(headers: &csv::StringRecord, path: &Path, name: &str) -> Result<usize, AnalysisError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AnalysisError::SchemaMismatch {
            path: path.display().to_string(),
            reason: format!("missing column {name}"),
        })
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    path: &Path,
    name: &str,
) -> Result<&'r str, AnalysisError> {
    record
        .get(idx)
        .ok_or_else(|| AnalysisError::SchemaMismatch {
            path: path.display().to_string(),
            reason: format!("short row missing {name}"),
        })
}

fn parse_time(value: &str, path: &Path, name: &str) -> Result<DateTime<Utc>, AnalysisError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AnalysisError::SchemaMismatch {
            path: path.display().to_string(),
            reason: format!("invalid {name} timestamp {value:?}: {e}"),
        })
}

fn parse_opt_time(
    value: &str,
    path: &Path,
    name: &str,
) -> Result<Option<DateTime<Utc>>, AnalysisError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_time(value, path, name).map(Some)
}

fn parse_num<T: std::str::FromStr>(
    value: &str,
    path: &Path,
    name: &str,
) -> Result<T, AnalysisError> {
    value.parse().map_err(|_| AnalysisError::SchemaMismatch {
        path: path.display().to_string(),
        reason: format!("invalid {name} value {value:?}"),
    })
}

/// "yes"/"no" contract side, shared by both raw schemas.
fn parse_yes_no(value: &str, path: &Path, name: &str) -> Result<bool, AnalysisError> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(AnalysisError::SchemaMismatch {
            path: path.display().to_string(),
            reason: format!("invalid {name} value {value:?}"),
        }),
    }
}

fn check_resolution(market: &Market, path: &Path) -> Result<(), AnalysisError> {
    if !market.resolution_consistent() {
        return Err(AnalysisError::SchemaMismatch {
            path: path.display().to_string(),
            reason: format!(
                "market {}: resolution time and outcome must be present together",
                market.market_id
            ),
        });
    }
    Ok(())
}

fn load_kalshi_markets(path: &Path, table: &mut MarketTable) -> Result<(), AnalysisError> {
    let content = read_file(path)?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().map_err(io_schema(path))?.clone();
    let ticker = column(&headers, path, "ticker")?;
    let category = column(&headers, path, "category")?;
    let open_time = column(&headers, path, "open_time")?;
    let close_time = column(&headers, path, "close_time")?;
    let status = column(&headers, path, "status")?;
    let result = column(&headers, path, "result")?;
    let resolution_time = column(&headers, path, "resolution_time")?;

    for record in reader.records() {
        let record = record.map_err(io_schema(path))?;
        let resolved_outcome = if field(&record, status, path, "status")? == "finalized" {
            match field(&record, result, path, "result")? {
                "yes" => Some(true),
                "no" => Some(false),
                _ => None,
            }
        } else {
            None
        };
        let market = Market {
            market_id: field(&record, ticker, path, "ticker")?.to_string(),
            platform: Platform::Kalshi,
            category: field(&record, category, path, "category")?.to_string(),
            open_time: parse_time(field(&record, open_time, path, "open_time")?, path, "open_time")?,
            close_time: parse_time(
                field(&record, close_time, path, "close_time")?,
                path,
                "close_time",
            )?,
            resolution_time: parse_opt_time(
                field(&record, resolution_time, path, "resolution_time")?,
                path,
                "resolution_time",
            )?,
            resolved_outcome,
        };
        check_resolution(&market, path)?;
        table.insert(market);
    }
    Ok(())
}

fn load_polymarket_markets(path: &Path, table: &mut MarketTable) -> Result<(), AnalysisError> {
    let content = read_file(path)?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().map_err(io_schema(path))?.clone();
    let condition_id = column(&headers, path, "condition_id")?;
    let category = column(&headers, path, "category")?;
    let open_time = column(&headers, path, "open_time")?;
    let close_time = column(&headers, path, "close_time")?;
    let resolved = column(&headers, path, "resolved")?;
    let outcome = column(&headers, path, "outcome")?;
    let resolution_time = column(&headers, path, "resolution_time")?;

    for record in reader.records() {
        let record = record.map_err(io_schema(path))?;
        let resolved_outcome = if field(&record, resolved, path, "resolved")? == "true" {
            Some(parse_yes_no(
                field(&record, outcome, path, "outcome")?,
                path,
                "outcome",
            )?)
        } else {
            None
        };
        let market = Market {
            market_id: field(&record, condition_id, path, "condition_id")?.to_string(),
            platform: Platform::Polymarket,
            category: field(&record, category, path, "category")?.to_string(),
            open_time: parse_time(field(&record, open_time, path, "open_time")?, path, "open_time")?,
            close_time: parse_time(
                field(&record, close_time, path, "close_time")?,
                path,
                "close_time",
            )?,
            resolution_time: parse_opt_time(
                field(&record, resolution_time, path, "resolution_time")?,
                path,
                "resolution_time",
            )?,
            resolved_outcome,
        };
        check_resolution(&market, path)?;
        table.insert(market);
    }
    Ok(())
}

fn load_kalshi_trades(
    path: &Path,
    markets: &MarketTable,
    filter: &LoadFilter,
    trades: &mut Vec<Trade>,
) -> Result<(), AnalysisError> {
    let content = read_file(path)?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().map_err(io_schema(path))?.clone();
    let ticker = column(&headers, path, "ticker")?;
    let created_time = column(&headers, path, "created_time")?;
    let yes_price = column(&headers, path, "yes_price")?;
    let no_price = column(&headers, path, "no_price")?;
    let taker_side = column(&headers, path, "taker_side")?;
    let count = column(&headers, path, "count")?;

    for record in reader.records() {
        let record = record.map_err(io_schema(path))?;
        let timestamp = parse_time(
            field(&record, created_time, path, "created_time")?,
            path,
            "created_time",
        )?;
        if !within(filter, timestamp) {
            continue;
        }
        let yes: i64 = parse_num(field(&record, yes_price, path, "yes_price")?, path, "yes_price")?;
        let no: i64 = parse_num(field(&record, no_price, path, "no_price")?, path, "no_price")?;
        // the tape occasionally carries settlement prints at 0/100; those are
        // not tradeable probabilities and fall outside every bucket
        if !(1..=99).contains(&yes) || !(1..=99).contains(&no) {
            continue;
        }
        let size: i64 = parse_num(field(&record, count, path, "count")?, path, "count")?;
        if size < 1 {
            continue;
        }
        let taker_holds_yes = parse_yes_no(
            field(&record, taker_side, path, "taker_side")?,
            path,
            "taker_side",
        )?;
        let market_id = field(&record, ticker, path, "ticker")?;
        let (taker_price, maker_price) = if taker_holds_yes {
            (yes as u8, no as u8)
        } else {
            (no as u8, yes as u8)
        };
        push_legs(
            trades,
            markets,
            filter,
            RawFill {
                platform: Platform::Kalshi,
                market_id,
                timestamp,
                taker_price,
                maker_price,
                taker_holds_yes,
                size: size as u32,
            },
        );
    }
    Ok(())
}

fn load_polymarket_trades(
    path: &Path,
    markets: &MarketTable,
    filter: &LoadFilter,
    trades: &mut Vec<Trade>,
) -> Result<(), AnalysisError> {
    let content = read_file(path)?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().map_err(io_schema(path))?.clone();
    let condition_id = column(&headers, path, "condition_id")?;
    let timestamp_col = column(&headers, path, "timestamp")?;
    let price = column(&headers, path, "price")?;
    let size_col = column(&headers, path, "size")?;
    let taker_side = column(&headers, path, "taker_side")?;

    for record in reader.records() {
        let record = record.map_err(io_schema(path))?;
        let timestamp = parse_time(
            field(&record, timestamp_col, path, "timestamp")?,
            path,
            "timestamp",
        )?;
        if !within(filter, timestamp) {
            continue;
        }
        // on-chain prices are 0-1 fractions of the taken outcome token
        let fraction: f64 = parse_num(field(&record, price, path, "price")?, path, "price")?;
        let cents = (fraction * 100.0).round();
        if !(1.0..=99.0).contains(&cents) {
            continue;
        }
        let size: f64 = parse_num(field(&record, size_col, path, "size")?, path, "size")?;
        let size = size.round();
        if size < 1.0 {
            continue;
        }
        let taker_holds_yes = parse_yes_no(
            field(&record, taker_side, path, "taker_side")?,
            path,
            "taker_side",
        )?;
        let market_id = field(&record, condition_id, path, "condition_id")?;
        push_legs(
            trades,
            markets,
            filter,
            RawFill {
                platform: Platform::Polymarket,
                market_id,
                timestamp,
                taker_price: cents as u8,
                maker_price: (100.0 - cents) as u8,
                taker_holds_yes,
                size: size as u32,
            },
        );
    }
    Ok(())
}

/// One raw fill, platform details already coerced away.
struct RawFill<'a> {
    platform: Platform,
    market_id: &'a str,
    timestamp: DateTime<Utc>,
    taker_price: u8,
    maker_price: u8,
    taker_holds_yes: bool,
    size: u32,
}

/// Expand one raw fill into its taker and maker legs. Each leg's outcome is
/// whether the contract side it holds matched the market's resolution.
fn push_legs(trades: &mut Vec<Trade>, markets: &MarketTable, filter: &LoadFilter, fill: RawFill) {
    let resolution = markets
        .get(fill.platform, fill.market_id)
        .and_then(|m| m.resolved_outcome);
    for (side, price, holds_yes) in [
        (Side::Taker, fill.taker_price, fill.taker_holds_yes),
        (Side::Maker, fill.maker_price, !fill.taker_holds_yes),
    ] {
        let outcome = resolution.map(|yes_won| holds_yes == yes_won);
        if filter.resolved_only && outcome.is_none() {
            continue;
        }
        trades.push(Trade {
            platform: fill.platform,
            market_id: fill.market_id.to_string(),
            timestamp: fill.timestamp,
            price,
            size: fill.size,
            side,
            outcome,
        });
    }
}

fn within(filter: &LoadFilter, timestamp: DateTime<Utc>) -> bool {
    if let Some(start) = filter.start {
        if timestamp < start {
            return false;
        }
    }
    if let Some(end) = filter.end {
        if timestamp > end {
            return false;
        }
    }
    true
}

fn io_schema(path: &Path) -> impl Fn(csv::Error) -> AnalysisError + '_ {
    move |e| AnalysisError::SchemaMismatch {
        path: path.display().to_string(),
        reason: format!("CSV parse error: {e}"),
    }
}
