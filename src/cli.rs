//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_store::CsvStore;
use crate::adapters::file_config::FileConfigAdapter;
use crate::adapters::json_artifact::{manifest_entry, JsonArtifactWriter, ManifestEntry};
use crate::adapters::svg_chart;
use crate::domain::config::AnalysisConfig;
use crate::domain::error::AnalysisError;
use crate::domain::market::Platform;
use crate::domain::registry::{self, AnalysisInput, MetricHandler};
use crate::ports::artifact::ArtifactPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::store::{LoadFilter, TradeStore};

#[derive(Parser, Debug)]
#[command(name = "marketlens", about = "Prediction-market trade analytics pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the analysis pipeline and write chart artifacts
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the storage root from [data]
        #[arg(long)]
        data: Option<PathBuf>,
        /// Override the artifact directory from [output]
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        platform: Option<String>,
        /// Compute a single metric by name
        #[arg(long)]
        metric: Option<String>,
        /// Also render SVG charts
        #[arg(long)]
        charts: bool,
    },
    /// List registered metrics
    ListMetrics,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show dataset summary counts
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        platform: Option<String>,
    },
    /// Serve analysis artifacts over HTTP
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            data,
            out,
            platform,
            metric,
            charts,
        } => run_pipeline(
            &config,
            data.as_ref(),
            out.as_ref(),
            platform.as_deref(),
            metric.as_deref(),
            charts,
        ),
        Command::ListMetrics => run_list_metrics(),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, platform } => run_info(&config, platform.as_deref()),
        Command::Serve { config } => run_serve(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = AnalysisError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Assemble the load filter from config plus a CLI platform override.
pub fn build_filter(
    config: &dyn ConfigPort,
    platform_override: Option<&str>,
) -> Result<LoadFilter, AnalysisError> {
    let platform = match platform_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "platform"))
    {
        Some(name) => Some(Platform::parse(&name).ok_or_else(|| AnalysisError::ConfigInvalid {
            section: "data".into(),
            key: "platform".into(),
            reason: format!("unknown platform {name:?}"),
        })?),
        None => None,
    };

    Ok(LoadFilter {
        platform,
        start: parse_bound(config, "start_date", |d| {
            d.and_hms_opt(0, 0, 0).unwrap().and_utc()
        })?,
        end: parse_bound(config, "end_date", |d| {
            d.and_hms_opt(23, 59, 59).unwrap().and_utc()
        })?,
        resolved_only: config.get_bool("filter", "resolved_only", false),
    })
}

fn parse_bound(
    config: &dyn ConfigPort,
    key: &str,
    to_instant: impl Fn(NaiveDate) -> chrono::DateTime<chrono::Utc>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, AnalysisError> {
    match config.get_string("filter", key) {
        Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map(|d| Some(to_instant(d)))
            .map_err(|_| AnalysisError::ConfigInvalid {
                section: "filter".into(),
                key: key.into(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }),
        None => Ok(None),
    }
}

fn data_root(
    config: &dyn ConfigPort,
    data_override: Option<&PathBuf>,
) -> Result<PathBuf, AnalysisError> {
    if let Some(root) = data_override {
        return Ok(root.clone());
    }
    config
        .get_string("data", "root")
        .map(PathBuf::from)
        .ok_or_else(|| AnalysisError::ConfigMissing {
            section: "data".into(),
            key: "root".into(),
        })
}

fn select_handlers(metric: Option<&str>) -> Result<Vec<MetricHandler>, ExitCode> {
    match metric {
        Some(name) => match registry::find(name) {
            Some(handler) => Ok(vec![handler]),
            None => {
                eprintln!("error: unknown metric {name:?} (see list-metrics)");
                Err(ExitCode::from(2))
            }
        },
        None => Ok(registry::all()),
    }
}

fn run_pipeline(
    config_path: &PathBuf,
    data_override: Option<&PathBuf>,
    out_override: Option<&PathBuf>,
    platform_override: Option<&str>,
    metric: Option<&str>,
    charts_flag: bool,
) -> ExitCode {
    // Stage 1: config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let analysis_cfg = match AnalysisConfig::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: storage and filter
    let root = match data_root(&adapter, data_override) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let filter = match build_filter(&adapter, platform_override) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let handlers = match select_handlers(metric) {
        Ok(h) => h,
        Err(code) => return code,
    };

    // Stage 3: load the normalized tables; loader failures abort the run
    eprintln!("Loading trade data from {}", root.display());
    let store = CsvStore::new(root);
    let markets = match store.load_markets(&filter) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let trades = match store.load_trades(&markets, &filter) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("  {} markets, {} trade legs", markets.len(), trades.len());

    // Stage 4: run the metric engine
    let input = AnalysisInput {
        trades: &trades,
        markets: &markets,
    };
    eprintln!("Computing {} metrics...", handlers.len());
    let outcomes = registry::run(&handlers, &input, &analysis_cfg);

    // Stage 5: serialize; a failed metric is skipped, not zero-filled
    let out_dir = out_override.cloned().unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("output", "dir")
                .unwrap_or_else(|| "artifacts".to_string()),
        )
    });
    let charts = charts_flag || adapter.get_bool("output", "charts", false);
    let writer = JsonArtifactWriter::new(out_dir.clone());
    let mut entries: Vec<ManifestEntry> = Vec::new();

    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => match writer.write(result) {
                Ok(path) => {
                    eprintln!("  {} -> {}", outcome.name, path.display());
                    entries.push(manifest_entry(result, &path));
                    if charts {
                        if let Err(e) = write_chart(&out_dir, result) {
                            eprintln!("warning: chart for {} failed ({e})", outcome.name);
                        }
                    }
                }
                Err(e) => eprintln!("warning: skipping {} ({e})", outcome.name),
            },
            Err(e) => eprintln!("warning: skipping {} ({e})", outcome.name),
        }
    }

    if entries.is_empty() {
        eprintln!("error: no metric produced a result");
        return ExitCode::from(5);
    }
    match writer.write_manifest(&entries) {
        Ok(path) => eprintln!(
            "\n{} of {} analyses written, manifest at {}",
            entries.len(),
            outcomes.len(),
            path.display()
        ),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    ExitCode::SUCCESS
}

fn write_chart(
    out_dir: &std::path::Path,
    result: &crate::domain::result::AnalysisResult,
) -> Result<(), AnalysisError> {
    let Some(svg) = svg_chart::render(result) else {
        return Ok(());
    };
    let dir = out_dir.join("charts");
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join(format!("{:02}_{}.svg", result.id, result.metric_name)),
        svg,
    )?;
    Ok(())
}

fn run_list_metrics() -> ExitCode {
    for handler in registry::all() {
        println!("{:2}  {}", handler.id, handler.name);
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = AnalysisConfig::from_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = build_filter(&adapter, None) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = data_root(&adapter, None) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config validated successfully");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, platform_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let root = match data_root(&adapter, None) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let filter = match build_filter(&adapter, platform_override) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let store = CsvStore::new(root);
    let markets = match store.load_markets(&filter) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let trades = match store.load_trades(&markets, &filter) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for platform in Platform::ALL {
        let market_count = markets.iter().filter(|m| m.platform == platform).count();
        if market_count == 0 {
            continue;
        }
        let resolved = markets
            .iter()
            .filter(|m| m.platform == platform && m.is_resolved())
            .count();
        let legs: Vec<_> = trades.iter().filter(|t| t.platform == platform).collect();
        let first = legs.iter().map(|t| t.timestamp).min();
        let last = legs.iter().map(|t| t.timestamp).max();
        println!("{platform}:");
        println!("  markets:       {market_count} ({resolved} resolved)");
        println!("  trade legs:    {}", legs.len());
        println!(
            "  resolved legs: {}",
            legs.iter().filter(|t| t.outcome.is_some()).count()
        );
        if let (Some(first), Some(last)) = (first, last) {
            println!(
                "  date range:    {} to {}",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router, AppState};
        use std::net::SocketAddr;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let artifact_dir = PathBuf::from(
            config
                .get_string("output", "dir")
                .unwrap_or_else(|| "artifacts".to_string()),
        );
        let addr: SocketAddr = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:5050".to_string())
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:5050".parse().unwrap());

        eprintln!("Serving {} on {addr}", artifact_dir.display());
        let router = build_router(AppState { artifact_dir });

        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            axum::serve(listener, router).await.unwrap();
        });
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_from_config() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nplatform = kalshi\n\
             [filter]\nstart_date = 2024-01-01\nend_date = 2024-06-30\nresolved_only = yes\n",
        )
        .unwrap();
        let filter = build_filter(&adapter, None).unwrap();
        assert_eq!(filter.platform, Some(Platform::Kalshi));
        assert!(filter.resolved_only);
        assert_eq!(
            filter.start.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(filter.end.unwrap().to_rfc3339(), "2024-06-30T23:59:59+00:00");
    }

    #[test]
    fn platform_override_wins() {
        let adapter = FileConfigAdapter::from_string("[data]\nplatform = kalshi\n").unwrap();
        let filter = build_filter(&adapter, Some("polymarket")).unwrap();
        assert_eq!(filter.platform, Some(Platform::Polymarket));
    }

    #[test]
    fn unknown_platform_is_config_invalid() {
        let adapter = FileConfigAdapter::from_string("[data]\nplatform = nyse\n").unwrap();
        let err = build_filter(&adapter, None).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigInvalid { .. }));
    }

    #[test]
    fn bad_date_is_config_invalid() {
        let adapter =
            FileConfigAdapter::from_string("[filter]\nstart_date = 01/02/2024\n").unwrap();
        let err = build_filter(&adapter, None).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigInvalid { .. }));
    }

    #[test]
    fn missing_data_root_is_config_missing() {
        let adapter = FileConfigAdapter::from_string("[output]\ndir = artifacts\n").unwrap();
        let err = data_root(&adapter, None).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigMissing { .. }));
    }
}
