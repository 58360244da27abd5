//! CLI entry point for the Connecticut real-estate aggregation tool.
//!
//! Provides subcommands for refreshing the census cache and for printing or
//! exporting each aggregate view.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ct_estate::aggregates::ViewFilter;
use ct_estate::config::Settings;
use ct_estate::context::{census_loader, census_source};
use ct_estate::output::{
    print_json, print_pretty, write_csv, write_csv_to, write_json, write_json_to,
};
use ct_estate::{CensusMode, EstateContext};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ct_estate")]
#[command(about = "Aggregate Connecticut real-estate sales with census demographics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured census year and rewrite the cache
    RefreshCensus,
    /// Mean sale amount per town and year, with demographics
    TownYear(ViewArgs),
    /// Mean sale amount per town, residential type and year
    TownTypeYear(ViewArgs),
    /// Town-year rows (as "All") stacked on town-type-year rows
    Combined(ViewArgs),
    /// Year-over-year percent change per town
    Change(ViewArgs),
    /// List the years, residential types and towns available for filtering
    Selectors {
        /// Never call the census API; require an existing cache
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Only rows for this sale year
    #[arg(short, long)]
    year: Option<i32>,

    /// Only rows for this residential type ("All" for the pooled rows)
    #[arg(short = 't', long)]
    residential_type: Option<String>,

    /// Only rows for this town
    #[arg(long)]
    town: Option<String>,

    /// Output format ("log" emits the rows through the logger)
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Gzip compress CSV written to a file
    #[arg(long, default_value_t = false)]
    gzip: bool,

    /// Never call the census API; require an existing cache
    #[arg(long, default_value_t = false)]
    offline: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
    Log,
}

impl ViewArgs {
    fn filter(&self) -> ViewFilter {
        ViewFilter {
            year: self.year,
            residential_type: self.residential_type.clone(),
            town: self.town.clone(),
        }
    }

    fn mode(&self) -> CensusMode {
        census_mode(self.offline)
    }

    /// Rejects output flag combinations that would otherwise be ignored.
    fn validate(&self) -> Result<()> {
        if self.gzip && (self.output.is_none() || self.format != Format::Csv) {
            bail!("--gzip only applies to CSV written with --output");
        }
        if self.format == Format::Log && self.output.is_some() {
            bail!("--format log writes to the logger and cannot be combined with --output");
        }
        Ok(())
    }
}

fn census_mode(offline: bool) -> CensusMode {
    if offline {
        CensusMode::Offline
    } else {
        CensusMode::FetchIfMissing
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ct_estate.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ct_estate.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::RefreshCensus => {
            let loader = census_loader(&settings);
            let source = census_source(&settings)?;
            let records = loader.refresh(&source).await?;
            info!(
                rows = records.len(),
                cache = %loader.cache_path().display(),
                "Census cache refreshed"
            );
        }
        Commands::TownYear(args) => {
            args.validate()?;
            let ctx = EstateContext::open(&settings, args.mode()).await?;
            emit(&args, &ctx.town_year_mean_filtered(&args.filter()))?;
        }
        Commands::TownTypeYear(args) => {
            args.validate()?;
            let ctx = EstateContext::open(&settings, args.mode()).await?;
            emit(&args, &ctx.town_type_year_mean_filtered(&args.filter()))?;
        }
        Commands::Combined(args) => {
            args.validate()?;
            let ctx = EstateContext::open(&settings, args.mode()).await?;
            emit(&args, &ctx.combined_filtered(&args.filter()))?;
        }
        Commands::Change(args) => {
            args.validate()?;
            let ctx = EstateContext::open(&settings, args.mode()).await?;
            emit(&args, &ctx.change_series_filtered(&args.filter()))?;
        }
        Commands::Selectors { offline } => {
            let ctx = EstateContext::open(&settings, census_mode(offline)).await?;
            let selectors = Selectors {
                years: ctx.available_years(),
                residential_types: ctx.residential_types(),
                towns: ctx.towns(),
            };
            println!("{}", serde_json::to_string_pretty(&selectors)?);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct Selectors {
    years: Vec<i32>,
    residential_types: Vec<String>,
    towns: Vec<String>,
}

/// Writes a view to the requested file or to stdout.
fn emit<T: Serialize + Debug>(args: &ViewArgs, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        info!("No rows match the requested filter");
    }

    match (&args.output, args.format) {
        (Some(path), Format::Csv) => write_csv(path, rows, args.gzip),
        (Some(path), Format::Json) => write_json(path, rows),
        (None, Format::Csv) => write_csv_to(std::io::stdout().lock(), rows),
        (None, Format::Json) => write_json_to(std::io::stdout().lock(), rows),
        (None, Format::Log) => {
            print_pretty(rows);
            print_json(rows)
        }
        (Some(_), Format::Log) => bail!("--format log cannot be combined with --output"),
    }
}
