//! Kessan CLI binary.
//!
//! Fetches a company's statements, aligns them and prints the derived series,
//! chart specifications, a latest-period summary or the raw statements.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use kessan::{PipelineConfig, get_financial_timeseries};
use kessan_data::{
    Granularity, MemoryProvider, ProviderConfig, RawStatementSet, StatementKind,
    StatementProvider, YahooProvider,
};
use kessan_metrics::{AlignmentPolicy, FinancialTimeseries};
use kessan_output::{
    CurrencyUnit, DisplayConfig, ExportFormat, Exporter, LatestMetrics, all_charts, series_table,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kessan")]
#[command(about = "Kessan: aligned financial statements and per-share metrics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the aligned series with derived metrics
    Series {
        #[command(flatten)]
        source: SourceArgs,

        /// Alignment policy (forward-fill or intersection)
        #[arg(long, default_value = "forward-fill")]
        policy: AlignmentPolicy,

        /// Use the current share count even when a share history is reported
        #[arg(long)]
        no_share_history: bool,

        /// Output format (text, json or csv); guessed from --output when omitted
        #[arg(long)]
        format: Option<String>,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Currency unit for text output (auto, units, thousands, millions, billions)
        #[arg(long, default_value = "auto")]
        unit: CurrencyUnit,
    },

    /// Print chart specifications as JSON
    Charts {
        #[command(flatten)]
        source: SourceArgs,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show the latest period's headline metrics
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Currency unit (auto, units, thousands, millions, billions)
        #[arg(long, default_value = "auto")]
        unit: CurrencyUnit,
    },

    /// List the labels and periods of each raw statement
    Raw {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the raw statement set as JSON, usable as a --snapshot file
        #[arg(long)]
        json: bool,
    },
}

/// Where statements come from.
#[derive(Args)]
struct SourceArgs {
    /// Stock symbol
    ticker: String,

    /// Reporting period (quarterly or annual)
    #[arg(long, default_value = "quarterly")]
    period: Granularity,

    /// Read statements from a JSON snapshot instead of Yahoo Finance
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Retries per request on rate limiting or server errors
    #[arg(long, default_value = "2")]
    max_retries: u32,
}

impl SourceArgs {
    fn provider(&self) -> Result<Box<dyn StatementProvider>, Box<dyn std::error::Error>> {
        if let Some(path) = &self.snapshot {
            debug!(path = %path.display(), "reading statement snapshot");
            return Ok(Box::new(MemoryProvider::from_json_file(path)?));
        }

        let config = ProviderConfig {
            max_retries: self.max_retries,
            ..ProviderConfig::default()
        };
        Ok(Box::new(YahooProvider::with_config(config)?))
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Log filter from `RUST_LOG` (default `warn`), JSON lines when
/// `RUST_LOG_FORMAT=json`. Logs go to stderr so stdout stays pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Series {
            source,
            policy,
            no_share_history,
            format,
            output,
            unit,
        } => {
            let config = PipelineConfig {
                policy,
                prefer_share_history: !no_share_history,
                ..PipelineConfig::default()
            };
            let series = fetch_series(&source, &config).await?;
            let display = DisplayConfig {
                currency_unit: unit,
                ..DisplayConfig::default()
            };
            write_series(&series, format.as_deref(), output.as_deref(), &display)?;
        }
        Commands::Charts { source, pretty } => {
            let series = fetch_series(&source, &PipelineConfig::default()).await?;
            let charts = all_charts(&series, &DisplayConfig::default());
            let format = if pretty {
                ExportFormat::PrettyJson
            } else {
                ExportFormat::Json
            };
            println!("{}", charts.export_to_string(format)?);
        }
        Commands::Summary { source, unit } => {
            let series = fetch_series(&source, &PipelineConfig::default()).await?;
            let display = DisplayConfig {
                currency_unit: unit,
                ..DisplayConfig::default()
            };
            let latest = LatestMetrics::from_series(&series)
                .ok_or_else(|| format!("No periods reported for {}", series.ticker()))?;
            print!("{}", latest.to_ascii_table(&display));
            for warning in series.warnings() {
                eprintln!("Warning: {warning}");
            }
        }
        Commands::Raw { source, json } => {
            let provider = source.provider()?;
            let pb = spinner(format!("Fetching statements for {}...", source.ticker));
            let raw = RawStatementSet::fetch(provider.as_ref(), &source.ticker, source.period).await;
            pb.finish_and_clear();
            let raw = raw?;

            if json {
                println!("{}", serde_json::to_string_pretty(&raw)?);
            } else {
                print_raw(&raw);
            }
        }
    }

    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn fetch_series(
    source: &SourceArgs,
    config: &PipelineConfig,
) -> Result<FinancialTimeseries, Box<dyn std::error::Error>> {
    let provider = source.provider()?;
    let pb = spinner(format!(
        "Fetching {} statements for {} from {}...",
        source.period,
        source.ticker,
        provider.name()
    ));

    let result =
        get_financial_timeseries(provider.as_ref(), &source.ticker, source.period, config).await;
    match &result {
        Ok(series) => pb.finish_with_message(format!(
            "Aligned {} periods for {}",
            series.len(),
            series.ticker()
        )),
        Err(_) => pb.finish_and_clear(),
    }

    Ok(result?)
}

fn write_series(
    series: &FinancialTimeseries,
    format: Option<&str>,
    output: Option<&Path>,
    display: &DisplayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = match format {
        Some(name) if name.eq_ignore_ascii_case("text") => None,
        Some(name) => Some(name.parse::<ExportFormat>()?),
        None => output.and_then(ExportFormat::from_path),
    };

    match (format, output) {
        (Some(format), Some(path)) => {
            series.export_to_file(path, format)?;
            eprintln!("Wrote {} periods to {}", series.len(), path.display());
        }
        (Some(format), None) => println!("{}", series.export_to_string(format)?),
        (None, Some(path)) => {
            std::fs::write(path, series_table(series, display))?;
            eprintln!("Wrote {} periods to {}", series.len(), path.display());
        }
        (None, None) => print!("{}", series_table(series, display)),
    }

    Ok(())
}

fn print_raw(raw: &RawStatementSet) {
    println!("\n{} ({})", raw.ticker, raw.granularity);
    println!("{}", "=".repeat(60));

    for kind in [
        StatementKind::Income,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ] {
        match raw.statement(kind) {
            Some(table) if !table.is_empty() => {
                let periods: Vec<String> = table.periods().map(|d| d.to_string()).collect();
                println!("\n{kind} ({} periods)", table.len());
                println!("  Periods: {}", periods.join(", "));
                for label in table.labels() {
                    let reported = table.row(label).map_or(0, |row| row.len());
                    println!("  {label:<50} {reported:>3}");
                }
            }
            _ => println!("\n{kind}: not reported"),
        }
    }

    println!();
    match raw.shares_outstanding {
        Some(count) => println!("Shares outstanding: {count:.0}"),
        None => println!("Shares outstanding: not reported"),
    }
    match &raw.dividends {
        Some(dividends) if !dividends.is_empty() => {
            println!("Dividend events: {}", dividends.len());
        }
        _ => println!("Dividend events: none"),
    }
}
