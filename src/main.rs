//! CLI entry point for the fog log tracker engine.
//!
//! Provides subcommands for computing a single windowed view of the
//! visibility log and for watching the log on a periodic refresh.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fog_log_tracker::{
    engine::{Engine, Refresh},
    fetch::BasicClient,
    output::{append_summary, print_json},
    source::{CsvFileSource, CsvUrlSource, RecordSource},
    window::Lookback,
};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Published CSV log of the Delhi airport visibility reports.
const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/saranshhh/fog_log_checker_delhi/main/delhi_fog_data.csv";

#[derive(Parser)]
#[command(name = "fog_log_tracker")]
#[command(about = "Extracts and windows visibility series from an airport fog log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the log once and print the windowed view as JSON
    Show {
        /// Path to a CSV file or URL to fetch (defaults to FOG_LOG_URL or the published log)
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Lookback window: 6h, 24h, or 7d
        #[arg(short, long, default_value = "24h")]
        lookback: Lookback,

        /// Optional CSV file to append the summary row to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Re-poll the log periodically and log the refreshed summary
    Watch {
        /// Path to a CSV file or URL to fetch (defaults to FOG_LOG_URL or the published log)
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Lookback window: 6h, 24h, or 7d
        #[arg(short, long, default_value = "24h")]
        lookback: Lookback,

        /// Seconds between refresh cycles
        #[arg(short = 'r', long, default_value_t = 60)]
        interval: u64,

        /// Number of cycles to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        cycles: usize,

        /// Cache TTL in seconds; 0 re-reads the source on every cycle
        #[arg(long, default_value_t = 0)]
        cache_ttl: u64,

        /// Optional CSV file to append summary rows to
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fog_log_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fog_log_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            source,
            lookback,
            output,
        } => {
            let mut engine = Engine::new(make_source(source));
            let view = engine.view(lookback, Refresh::Always).await?;

            print_json(&view)?;
            if let Some(path) = output {
                append_summary(&path, &view)?;
            }
        }
        Commands::Watch {
            source,
            lookback,
            interval,
            cycles,
            cache_ttl,
            output,
        } => {
            watch(make_source(source), lookback, interval, cycles, cache_ttl, output).await?;
        }
    }

    Ok(())
}

/// Resolves the source argument: explicit value, FOG_LOG_URL, or the
/// published log; a URL goes through HTTP, anything else is a local file.
fn make_source(arg: Option<String>) -> Box<dyn RecordSource> {
    let spec = arg
        .or_else(|| std::env::var("FOG_LOG_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATA_URL.to_string());

    if spec.starts_with("http") {
        Box::new(CsvUrlSource::new(BasicClient::new(), spec))
    } else {
        Box::new(CsvFileSource::new(spec))
    }
}

/// Periodic refresh loop: one full fetch-parse-filter-window cycle per
/// tick, summaries logged and optionally appended to CSV. A failed cycle
/// is logged and the loop keeps going.
#[tracing::instrument(skip(source, output), fields(interval, cycles, cache_ttl))]
async fn watch(
    source: Box<dyn RecordSource>,
    lookback: Lookback,
    interval: u64,
    cycles: usize,
    cache_ttl: u64,
    output: Option<String>,
) -> Result<()> {
    let mut engine = Engine::new(source);
    let refresh = if cache_ttl == 0 {
        Refresh::Always
    } else {
        Refresh::Ttl(Duration::from_secs(cache_ttl))
    };

    if cycles == 0 {
        info!(interval, "Watching infinitely. Press Ctrl+C to stop.");
    } else {
        info!(cycles, interval, "Starting watch cycles");
    }

    let mut cycle_count = 0;
    loop {
        if cycles > 0 && cycle_count >= cycles {
            break;
        }
        cycle_count += 1;

        match engine.view(lookback, refresh).await {
            Ok(view) => {
                info!(
                    latest_timestamp = %view.latest_timestamp,
                    lookback = view.lookback_label,
                    latest_general_vis = view.summary.latest_general_vis,
                    min_current_rvr = view.summary.min_current_rvr,
                    period_mean = view.summary.period_mean_display(),
                    fog_category = ?view.summary.fog_category,
                    in_window_general = view.general.len(),
                    in_window_runway = view.runway.len(),
                    "Window recomputed"
                );
                if view.runway.is_empty() {
                    info!("No runway data found for this timeframe");
                }
                if let Some(ref path) = output {
                    if let Err(e) = append_summary(path, &view) {
                        error!(error = %e, "Failed to append summary row");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Refresh cycle failed");
            }
        }

        if cycles == 0 || cycle_count < cycles {
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    }

    info!(cycle_count, "Watch finished");
    Ok(())
}
