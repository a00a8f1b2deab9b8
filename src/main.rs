use clap::Parser;
use monitor_core::{AppConfig, CoreError, ErrorExt, ErrorReporter, DEFAULT_CONFIG_PATH};
use monitor_service::{Monitor, ScanPlan};
use reddit_client::RedditClient;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "tech_monitor=info,monitor_core=info,monitor_service=info,reddit_client=info";
const VERBOSE_LOG_FILTER: &str =
    "tech_monitor=debug,monitor_core=debug,monitor_service=debug,reddit_client=debug";

/// Scan subreddits for posts mentioning configured keywords.
#[derive(Parser, Debug)]
#[command(name = "tech-monitor", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "TECH_MONITOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log debug output (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::info!("Starting Tech Monitor");

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            eprintln!("Error: {}", e.user_friendly_message());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Diagnostics go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<(), CoreError> {
    let config = AppConfig::load(&cli.config)?;
    let plan = ScanPlan::from_config(&config);
    let client = RedditClient::connect(&config.reddit).await?;

    let mut out = io::stdout();
    let matched = Monitor::new(&client, plan).run(&mut out).await?;

    tracing::debug!("Reported {} matching posts", matched.len());
    Ok(())
}
