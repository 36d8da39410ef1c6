//! Regime trader - main entry point
//!
//! This binary provides three subcommands:
//! - run: Run the regime dispatcher against the paper gateway
//! - classify: Classify a single quote
//! - params: Print the per-regime parameter sets

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "regime-trader")]
#[command(about = "Regime-driven strategy dispatcher with a paper gateway", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dispatcher until safety stop, Ctrl+C, or deadline
    Run {
        /// Path to configuration file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Symbol (overrides config file)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Base risk amount per trade (overrides config file)
        #[arg(long)]
        risk: Option<f64>,

        /// Pause between cycles in seconds (overrides config file)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop the run after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Classify one quote and show the parameter set it would dispatch
    Classify {
        /// Path to configuration file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<String>,

        #[arg(long)]
        bid: f64,

        #[arg(long)]
        ask: f64,

        /// Point size of the symbol. E.g., 0.00001
        #[arg(long, default_value = "0.00001")]
        point: f64,

        /// UTC time of day (HH:MM), defaults to now
        #[arg(long)]
        time: Option<String>,
    },

    /// Print the parameter set of every regime
    Params {
        /// Path to configuration file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy runtime internals
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!("{},tokio=warn,runtime=warn", level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    // JSON output goes to stdout, keep the console free of log lines
    let console_layer = (!file_only).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    if !file_only {
        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Run { .. } => ("run", false),
        Commands::Classify { .. } => ("classify", true),
        Commands::Params { .. } => ("params", true),
    };

    // RUST_LOG and REGIME_TRADER_SYMBOL may come from .env
    dotenv::dotenv().ok();

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Run {
            config,
            symbol,
            risk,
            interval,
            duration,
        } => commands::run::run(config, symbol, risk, interval, duration),

        Commands::Classify {
            config,
            bid,
            ask,
            point,
            time,
        } => commands::classify::run(config, bid, ask, point, time),

        Commands::Params { config } => commands::params::run(config),
    }
}
