//! Strategy scout - main entry point
//!
//! This binary provides five subcommands:
//! - optimize: Select the best strategy for one instrument
//! - backtest: Evaluate one explicit strategy on one instrument
//! - scan: Optimize a whole ticker universe in parallel
//! - plan: Build an ATR-based trade plan
//! - journal: Record, close and summarize trades

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "strategy-scout")]
#[command(about = "Technical strategy scout with grid-search backtesting and ATR risk planning", long_about = None)]
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
    /// Select the best strategy for one instrument
    Optimize {
        /// Instrument symbol, e.g. SPY or BTC-USD
        symbol: String,

        /// Path to configuration file (defaults are used if missing)
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Search grid (quick or full), overrides config
        #[arg(short, long)]
        mode: Option<String>,

        /// Scoring policy (return or risk_adjusted), overrides config
        #[arg(long)]
        scoring: Option<String>,

        /// Skip the strategy map and always grid-search
        #[arg(long)]
        search: bool,

        /// Print the winner as JSON
        #[arg(long)]
        json: bool,
    },

    /// Backtest one explicit strategy
    Backtest {
        /// Instrument symbol
        symbol: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Strategy as JSON, e.g. '{"strategy":"trend_crossover","params":{"fast":50,"slow":200}}'.
        /// Defaults to the symbol's strategy map entry.
        #[arg(short, long)]
        strategy: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Optimize every configured ticker in parallel
    Scan {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Search grid (quick or full), overrides config
        #[arg(short, long)]
        mode: Option<String>,

        /// Tickers to scan (comma-separated), overrides config
        #[arg(long)]
        tickers: Option<String>,

        /// Number of rows to print
        #[arg(short, long, default_value = "20")]
        top: usize,

        /// Report path (defaults to <results_dir>/scan_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a sized trade plan from the latest ATR
    Plan {
        /// Instrument symbol
        symbol: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// LONG or SHORT
        #[arg(short, long, default_value = "LONG")]
        direction: String,

        /// Entry price (defaults to the last close)
        #[arg(short, long)]
        entry: Option<f64>,
    },

    /// Trade journal
    Journal {
        /// Journal CSV file
        #[arg(short, long, default_value = "journal.csv", global = true)]
        file: PathBuf,

        #[command(subcommand)]
        action: JournalAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum JournalAction {
    /// Open a trade from a fresh trade plan
    Open {
        /// Instrument symbol
        symbol: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// LONG or SHORT
        #[arg(short, long, default_value = "LONG")]
        direction: String,

        /// Entry price (defaults to the last close)
        #[arg(short, long)]
        entry: Option<f64>,

        /// Strategy label (defaults to the symbol's strategy map entry)
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// Close the open trade at the given row index
    Close {
        /// Row index as shown by `journal list`
        index: usize,

        /// Exit price
        exit: f64,
    },

    /// List all trades
    List,

    /// Realized PnL statistics
    Summary,
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{timestamp}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // Keep the console clean for the progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Optimize { .. } => ("optimize", false),
        Commands::Backtest { .. } => ("backtest", false),
        Commands::Scan { .. } => ("scan", true), // progress bar owns the console
        Commands::Plan { .. } => ("plan", false),
        Commands::Journal { .. } => ("journal", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Optimize {
            symbol,
            config,
            mode,
            scoring,
            search,
            json,
        } => commands::optimize::run(symbol, config, mode, scoring, search, json),

        Commands::Backtest {
            symbol,
            config,
            strategy,
            json,
        } => commands::backtest::run(symbol, config, strategy, json),

        Commands::Scan {
            config,
            mode,
            tickers,
            top,
            output,
        } => commands::scan::run(config, mode, tickers, top, output),

        Commands::Plan {
            symbol,
            config,
            direction,
            entry,
        } => commands::plan::run(symbol, config, direction, entry),

        Commands::Journal { file, action } => commands::journal::run(file, action),
    }
}
