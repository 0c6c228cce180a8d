use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinxp::cli::history::parse_history_days;
use coinxp::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for coinxp::AppCommand {
    fn from(cmd: Commands) -> coinxp::AppCommand {
        match cmd {
            Commands::Prices { ids, watch } => coinxp::AppCommand::Prices {
                ids,
                watch_secs: watch,
            },
            Commands::Stats => coinxp::AppCommand::Stats,
            Commands::History { coin, days, rows } => {
                coinxp::AppCommand::History { coin, days, rows }
            }
            Commands::Predict { coin, horizon } => coinxp::AppCommand::Predict { coin, horizon },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current price, 24h change and market cap
    Prices {
        /// Asset ids as used by CoinGecko
        #[arg(default_value = "bitcoin")]
        ids: Vec<String>,
        /// Refresh the view every SECS seconds
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        watch: Option<u64>,
    },
    /// Display top 10 rankings by market cap, 24h gain and price
    Stats,
    /// Display historical prices for one asset
    History {
        #[arg(long, default_value = "bitcoin")]
        coin: String,
        /// Date range in days: 7, 14, 30, 90, 180 or 365
        #[arg(long, default_value_t = 365, value_parser = parse_history_days)]
        days: u32,
        /// Number of most recent points to list, 0 for all
        #[arg(long, default_value_t = 30)]
        rows: usize,
    },
    /// Forecast future prices with an ARIMA model
    Predict {
        #[arg(long, default_value = "bitcoin")]
        coin: String,
        /// Days to predict in the future
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=365))]
        horizon: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinxp::cli::setup::setup(),
        Some(cmd) => coinxp::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
