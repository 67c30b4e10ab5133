use clap::{Parser, Subcommand};
use dca_engine::commands::{backtest, batch, snapshot};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dca-engine")]
#[command(about = "A dollar-cost-averaging strategy backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest and emit the result document
    Backtest {
        /// Path to the investment config JSON
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
        /// Path to the price series file (csv, json, or bin)
        #[arg(long, value_name = "PATH")]
        prices: PathBuf,
        /// Destination for the result JSON (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Include the daily valuation series in the result
        #[arg(long)]
        details: bool,
    },
    /// Run every config in a directory against one price series
    Batch {
        /// Directory of investment config JSON files
        #[arg(long, value_name = "DIR")]
        configs: PathBuf,
        /// Path to the price series file (csv, json, or bin)
        #[arg(long, value_name = "PATH")]
        prices: PathBuf,
        /// Directory for the result documents
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },
    /// Convert a CSV or JSON price file into a binary snapshot
    Snapshot {
        /// Source price file
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,
        /// Destination snapshot file
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            config,
            prices,
            output,
            details,
        } => backtest::run(&config, &prices, output, details),
        Commands::Batch {
            configs,
            prices,
            output,
        } => batch::run(&configs, &prices, &output),
        Commands::Snapshot { input, output } => snapshot::run(&input, &output),
    }
}
