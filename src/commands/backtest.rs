use crate::config::InvestmentConfig;
use crate::data::load_price_series;
use crate::engine::simulate;
use crate::models::PricePoint;
use crate::performance::MetricsCalculator;
use crate::report::{assemble, BacktestReport};
use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub fn load_config(path: &Path) -> Result<InvestmentConfig> {
    let file =
        File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let config: InvestmentConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config {}", path.display()))?;
    Ok(config)
}

/// Runs one backtest against an already-loaded price series and
/// packages the result document. Shared by the single and batch
/// command paths.
pub fn execute(
    config: &InvestmentConfig,
    prices: &[PricePoint],
    include_details: bool,
) -> Result<BacktestReport> {
    let result = simulate(prices, config)?;
    let metrics = MetricsCalculator::compute(&result, config);
    let benchmark = MetricsCalculator::compare_with_benchmark(prices, config, &metrics)?;
    Ok(assemble(config, result, metrics, benchmark, include_details))
}

pub fn run(
    config_path: &Path,
    prices_path: &Path,
    output: Option<PathBuf>,
    include_details: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let prices = load_price_series(prices_path)?;

    info!(
        "Backtesting {} from {} to {} ({} strategy)",
        config.symbol,
        config.start_date,
        config.end_date,
        config.exit_strategy.label()
    );

    let report = execute(&config, &prices, include_details)?;

    info!(
        "Completed {}: {} investments, {} sells, total return {:.2}%, max drawdown {:.2}%",
        config.symbol,
        report.investment_records.len(),
        report.sell_records.len(),
        report.metrics.total_return,
        report.metrics.max_drawdown * 100.0
    );

    let json = serde_json::to_string_pretty(&report).context("serializing result document")?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("writing result to {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
