use crate::commands::backtest::{execute, load_config};
use crate::config::InvestmentConfig;
use crate::data::load_price_series;
use crate::models::PricePoint;
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::sync::Arc;
use std::thread;

struct BacktestTask {
    name: String,
    config: InvestmentConfig,
    output_path: PathBuf,
}

struct BacktestTaskResult {
    name: String,
    run: StdResult<PathBuf, String>,
}

/// Runs every `*.json` config in a directory against one price series,
/// one worker thread per core up to the task count. Each request is an
/// independent engine invocation; a failing run is reported and does
/// not stop the rest.
pub fn run(configs_dir: &Path, prices_path: &Path, output_dir: &Path) -> Result<()> {
    let prices = Arc::new(load_price_series(prices_path)?);
    let tasks = collect_tasks(configs_dir, output_dir)?;
    if tasks.is_empty() {
        return Err(anyhow!(
            "no *.json config files found in {}",
            configs_dir.display()
        ));
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let total = tasks.len();
    let num_workers = std::cmp::min(total, std::cmp::max(1, num_cpus::get()));
    info!(
        "Running {} backtest{} on {} worker thread{}",
        total,
        if total == 1 { "" } else { "s" },
        num_workers,
        if num_workers == 1 { "" } else { "s" }
    );

    let (task_tx, task_rx): (Sender<BacktestTask>, Receiver<BacktestTask>) = bounded(total);
    let (result_tx, result_rx): (Sender<BacktestTaskResult>, Receiver<BacktestTaskResult>) =
        bounded(total);

    let mut handles = Vec::new();
    for _ in 0..num_workers {
        let rx = task_rx.clone();
        let result_tx = result_tx.clone();
        let prices = prices.clone();

        let handle = thread::spawn(move || {
            while let Ok(task) = rx.recv() {
                let BacktestTask {
                    name,
                    config,
                    output_path,
                } = task;
                let run = run_single(&config, &prices, &output_path);
                let message = BacktestTaskResult {
                    name,
                    run: run.map(|_| output_path).map_err(|e| e.to_string()),
                };
                if result_tx.send(message).is_err() {
                    break;
                }
            }
        });
        handles.push(handle);
    }
    drop(result_tx);

    for task in tasks {
        task_tx.send(task)?;
    }
    drop(task_tx);

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .expect("static progress template is valid"),
    );

    let mut failures: Vec<String> = Vec::new();
    while let Ok(message) = result_rx.recv() {
        match message.run {
            Ok(path) => {
                progress.set_message(message.name.clone());
                info!("Completed {} -> {}", message.name, path.display());
            }
            Err(error) => {
                warn!("Backtest {} failed: {}", message.name, error);
                failures.push(format!("{} ({})", message.name, error));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    for handle in handles {
        let _ = handle.join();
    }

    if failures.is_empty() {
        info!("All {} backtests completed", total);
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} backtests failed: {}",
            failures.len(),
            total,
            failures.join(", ")
        ))
    }
}

fn run_single(
    config: &InvestmentConfig,
    prices: &[PricePoint],
    output_path: &Path,
) -> Result<()> {
    let report = execute(config, prices, true)?;
    let json = serde_json::to_string_pretty(&report).context("serializing result document")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("writing result to {}", output_path.display()))?;
    Ok(())
}

fn collect_tasks(configs_dir: &Path, output_dir: &Path) -> Result<Vec<BacktestTask>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(configs_dir)
        .with_context(|| format!("reading config directory {}", configs_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    entries.sort();

    let mut tasks = Vec::with_capacity(entries.len());
    for path in entries {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("backtest")
            .to_string();
        let config = load_config(&path)?;
        tasks.push(BacktestTask {
            output_path: output_dir.join(format!("{}.result.json", name)),
            name,
            config,
        });
    }
    Ok(tasks)
}
