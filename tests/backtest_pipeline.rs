use anyhow::Result;
use chrono::{Duration, NaiveDate};
use dca_engine::commands::{backtest, batch, snapshot};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const TOTAL_DAYS: i64 = 180;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Writes a gently rising price CSV covering `TOTAL_DAYS` calendar
/// days with weekend-like gaps.
fn write_price_csv(path: &Path) -> Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "date,close")?;
    for i in 0..TOTAL_DAYS {
        if i % 7 >= 5 {
            continue;
        }
        let date = start_date() + Duration::days(i);
        let close = 10.0 + i as f64 * 0.01;
        writeln!(file, "{},{:.4}", date, close)?;
    }
    Ok(())
}

fn write_config(path: &Path, symbol: &str, exit_strategy_json: &str) -> Result<()> {
    let end = start_date() + Duration::days(TOTAL_DAYS - 1);
    let config = format!(
        r#"{{
  "symbol": "{}",
  "investmentAmount": 1000.0,
  "frequencyDays": 14,
  "startDate": "{}",
  "endDate": "{}",
  "initialCash": 20000.0,
  "exitStrategy": {}
}}"#,
        symbol,
        start_date(),
        end,
        exit_strategy_json
    );
    fs::write(path, config)?;
    Ok(())
}

fn read_report(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[test]
fn backtest_command_writes_a_complete_result_document() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let prices_path = dir.path().join("prices.csv");
    let config_path = dir.path().join("config.json");
    let output_path = dir.path().join("result.json");
    write_price_csv(&prices_path)?;
    write_config(&config_path, "510300", r#"{"type":"hold"}"#)?;

    backtest::run(&config_path, &prices_path, Some(output_path.clone()), true)?;

    let report = read_report(&output_path)?;
    assert_eq!(report["symbol"], "510300");
    assert_eq!(report["exitStrategy"], "hold");
    assert!(!report["id"].as_str().unwrap().is_empty());

    let records = report["investmentRecords"].as_array().unwrap();
    assert!(!records.is_empty());
    for record in records {
        assert!(record["shares"].as_i64().unwrap() > 0);
        assert!(record["amount"].as_f64().unwrap() > 0.0);
    }
    assert!(report["sellRecords"].as_array().unwrap().is_empty());

    let metrics = &report["metrics"];
    assert!(metrics["totalReturn"].as_f64().is_some());
    assert!(metrics["sharpeRatio"].as_f64().is_some());
    assert!(metrics["maxDrawdown"].as_f64().unwrap() >= 0.0);
    assert_eq!(metrics["investmentEfficiency"].as_f64().unwrap(), 100.0);

    let benchmark = &report["benchmarkComparison"];
    assert_eq!(benchmark["isSameStrategy"], true);
    assert_eq!(benchmark["returnDifference"].as_f64().unwrap(), 0.0);

    // Details were requested, so the daily series is present and has
    // one entry per trading day.
    let valuations = report["dailyValuations"].as_array().unwrap();
    assert!(valuations.len() > 100);
    Ok(())
}

#[test]
fn backtest_command_rejects_invalid_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let prices_path = dir.path().join("prices.csv");
    let config_path = dir.path().join("config.json");
    write_price_csv(&prices_path)?;
    let end = start_date() + Duration::days(TOTAL_DAYS - 1);
    // endDate before startDate.
    fs::write(
        &config_path,
        format!(
            r#"{{"symbol":"510300","investmentAmount":1000.0,"frequencyDays":14,"startDate":"{}","endDate":"{}","initialCash":20000.0}}"#,
            end,
            start_date()
        ),
    )?;

    let result = backtest::run(&config_path, &prices_path, None, false);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn batch_command_writes_one_result_per_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let prices_path = dir.path().join("prices.csv");
    let configs_dir = dir.path().join("configs");
    let output_dir = dir.path().join("results");
    write_price_csv(&prices_path)?;
    fs::create_dir_all(&configs_dir)?;

    write_config(&configs_dir.join("hold.json"), "510300", r#"{"type":"hold"}"#)?;
    write_config(
        &configs_dir.join("target.json"),
        "510300",
        r#"{"type":"profit_target","profitTargetPct":5.0}"#,
    )?;
    write_config(
        &configs_dir.join("batch.json"),
        "510300",
        r#"{"type":"batch_exit","levels":[3.0,6.0],"ratios":[0.5,1.0]}"#,
    )?;

    batch::run(&configs_dir, &prices_path, &output_dir)?;

    let mut outputs: Vec<PathBuf> = fs::read_dir(&output_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    outputs.sort();
    assert_eq!(outputs.len(), 3);

    for path in &outputs {
        let report = read_report(path)?;
        assert_eq!(report["symbol"], "510300");
        assert!(report["dailyValuations"].as_array().is_some());
    }

    // The non-hold runs carry a real benchmark comparison.
    let target_report = read_report(&output_dir.join("target.result.json"))?;
    assert_eq!(target_report["benchmarkComparison"]["isSameStrategy"], false);
    Ok(())
}

#[test]
fn snapshot_round_trip_matches_csv_backtest() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let prices_path = dir.path().join("prices.csv");
    let snapshot_path = dir.path().join("prices.bin");
    let config_path = dir.path().join("config.json");
    let from_csv = dir.path().join("from_csv.json");
    let from_snapshot = dir.path().join("from_snapshot.json");
    write_price_csv(&prices_path)?;
    write_config(&config_path, "510300", r#"{"type":"hold"}"#)?;

    snapshot::run(&prices_path, &snapshot_path)?;
    backtest::run(&config_path, &prices_path, Some(from_csv.clone()), false)?;
    backtest::run(&config_path, &snapshot_path, Some(from_snapshot.clone()), false)?;

    let mut csv_report = read_report(&from_csv)?;
    let mut snapshot_report = read_report(&from_snapshot)?;
    // Only the assembly-time id and timestamp may differ.
    for report in [&mut csv_report, &mut snapshot_report] {
        let object = report.as_object_mut().unwrap();
        object.remove("id");
        object.remove("createdAt");
    }
    assert_eq!(csv_report, snapshot_report);
    Ok(())
}
