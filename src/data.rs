use crate::error::{EngineError, EngineResult};
use crate::models::PricePoint;
use anyhow::{anyhow, Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Checks the invariants the simulation relies on: a non-empty series,
/// strictly ascending dates, and positive finite closes.
pub fn validate_price_series(prices: &[PricePoint]) -> EngineResult<()> {
    if prices.is_empty() {
        return Err(EngineError::Data("price series is empty".to_string()));
    }
    for point in prices {
        if !point.close.is_finite() || point.close <= 0.0 {
            return Err(EngineError::Data(format!(
                "non-positive close {} on {}",
                point.close, point.date
            )));
        }
    }
    for window in prices.windows(2) {
        if window[1].date <= window[0].date {
            return Err(EngineError::Data(format!(
                "price series is not strictly ascending ({} after {})",
                window[1].date, window[0].date
            )));
        }
    }
    Ok(())
}

/// Loads a price series from a CSV, JSON, or binary snapshot file,
/// dispatching on the extension. The loaded series is validated before
/// being returned.
pub fn load_price_series(path: &Path) -> Result<Vec<PricePoint>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let prices = match extension.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "bin" => read_snapshot(path)?,
        other => {
            return Err(anyhow!(
                "unsupported price file extension '{}' (expected csv, json, or bin)",
                other
            ))
        }
    };

    validate_price_series(&prices)
        .with_context(|| format!("validating price series from {}", path.display()))?;
    info!(
        "Loaded {} trading days from {}",
        prices.len(),
        path.display()
    );
    Ok(prices)
}

/// CSV with a `date,close` header, dates in YYYY-MM-DD.
fn load_csv(path: &Path) -> Result<Vec<PricePoint>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening price CSV {}", path.display()))?;
    let mut prices = Vec::new();
    for record in reader.deserialize() {
        let point: PricePoint =
            record.with_context(|| format!("parsing price row in {}", path.display()))?;
        prices.push(point);
    }
    Ok(prices)
}

fn load_json(path: &Path) -> Result<Vec<PricePoint>> {
    let file =
        File::open(path).with_context(|| format!("opening price JSON {}", path.display()))?;
    let prices: Vec<PricePoint> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing price JSON {}", path.display()))?;
    Ok(prices)
}

/// Reads a binary snapshot written by `write_snapshot`.
pub fn read_snapshot(path: &Path) -> Result<Vec<PricePoint>> {
    let file =
        File::open(path).with_context(|| format!("opening price snapshot {}", path.display()))?;
    let prices: Vec<PricePoint> = bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("decoding price snapshot {}", path.display()))?;
    Ok(prices)
}

/// Writes the series as a compact binary snapshot for fast reloads.
pub fn write_snapshot(path: &Path, prices: &[PricePoint]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating snapshot {}", path.display()))?;
    bincode::serialize_into(BufWriter::new(file), prices)
        .with_context(|| format!("encoding snapshot {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_series() -> Vec<PricePoint> {
        vec![
            PricePoint {
                date: date(2024, 1, 2),
                close: 10.5,
            },
            PricePoint {
                date: date(2024, 1, 3),
                close: 10.8,
            },
            PricePoint {
                date: date(2024, 1, 4),
                close: 10.2,
            },
        ]
    }

    #[test]
    fn rejects_empty_series() {
        assert!(validate_price_series(&[]).is_err());
    }

    #[test]
    fn rejects_duplicate_dates() {
        let mut prices = sample_series();
        prices[1].date = prices[0].date;
        assert!(validate_price_series(&prices).is_err());
    }

    #[test]
    fn rejects_non_positive_close() {
        let mut prices = sample_series();
        prices[2].close = 0.0;
        assert!(validate_price_series(&prices).is_err());
    }

    #[test]
    fn loads_csv_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "date,close").unwrap();
        writeln!(file, "2024-01-02,10.5").unwrap();
        writeln!(file, "2024-01-03,10.8").unwrap();
        writeln!(file, "2024-01-04,10.2").unwrap();
        drop(file);

        let prices = load_price_series(&path).unwrap();
        assert_eq!(prices, sample_series());
    }

    #[test]
    fn snapshot_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.bin");
        let original = sample_series();

        write_snapshot(&path, &original).unwrap();
        let restored = read_snapshot(&path).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.parquet");
        File::create(&path).unwrap();
        assert!(load_price_series(&path).is_err());
    }
}
