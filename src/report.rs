use crate::config::InvestmentConfig;
use crate::models::{
    BenchmarkComparison, DailyValuation, InvestmentRecord, PerformanceMetrics, PortfolioState,
    SellRecord, SimulationResult, SkippedInvestment,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The result document consumed by the API/UI layer. Everything the
/// engine computed plus identification and timestamps, which are
/// stamped here so the engine itself stays deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub id: String,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub exit_strategy: String,
    pub config: InvestmentConfig,
    pub final_state: PortfolioState,
    pub metrics: PerformanceMetrics,
    pub benchmark_comparison: BenchmarkComparison,
    pub investment_records: Vec<InvestmentRecord>,
    pub sell_records: Vec<SellRecord>,
    pub skipped_investments: Vec<SkippedInvestment>,
    /// Daily series for charting; omitted unless details are requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_valuations: Option<Vec<DailyValuation>>,
    pub created_at: DateTime<Utc>,
}

/// Packages one finished run into the result document.
pub fn assemble(
    config: &InvestmentConfig,
    result: SimulationResult,
    metrics: PerformanceMetrics,
    benchmark: BenchmarkComparison,
    include_details: bool,
) -> BacktestReport {
    let SimulationResult {
        investments,
        sells,
        skips,
        daily_valuations,
        final_state,
    } = result;

    BacktestReport {
        id: Uuid::new_v4().to_string(),
        symbol: config.symbol.clone(),
        start_date: config.start_date,
        end_date: config.end_date,
        exit_strategy: config.exit_strategy.label().to_string(),
        config: config.clone(),
        final_state,
        metrics,
        benchmark_comparison: benchmark,
        investment_records: investments,
        sell_records: sells,
        skipped_investments: skips,
        daily_valuations: include_details.then_some(daily_valuations),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CostModel, ExitStrategyKind};
    use crate::performance::MetricsCalculator;
    use crate::models::PricePoint;
    use chrono::Duration;

    #[test]
    fn report_serializes_to_camel_case_json() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let prices: Vec<PricePoint> = (0..10)
            .map(|i| PricePoint {
                date: start + Duration::days(i),
                close: 10.0 + i as f64 * 0.1,
            })
            .collect();
        let config = InvestmentConfig {
            symbol: "510300".to_string(),
            investment_amount: 1000.0,
            frequency_days: 5,
            start_date: start,
            end_date: start + Duration::days(9),
            initial_cash: 5000.0,
            exit_strategy: ExitStrategyKind::Hold,
            costs: CostModel::default(),
            risk_free_rate: 0.0,
        };

        let result = crate::engine::simulate(&prices, &config).unwrap();
        let metrics = MetricsCalculator::compute(&result, &config);
        let benchmark =
            MetricsCalculator::compare_with_benchmark(&prices, &config, &metrics).unwrap();
        let report = assemble(&config, result, metrics, benchmark, false);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["symbol"], "510300");
        assert_eq!(json["exitStrategy"], "hold");
        assert!(json["benchmarkComparison"]["isSameStrategy"].as_bool().unwrap());
        assert!(json.get("dailyValuations").is_none());
        assert!(json["investmentRecords"].as_array().unwrap().len() == 2);
    }
}
