use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One closing price for one trading day. The ordered sequence of these
/// forms the simulation's trading calendar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Mutable portfolio state owned by the simulation loop. Exactly one
/// writer exists per run; the final value is published on the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioState {
    pub cash: f64,
    pub shares_held: i64,
    pub total_invested: f64,
    pub total_shares_ever_bought: i64,
    pub rounds_executed: u32,
}

impl PortfolioState {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            shares_held: 0,
            total_invested: 0.0,
            total_shares_ever_bought: 0,
            rounds_executed: 0,
        }
    }

    /// Market value of the held position at the given price.
    pub fn position_value(&self, close: f64) -> f64 {
        self.shares_held as f64 * close
    }

    /// Unrealized return in percent, or `None` while nothing has been
    /// invested. Measured on all shares ever bought against cumulative
    /// invested cash, so partial exits do not distort the trigger path
    /// an exit rule is watching.
    pub fn unrealized_return_pct(&self, close: f64) -> Option<f64> {
        if self.total_invested <= 0.0 {
            return None;
        }
        let accumulated_value = self.total_shares_ever_bought as f64 * close;
        Some((accumulated_value - self.total_invested) / self.total_invested * 100.0)
    }
}

/// One executed scheduled buy. Appended, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRecord {
    pub date: NaiveDate,
    pub round: u32,
    pub price: f64,
    pub shares: i64,
    /// Share cost actually spent (shares x price, fees excluded).
    pub amount: f64,
    pub target_amount: f64,
    pub fees: f64,
    /// Portfolio value right after the buy settled.
    pub market_value: f64,
}

/// One executed exit event, full or partial. Appended, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub shares_sold: i64,
    /// Gross proceeds (shares x price, fees excluded).
    pub amount: f64,
    pub commission: f64,
    /// Exit rule that fired.
    pub reason: String,
    /// Unrealized return that triggered the exit, in percent.
    pub return_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Cash could not cover the scheduled buy plus fees.
    InsufficientCash,
    /// A single share cost more than the scheduled amount.
    PriceAboveBudget,
    /// Roll-forward found no usable trading day before the end date.
    NoTradingDay,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InsufficientCash => "insufficient_cash",
            SkipReason::PriceAboveBudget => "price_above_budget",
            SkipReason::NoTradingDay => "no_trading_day",
        }
    }
}

/// A scheduled round that did not execute. Not an error; the run
/// continues and the event feeds the investment-efficiency metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedInvestment {
    pub date: NaiveDate,
    pub round: u32,
    pub reason: SkipReason,
}

/// End-of-day portfolio snapshot, one per trading day in range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyValuation {
    pub date: NaiveDate,
    pub close: f64,
    pub portfolio_value: f64,
    pub cash: f64,
    pub shares_held: i64,
}

/// Full audit trail of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub investments: Vec<InvestmentRecord>,
    pub sells: Vec<SellRecord>,
    pub skips: Vec<SkippedInvestment>,
    pub daily_valuations: Vec<DailyValuation>,
    pub final_state: PortfolioState,
}

impl SimulationResult {
    pub fn final_value(&self) -> f64 {
        self.daily_valuations
            .last()
            .map(|v| v.portfolio_value)
            .unwrap_or(self.final_state.cash)
    }
}

/// Min/max/mean close over the executed investment dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeSummary {
    pub min_price: f64,
    pub max_price: f64,
    pub mean_price: f64,
}

/// Derived statistics, computed once after the run and never mutated.
/// Degenerate inputs produce 0.0 sentinels rather than errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// (final value - initial cash) / initial cash x 100.
    pub total_return: f64,
    /// (final / initial)^(365 / days) - 1, as a fraction.
    pub annualized_return: f64,
    /// Stdev of daily returns x sqrt(252) x 100.
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of days strictly below the prior peak.
    pub max_drawdown_duration: i32,
    pub final_value: f64,
    pub final_cash: f64,
    pub final_position_value: f64,
    pub total_invested: f64,
    /// Invested cash per share currently held.
    pub average_cost: f64,
    /// Benefit of cost averaging vs buying at the mean price, percent.
    pub cost_reduction_effect: f64,
    /// Executed / scheduled investments x 100.
    pub investment_efficiency: f64,
    pub executed_investments: u32,
    pub scheduled_investments: u32,
    pub price_range: PriceRangeSummary,
}

/// Outcome of the configured exit strategy measured against a pure-hold
/// run over the identical schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparison {
    pub benchmark_return: f64,
    pub return_difference: f64,
    pub exit_strategy_better: bool,
    pub is_same_strategy: bool,
}
