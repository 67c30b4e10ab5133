use crate::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transaction cost model applied to every executed buy and sell.
///
/// All rates default to zero so a plain configuration simulates a
/// frictionless account. Commission is charged on both sides with a
/// per-trade minimum, stamp duty on sells only, transfer fee on both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostModel {
    pub commission_rate: f64,
    pub min_commission: f64,
    pub stamp_duty_rate: f64,
    pub transfer_fee_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            commission_rate: 0.0,
            min_commission: 0.0,
            stamp_duty_rate: 0.0,
            transfer_fee_rate: 0.0,
        }
    }
}

impl CostModel {
    fn commission(&self, amount: f64) -> f64 {
        (amount * self.commission_rate).max(self.min_commission)
    }

    pub fn buy_fees(&self, amount: f64) -> f64 {
        self.commission(amount) + amount * self.transfer_fee_rate
    }

    pub fn sell_fees(&self, amount: f64) -> f64 {
        self.commission(amount)
            + amount * self.stamp_duty_rate
            + amount * self.transfer_fee_rate
    }

    fn validate(&self) -> EngineResult<()> {
        let rates = [
            ("commissionRate", self.commission_rate),
            ("minCommission", self.min_commission),
            ("stampDutyRate", self.stamp_duty_rate),
            ("transferFeeRate", self.transfer_fee_rate),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Config(format!(
                    "{} must be a non-negative number (value: {})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Exit rule selected for a run, with its parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitStrategyKind {
    /// Never sells; the position is carried to the end of the range.
    #[default]
    Hold,
    /// Liquidates the full position once the unrealized return reaches
    /// the target, then goes inert.
    #[serde(rename_all = "camelCase")]
    ProfitTarget { profit_target_pct: f64 },
    /// Liquidates the full position on the first trading day at or
    /// after the configured number of 30-day months.
    #[serde(rename_all = "camelCase")]
    TimeLimit { time_limit_months: u32 },
    /// Scales out at ascending return levels, each paired with the
    /// cumulative fraction of the position that must be exited once
    /// that level is crossed.
    #[serde(rename_all = "camelCase")]
    BatchExit { levels: Vec<f64>, ratios: Vec<f64> },
}

impl ExitStrategyKind {
    pub fn label(&self) -> &'static str {
        match self {
            ExitStrategyKind::Hold => "hold",
            ExitStrategyKind::ProfitTarget { .. } => "profit_target",
            ExitStrategyKind::TimeLimit { .. } => "time_limit",
            ExitStrategyKind::BatchExit { .. } => "batch_exit",
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, ExitStrategyKind::Hold)
    }

    fn validate(&self) -> EngineResult<()> {
        match self {
            ExitStrategyKind::Hold => Ok(()),
            ExitStrategyKind::ProfitTarget { profit_target_pct } => {
                if !profit_target_pct.is_finite() || *profit_target_pct <= 0.0 {
                    return Err(EngineError::Config(format!(
                        "profitTargetPct must be positive (value: {})",
                        profit_target_pct
                    )));
                }
                Ok(())
            }
            ExitStrategyKind::TimeLimit { time_limit_months } => {
                if *time_limit_months == 0 {
                    return Err(EngineError::Config(
                        "timeLimitMonths must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
            ExitStrategyKind::BatchExit { levels, ratios } => {
                validate_batch_exit(levels, ratios)
            }
        }
    }
}

fn validate_batch_exit(levels: &[f64], ratios: &[f64]) -> EngineResult<()> {
    if levels.is_empty() {
        return Err(EngineError::Config(
            "batch exit requires at least one level".to_string(),
        ));
    }
    if levels.len() != ratios.len() {
        return Err(EngineError::Config(format!(
            "batch exit levels ({}) and ratios ({}) must have the same length",
            levels.len(),
            ratios.len()
        )));
    }
    for window in levels.windows(2) {
        if window[1] <= window[0] {
            return Err(EngineError::Config(format!(
                "batch exit levels must be strictly increasing ({} after {})",
                window[1], window[0]
            )));
        }
    }
    for level in levels {
        if !level.is_finite() || *level <= 0.0 {
            return Err(EngineError::Config(format!(
                "batch exit levels must be positive (value: {})",
                level
            )));
        }
    }
    for ratio in ratios {
        if !ratio.is_finite() || *ratio <= 0.0 || *ratio > 1.0 {
            return Err(EngineError::Config(format!(
                "batch exit ratios must be within (0, 1] (value: {})",
                ratio
            )));
        }
    }
    for window in ratios.windows(2) {
        if window[1] <= window[0] {
            return Err(EngineError::Config(format!(
                "batch exit ratios must be strictly increasing ({} after {})",
                window[1], window[0]
            )));
        }
    }
    Ok(())
}

/// Immutable configuration of one backtest request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentConfig {
    pub symbol: String,
    pub investment_amount: f64,
    pub frequency_days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    #[serde(default)]
    pub exit_strategy: ExitStrategyKind,
    #[serde(default)]
    pub costs: CostModel,
    /// Annual risk-free rate used by the Sharpe ratio, as a fraction.
    #[serde(default)]
    pub risk_free_rate: f64,
}

impl InvestmentConfig {
    /// Checks every constraint the engine relies on. Called by
    /// `simulate` before the loop starts; callers may also invoke it
    /// directly to fail fast on user input.
    pub fn validate(&self) -> EngineResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::Config("symbol must not be empty".to_string()));
        }
        if !self.investment_amount.is_finite() || self.investment_amount <= 0.0 {
            return Err(EngineError::Config(format!(
                "investmentAmount must be positive (value: {})",
                self.investment_amount
            )));
        }
        if self.frequency_days == 0 {
            return Err(EngineError::Config(
                "frequencyDays must be greater than zero".to_string(),
            ));
        }
        if self.end_date <= self.start_date {
            return Err(EngineError::Config(format!(
                "endDate ({}) must be after startDate ({})",
                self.end_date, self.start_date
            )));
        }
        if !self.initial_cash.is_finite() || self.initial_cash < self.investment_amount {
            return Err(EngineError::Config(format!(
                "initialCash ({}) must cover at least one investment of {}",
                self.initial_cash, self.investment_amount
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(EngineError::Config(format!(
                "riskFreeRate must be finite (value: {})",
                self.risk_free_rate
            )));
        }
        self.costs.validate()?;
        self.exit_strategy.validate()
    }

    /// The same request with the exit strategy replaced by pure hold,
    /// used for the benchmark comparison run.
    pub fn as_hold(&self) -> Self {
        Self {
            exit_strategy: ExitStrategyKind::Hold,
            ..self.clone()
        }
    }
}
