use crate::config::ExitStrategyKind;
use crate::models::PortfolioState;
use chrono::NaiveDate;

/// Everything an exit rule may look at on one trading day.
pub struct ExitContext<'a> {
    pub date: NaiveDate,
    pub close: f64,
    pub state: &'a PortfolioState,
    pub start_date: NaiveDate,
}

impl ExitContext<'_> {
    /// Unrealized return of the position in percent; 0 while nothing
    /// has been invested.
    pub fn unrealized_return_pct(&self) -> f64 {
        self.state.unrealized_return_pct(self.close).unwrap_or(0.0)
    }
}

/// A liquidation order for the current day.
pub struct ExitDecision {
    /// Fraction of the currently held shares to sell, in (0, 1].
    pub ratio: f64,
    /// Exit rule that fired, recorded on the sell.
    pub reason: String,
}

/// A pluggable exit rule. The simulation loop consults the active rule
/// once per trading day while shares are held; a terminal rule is never
/// consulted again and suppresses all later scheduled buys.
pub trait ExitStrategy {
    fn kind(&self) -> &'static str;
    fn evaluate(&mut self, ctx: &ExitContext) -> Option<ExitDecision>;
    /// True once the rule has liquidated everything it ever will.
    fn is_terminal(&self) -> bool;
}

#[path = "exits/hold.rs"]
pub mod hold;

pub use hold::HoldStrategy;

#[path = "exits/profit_target.rs"]
pub mod profit_target;

pub use profit_target::ProfitTargetStrategy;

#[path = "exits/time_limit.rs"]
pub mod time_limit;

pub use time_limit::TimeLimitStrategy;

#[path = "exits/batch.rs"]
pub mod batch;

pub use batch::BatchExitStrategy;

pub fn create_exit_strategy(kind: &ExitStrategyKind) -> Box<dyn ExitStrategy + Send> {
    match kind {
        ExitStrategyKind::Hold => Box::new(HoldStrategy::new()),
        ExitStrategyKind::ProfitTarget { profit_target_pct } => {
            Box::new(ProfitTargetStrategy::new(*profit_target_pct))
        }
        ExitStrategyKind::TimeLimit { time_limit_months } => {
            Box::new(TimeLimitStrategy::new(*time_limit_months))
        }
        ExitStrategyKind::BatchExit { levels, ratios } => {
            Box::new(BatchExitStrategy::new(levels.clone(), ratios.clone()))
        }
    }
}
