use super::{ExitContext, ExitDecision, ExitStrategy};

/// Liquidates the full position the first time the unrealized return
/// reaches the target, then goes inert.
pub struct ProfitTargetStrategy {
    target_pct: f64,
    executed: bool,
}

impl ProfitTargetStrategy {
    pub fn new(target_pct: f64) -> Self {
        Self {
            target_pct,
            executed: false,
        }
    }
}

impl ExitStrategy for ProfitTargetStrategy {
    fn kind(&self) -> &'static str {
        "profit_target"
    }

    fn evaluate(&mut self, ctx: &ExitContext) -> Option<ExitDecision> {
        if self.executed {
            return None;
        }
        if ctx.unrealized_return_pct() < self.target_pct {
            return None;
        }
        self.executed = true;
        Some(ExitDecision {
            ratio: 1.0,
            reason: "profit_target".to_string(),
        })
    }

    fn is_terminal(&self) -> bool {
        self.executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortfolioState;
    use chrono::NaiveDate;

    fn state(shares: i64, invested: f64) -> PortfolioState {
        PortfolioState {
            cash: 0.0,
            shares_held: shares,
            total_invested: invested,
            total_shares_ever_bought: shares,
            rounds_executed: 1,
        }
    }

    fn ctx<'a>(state: &'a PortfolioState, close: f64) -> ExitContext<'a> {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ExitContext {
            date: day,
            close,
            state,
            start_date: day,
        }
    }

    #[test]
    fn fires_once_at_target_then_stays_inert() {
        let mut strategy = ProfitTargetStrategy::new(20.0);
        let holding = state(100, 1000.0);

        assert!(strategy.evaluate(&ctx(&holding, 11.0)).is_none());
        assert!(!strategy.is_terminal());

        let decision = strategy.evaluate(&ctx(&holding, 12.0)).unwrap();
        assert_eq!(decision.ratio, 1.0);
        assert!(strategy.is_terminal());

        assert!(strategy.evaluate(&ctx(&holding, 15.0)).is_none());
    }
}
