use super::{ExitContext, ExitDecision, ExitStrategy};

const DAYS_PER_MONTH: f64 = 30.0;

/// Liquidates the full position on the first trading day at or after
/// the configured holding period. Months are counted as 30 days.
pub struct TimeLimitStrategy {
    limit_months: u32,
    executed: bool,
}

impl TimeLimitStrategy {
    pub fn new(limit_months: u32) -> Self {
        Self {
            limit_months,
            executed: false,
        }
    }
}

impl ExitStrategy for TimeLimitStrategy {
    fn kind(&self) -> &'static str {
        "time_limit"
    }

    fn evaluate(&mut self, ctx: &ExitContext) -> Option<ExitDecision> {
        if self.executed {
            return None;
        }
        let elapsed_days = (ctx.date - ctx.start_date).num_days();
        let months_passed = elapsed_days as f64 / DAYS_PER_MONTH;
        if months_passed < self.limit_months as f64 {
            return None;
        }
        self.executed = true;
        Some(ExitDecision {
            ratio: 1.0,
            reason: "time_limit".to_string(),
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
    use chrono::{Duration, NaiveDate};

    #[test]
    fn fires_on_first_day_at_or_after_the_limit() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let state = PortfolioState {
            cash: 0.0,
            shares_held: 50,
            total_invested: 500.0,
            total_shares_ever_bought: 50,
            rounds_executed: 1,
        };
        let mut strategy = TimeLimitStrategy::new(2);

        let early = ExitContext {
            date: start + Duration::days(59),
            close: 10.0,
            state: &state,
            start_date: start,
        };
        assert!(strategy.evaluate(&early).is_none());

        let due = ExitContext {
            date: start + Duration::days(60),
            close: 10.0,
            state: &state,
            start_date: start,
        };
        let decision = strategy.evaluate(&due).unwrap();
        assert_eq!(decision.ratio, 1.0);
        assert!(strategy.is_terminal());
    }
}
