use crate::config::InvestmentConfig;
use crate::models::{SkipReason, SkippedInvestment};
use chrono::{Duration, NaiveDate};

/// One intended investment round and the trading day it resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledRound {
    pub round: u32,
    pub intended_date: NaiveDate,
    /// `None` when roll-forward ran out of trading days in range.
    pub execution_date: Option<NaiveDate>,
}

/// The resolved buy calendar for one run. Built once before the loop;
/// deterministic for identical inputs.
#[derive(Debug, Clone)]
pub struct InvestmentSchedule {
    rounds: Vec<ScheduledRound>,
}

impl InvestmentSchedule {
    /// Derives intended dates from `start_date` stepping by
    /// `frequency_days` until past `end_date`, then resolves each to
    /// the next available trading day. Execution dates are strictly
    /// increasing: a round whose roll-forward would collide with an
    /// earlier round advances to the next later trading day.
    pub fn build(config: &InvestmentConfig, trading_days: &[NaiveDate]) -> Self {
        let mut rounds = Vec::new();
        let mut round = 0u32;
        let mut last_execution: Option<NaiveDate> = None;
        let mut intended = config.start_date;

        while intended <= config.end_date {
            round += 1;
            let floor = match last_execution {
                Some(prev) => intended.max(prev + Duration::days(1)),
                None => intended,
            };
            let execution = next_trading_day(trading_days, floor)
                .filter(|date| *date <= config.end_date);
            if let Some(date) = execution {
                last_execution = Some(date);
            }
            rounds.push(ScheduledRound {
                round,
                intended_date: intended,
                execution_date: execution,
            });
            intended += Duration::days(config.frequency_days as i64);
        }

        Self { rounds }
    }

    pub fn rounds(&self) -> &[ScheduledRound] {
        &self.rounds
    }

    pub fn scheduled_count(&self) -> usize {
        self.rounds.len()
    }

    /// The round scheduled to execute on the given trading day, if any.
    pub fn round_on(&self, date: NaiveDate) -> Option<&ScheduledRound> {
        self.rounds
            .iter()
            .find(|r| r.execution_date == Some(date))
    }

    /// Skip events for rounds that never found a trading day.
    pub fn unresolved_skips(&self) -> Vec<SkippedInvestment> {
        self.rounds
            .iter()
            .filter(|r| r.execution_date.is_none())
            .map(|r| SkippedInvestment {
                date: r.intended_date,
                round: r.round,
                reason: SkipReason::NoTradingDay,
            })
            .collect()
    }
}

/// First trading day at or after `from`, by binary search over the
/// ascending calendar.
fn next_trading_day(trading_days: &[NaiveDate], from: NaiveDate) -> Option<NaiveDate> {
    let idx = trading_days.partition_point(|d| *d < from);
    trading_days.get(idx).copied()
}
