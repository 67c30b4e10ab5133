use super::{ExitContext, ExitDecision, ExitStrategy};

const FULL_EXIT_EPSILON: f64 = 1e-9;

/// Scales out of the position at ascending return levels. Each level
/// carries the cumulative fraction of the position that must be exited
/// once that level is crossed; crossing a level sells whatever part of
/// the current holding is still needed to reach its cumulative target.
/// Levels crossed on the same day collapse, in ascending order, into
/// one sale reaching the highest crossed target.
pub struct BatchExitStrategy {
    levels: Vec<f64>,
    ratios: Vec<f64>,
    next_level: usize,
    cumulative_exited: f64,
}

impl BatchExitStrategy {
    pub fn new(levels: Vec<f64>, ratios: Vec<f64>) -> Self {
        Self {
            levels,
            ratios,
            next_level: 0,
            cumulative_exited: 0.0,
        }
    }
}

impl ExitStrategy for BatchExitStrategy {
    fn kind(&self) -> &'static str {
        "batch_exit"
    }

    fn evaluate(&mut self, ctx: &ExitContext) -> Option<ExitDecision> {
        if self.is_terminal() || self.next_level >= self.levels.len() {
            return None;
        }

        let current_return = ctx.unrealized_return_pct();
        let mut crossed: Option<usize> = None;
        while self.next_level < self.levels.len() && current_return >= self.levels[self.next_level]
        {
            crossed = Some(self.next_level);
            self.next_level += 1;
        }
        let crossed = crossed?;

        let target_cumulative = self.ratios[crossed];
        let remaining = 1.0 - self.cumulative_exited;
        // remaining > 0 here: cumulative only reaches 1.0 together with
        // the terminal flag, which short-circuits above.
        let ratio = ((target_cumulative - self.cumulative_exited) / remaining).min(1.0);
        self.cumulative_exited = target_cumulative;

        Some(ExitDecision {
            ratio,
            reason: "batch_exit".to_string(),
        })
    }

    fn is_terminal(&self) -> bool {
        self.cumulative_exited >= 1.0 - FULL_EXIT_EPSILON
    }
}
