use super::{ExitContext, ExitDecision, ExitStrategy};

/// Pure buy-and-hold: accumulates on schedule and never sells.
pub struct HoldStrategy;

impl HoldStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HoldStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitStrategy for HoldStrategy {
    fn kind(&self) -> &'static str {
        "hold"
    }

    fn evaluate(&mut self, _ctx: &ExitContext) -> Option<ExitDecision> {
        None
    }

    fn is_terminal(&self) -> bool {
        false
    }
}
