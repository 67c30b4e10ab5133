#[path = "commands/backtest.rs"]
pub mod backtest;

#[path = "commands/batch.rs"]
pub mod batch;

#[path = "commands/snapshot.rs"]
pub mod snapshot;
