use thiserror::Error;

/// Failures the engine reports before or during a simulation run.
///
/// Both variants are raised before the daily loop starts; a run that
/// begins always completes. Recoverable conditions (an unaffordable
/// scheduled buy, a round with no trading day left) are recorded as
/// skip events on the result instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid price data: {0}")]
    Data(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
