use finledger_config::ConfigError;
use finledger_core::{CoreError, StoreError};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced by [`crate::FinanceEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session carries no owner; nothing was read or written.
    #[error("No authenticated owner for this session")]
    Unauthenticated,
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Closing an already-closed period is a no-op signal.
    pub fn is_benign(&self) -> bool {
        matches!(self, EngineError::Core(err) if err.is_benign())
    }

    /// Text safe to show an end user. Closure failures collapse into one retryable message.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Unauthenticated => "Please sign in to continue.".into(),
            EngineError::Core(CoreError::AlreadyClosed(period)) => {
                format!("Period {period} is already closed.")
            }
            EngineError::Core(CoreError::InvalidPeriod(err)) => format!("Invalid period: {err}."),
            EngineError::Core(CoreError::GoalNotFound(_)) => "Saving goal not found.".into(),
            EngineError::Core(CoreError::Validation(message))
            | EngineError::Core(CoreError::Store(StoreError::Invalid(message)))
            | EngineError::Store(StoreError::Invalid(message)) => message.clone(),
            EngineError::Core(CoreError::AmountOverflow(_)) => {
                "Amounts are too large to total.".into()
            }
            EngineError::Core(
                CoreError::SummaryPersistFailure { .. } | CoreError::AggregationReadFailure { .. },
            ) => "Could not close the period. Please try again.".into(),
            EngineError::Core(CoreError::PartialRecurringFailure { .. }) => {
                "Some recurring entries could not be generated. Please try again.".into()
            }
            EngineError::Core(CoreError::Store(_)) | EngineError::Store(_) => {
                "The ledger is temporarily unavailable. Please try again.".into()
            }
            EngineError::Config(err) => format!("Configuration error: {err}."),
        }
    }
}
