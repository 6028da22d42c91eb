use finledger_domain::{AmountOverflow, Period, PeriodError};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StoreError;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] PeriodError),
    #[error("Amounts could not be totalled: {0}")]
    AmountOverflow(#[from] AmountOverflow),
    #[error("Period {0} is already closed")]
    AlreadyClosed(Period),
    #[error("Failed to persist summary for {period}: {source}")]
    SummaryPersistFailure {
        period: Period,
        #[source]
        source: StoreError,
    },
    #[error("Failed to read ledger data for {period}: {source}")]
    AggregationReadFailure {
        period: Period,
        #[source]
        source: StoreError,
    },
    #[error("{failed} of {attempted} recurring templates failed to materialize for {target}")]
    PartialRecurringFailure {
        target: Period,
        failed: usize,
        attempted: usize,
    },
    #[error("Saving goal not found: {0}")]
    GoalNotFound(Uuid),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// `AlreadyClosed` is a no-op signal rather than a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, CoreError::AlreadyClosed(_))
    }
}
