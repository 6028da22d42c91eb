use std::io;

use chrono::NaiveDate;
use finledger_domain::{
    Category, DateWindow, Expense, Income, IncomeBranch, MonthlySummary, OwnerId, Period,
    RecurringTemplate, SavingGoal, SavingGoalTransaction,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The record failed validation and was not written.
    #[error("Invalid record: {0}")]
    Invalid(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Datastore unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Owner-scoped relational datastore the engine reads from and writes to.
///
/// Implementations must enforce two uniqueness constraints:
/// one [`MonthlySummary`] per `(owner, period)`, and one income/expense row per
/// [`finledger_domain::RecurrenceKey`]. Both are reported as [`StoreError::Conflict`].
pub trait LedgerStore: Send + Sync {
    /// Incomes owned by `owner` dated within `window` (inclusive).
    fn incomes_between(&self, owner: OwnerId, window: DateWindow) -> StoreResult<Vec<Income>>;
    /// Expenses owned by `owner` dated within `window` (inclusive).
    fn expenses_between(&self, owner: OwnerId, window: DateWindow) -> StoreResult<Vec<Expense>>;
    /// Batch insert; one outcome per row, in input order. Failed rows do not affect others.
    fn insert_incomes(&self, incomes: Vec<Income>) -> Vec<StoreResult<Uuid>>;
    /// Batch insert; one outcome per row, in input order. Failed rows do not affect others.
    fn insert_expenses(&self, expenses: Vec<Expense>) -> Vec<StoreResult<Uuid>>;

    fn categories(&self, owner: OwnerId) -> StoreResult<Vec<Category>>;
    fn income_branches(&self, owner: OwnerId) -> StoreResult<Vec<IncomeBranch>>;

    fn saving_goals(&self, owner: OwnerId) -> StoreResult<Vec<SavingGoal>>;
    /// Goals owned by `owner` whose name contains `needle`, case-insensitively.
    fn goals_matching(&self, owner: OwnerId, needle: &str) -> StoreResult<Vec<SavingGoal>>;
    fn set_goal_amount(&self, goal_id: Uuid, current_amount: Decimal) -> StoreResult<()>;
    /// Contributions against any of `goal_ids` dated within `window` (inclusive).
    fn contributions_between(
        &self,
        goal_ids: &[Uuid],
        window: DateWindow,
    ) -> StoreResult<Vec<SavingGoalTransaction>>;
    fn insert_contribution(&self, contribution: SavingGoalTransaction) -> StoreResult<()>;

    fn active_templates(&self, owner: OwnerId) -> StoreResult<Vec<RecurringTemplate>>;
    fn set_template_watermark(&self, template_id: Uuid, processed: NaiveDate) -> StoreResult<()>;

    fn summary_exists(&self, owner: OwnerId, period: Period) -> StoreResult<bool>;
    /// Insert-only; a second summary for the same `(owner, period)` is a conflict.
    fn insert_summary(&self, summary: MonthlySummary) -> StoreResult<()>;
    fn summaries(&self, owner: OwnerId) -> StoreResult<Vec<MonthlySummary>>;
}
