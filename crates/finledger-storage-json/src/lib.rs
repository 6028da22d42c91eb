//! finledger-storage-json
//!
//! A [`LedgerStore`] that keeps owner-scoped tables in memory and writes the whole
//! dataset to a single JSON file after every mutation.

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::NaiveDate;
use fd_lock::RwLock;
use finledger_core::{LedgerStore, StoreError, StoreResult};
use finledger_domain::{
    Category, DateWindow, Expense, Identifiable, Income, IncomeBranch, LedgerEntry,
    MonthlySummary, Owned, OwnerId, Period, RecurringTemplate, SavingGoal, SavingGoalTransaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const TMP_SUFFIX: &str = "tmp";
const LOCK_SUFFIX: &str = "lock";
pub const SCHEMA_VERSION: u32 = 1;

/// Everything persisted in the data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub income_branches: Vec<IncomeBranch>,
    #[serde(default)]
    pub saving_goals: Vec<SavingGoal>,
    #[serde(default)]
    pub saving_goal_transactions: Vec<SavingGoalTransaction>,
    #[serde(default)]
    pub recurring_transactions: Vec<RecurringTemplate>,
    #[serde(default)]
    pub monthly_summaries: Vec<MonthlySummary>,
}

/// JSON-file datastore.
///
/// Every write holds an exclusive lock on a sibling `.lock` file, reloads the data file,
/// applies the change (uniqueness checks included) to the reloaded tables and persists
/// them atomically (temporary file then rename) before making them visible. Handles in
/// other processes therefore never overwrite each other's rows, and a failed write
/// leaves both the file and the in-memory state untouched. Reads are served from the
/// tables as of the last open or write. Without a path the store is purely in memory.
#[derive(Debug)]
pub struct JsonLedgerStore {
    path: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl JsonLedgerStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            load_tables(&path)?
        } else {
            Tables {
                schema_version: SCHEMA_VERSION,
                ..Tables::default()
            }
        };
        debug!(path = %path.display(), "opened ledger data file");
        Ok(Self {
            path: Some(path),
            tables: Mutex::new(tables),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: Mutex::new(Tables {
                schema_version: SCHEMA_VERSION,
                ..Tables::default()
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A copy of the current tables.
    pub fn snapshot(&self) -> Tables {
        self.read().clone()
    }

    pub fn add_category(&self, category: Category) -> StoreResult<Uuid> {
        let id = category.id;
        self.commit(|tables| tables.categories.push(category))?;
        Ok(id)
    }

    pub fn add_income_branch(&self, branch: IncomeBranch) -> StoreResult<Uuid> {
        let id = branch.id;
        self.commit(|tables| tables.income_branches.push(branch))?;
        Ok(id)
    }

    pub fn add_goal(&self, goal: SavingGoal) -> StoreResult<Uuid> {
        non_negative("goal amount", goal.goal_amount)?;
        non_negative("goal current amount", goal.current_amount)?;
        let id = goal.id;
        self.commit(|tables| tables.saving_goals.push(goal))?;
        Ok(id)
    }

    pub fn add_template(&self, template: RecurringTemplate) -> StoreResult<Uuid> {
        non_negative("template amount", template.amount)?;
        let id = template.id;
        self.commit(|tables| tables.recurring_transactions.push(template))?;
        Ok(id)
    }

    /// Soft-deletes a template; it keeps its watermark but is never materialized again.
    pub fn deactivate_template(&self, template_id: Uuid) -> StoreResult<()> {
        self.commit(|tables| {
            tables
                .recurring_transactions
                .iter_mut()
                .find(|template| template.id == template_id)
                .map(RecurringTemplate::deactivate)
                .ok_or_else(|| StoreError::NotFound(format!("template {template_id}")))
        })?
    }

    pub fn add_income(&self, income: Income) -> StoreResult<Uuid> {
        single(self.insert_incomes(vec![income]))
    }

    pub fn add_expense(&self, expense: Expense) -> StoreResult<Uuid> {
        single(self.insert_expenses(vec![expense]))
    }

    pub fn incomes(&self, owner: OwnerId) -> Vec<Income> {
        owned(&self.read().incomes, owner)
    }

    pub fn expenses(&self, owner: OwnerId) -> Vec<Expense> {
        owned(&self.read().expenses, owner)
    }

    pub fn templates(&self, owner: OwnerId) -> Vec<RecurringTemplate> {
        self.read()
            .recurring_transactions
            .iter()
            .filter(|template| template.owner == owner)
            .cloned()
            .collect()
    }

    pub fn contributions(&self, goal_id: Uuid) -> Vec<SavingGoalTransaction> {
        self.read()
            .saving_goal_transactions
            .iter()
            .filter(|row| row.goal_id == goal_id)
            .cloned()
            .collect()
    }

    fn read(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-reads the data file so writes from other handles become visible.
    pub fn refresh(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if path.exists() {
            *self.read() = load_tables(path)?;
        }
        Ok(())
    }

    /// Applies `change` to a copy, persists it, then swaps it in.
    ///
    /// File-backed stores apply the change to the tables on disk, read under the file
    /// lock, so checks made inside `change` see every handle's committed rows.
    fn commit<R>(&self, change: impl FnOnce(&mut Tables) -> R) -> StoreResult<R> {
        let mut current = self.read();
        let Some(path) = &self.path else {
            let mut next = current.clone();
            let result = change(&mut next);
            *current = next;
            return Ok(result);
        };

        let mut lock = RwLock::new(open_lock_file(path)?);
        let _held = lock.write()?;
        let mut next = if path.exists() {
            load_tables(path)?
        } else {
            current.clone()
        };
        let result = change(&mut next);
        save_tables(&next, path)?;
        *current = next;
        Ok(result)
    }

    fn insert_batch<E, F>(&self, batch: Vec<E>, table: F) -> Vec<StoreResult<Uuid>>
    where
        E: LedgerEntry,
        F: FnOnce(&mut Tables) -> &mut Vec<E>,
    {
        let size = batch.len();
        let committed = self.commit(|tables| {
            let rows = table(tables);
            batch
                .into_iter()
                .map(|entry| {
                    non_negative("entry amount", entry.amount())?;
                    if let Some(key) = entry.recurrence() {
                        if rows.iter().any(|row| row.recurrence() == Some(key)) {
                            return Err(StoreError::Conflict(format!(
                                "template {} already materialized for {}",
                                key.template_id, key.period
                            )));
                        }
                    }
                    let id = entry.id();
                    rows.push(entry);
                    Ok(id)
                })
                .collect::<Vec<_>>()
        });
        match committed {
            Ok(outcomes) => outcomes,
            Err(err) => {
                let reason = err.to_string();
                (0..size)
                    .map(|_| Err(StoreError::Unavailable(reason.clone())))
                    .collect()
            }
        }
    }
}

impl LedgerStore for JsonLedgerStore {
    fn incomes_between(&self, owner: OwnerId, window: DateWindow) -> StoreResult<Vec<Income>> {
        Ok(within(&self.read().incomes, owner, window))
    }

    fn expenses_between(&self, owner: OwnerId, window: DateWindow) -> StoreResult<Vec<Expense>> {
        Ok(within(&self.read().expenses, owner, window))
    }

    fn insert_incomes(&self, incomes: Vec<Income>) -> Vec<StoreResult<Uuid>> {
        self.insert_batch(incomes, |tables| &mut tables.incomes)
    }

    fn insert_expenses(&self, expenses: Vec<Expense>) -> Vec<StoreResult<Uuid>> {
        self.insert_batch(expenses, |tables| &mut tables.expenses)
    }

    fn categories(&self, owner: OwnerId) -> StoreResult<Vec<Category>> {
        Ok(self
            .read()
            .categories
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect())
    }

    fn income_branches(&self, owner: OwnerId) -> StoreResult<Vec<IncomeBranch>> {
        Ok(self
            .read()
            .income_branches
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect())
    }

    fn saving_goals(&self, owner: OwnerId) -> StoreResult<Vec<SavingGoal>> {
        Ok(self
            .read()
            .saving_goals
            .iter()
            .filter(|goal| goal.owner == owner)
            .cloned()
            .collect())
    }

    fn goals_matching(&self, owner: OwnerId, needle: &str) -> StoreResult<Vec<SavingGoal>> {
        Ok(self
            .read()
            .saving_goals
            .iter()
            .filter(|goal| goal.owner == owner && goal.name_matches(&[needle]))
            .cloned()
            .collect())
    }

    fn set_goal_amount(&self, goal_id: Uuid, current_amount: Decimal) -> StoreResult<()> {
        non_negative("goal current amount", current_amount)?;
        self.commit(|tables| {
            let goal = tables
                .saving_goals
                .iter_mut()
                .find(|goal| goal.id == goal_id)
                .ok_or_else(|| StoreError::NotFound(format!("saving goal {goal_id}")))?;
            goal.current_amount = current_amount;
            Ok(())
        })?
    }

    fn contributions_between(
        &self,
        goal_ids: &[Uuid],
        window: DateWindow,
    ) -> StoreResult<Vec<SavingGoalTransaction>> {
        if goal_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .read()
            .saving_goal_transactions
            .iter()
            .filter(|row| goal_ids.contains(&row.goal_id) && window.contains(row.date))
            .cloned()
            .collect())
    }

    fn insert_contribution(&self, contribution: SavingGoalTransaction) -> StoreResult<()> {
        non_negative("contribution amount", contribution.amount)?;
        self.commit(|tables| {
            if !tables.saving_goals.iter().any(|goal| goal.id == contribution.goal_id) {
                return Err(StoreError::NotFound(format!(
                    "saving goal {}",
                    contribution.goal_id
                )));
            }
            tables.saving_goal_transactions.push(contribution);
            Ok(())
        })?
    }

    fn active_templates(&self, owner: OwnerId) -> StoreResult<Vec<RecurringTemplate>> {
        Ok(self
            .read()
            .recurring_transactions
            .iter()
            .filter(|template| template.owner == owner && template.active)
            .cloned()
            .collect())
    }

    fn set_template_watermark(&self, template_id: Uuid, processed: NaiveDate) -> StoreResult<()> {
        self.commit(|tables| {
            let template = tables
                .recurring_transactions
                .iter_mut()
                .find(|template| template.id == template_id)
                .ok_or_else(|| StoreError::NotFound(format!("template {template_id}")))?;
            // The watermark only moves forward.
            if template.last_processed.map_or(true, |last| last < processed) {
                template.last_processed = Some(processed);
            }
            Ok(())
        })?
    }

    fn summary_exists(&self, owner: OwnerId, period: Period) -> StoreResult<bool> {
        Ok(self
            .read()
            .monthly_summaries
            .iter()
            .any(|row| row.owner == owner && row.period == period))
    }

    fn insert_summary(&self, summary: MonthlySummary) -> StoreResult<()> {
        self.commit(|tables| {
            if tables
                .monthly_summaries
                .iter()
                .any(|row| row.owner == summary.owner && row.period == summary.period)
            {
                return Err(StoreError::Conflict(format!(
                    "summary for {} already exists",
                    summary.period
                )));
            }
            tables.monthly_summaries.push(summary);
            Ok(())
        })?
    }

    fn summaries(&self, owner: OwnerId) -> StoreResult<Vec<MonthlySummary>> {
        let mut rows: Vec<MonthlySummary> = self
            .read()
            .monthly_summaries
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.period);
        Ok(rows)
    }
}

fn owned<E: LedgerEntry + Clone>(rows: &[E], owner: OwnerId) -> Vec<E> {
    rows.iter().filter(|row| row.owner() == owner).cloned().collect()
}

fn within<E: LedgerEntry + Clone>(rows: &[E], owner: OwnerId, window: DateWindow) -> Vec<E> {
    rows.iter()
        .filter(|row| row.owner() == owner && window.contains(row.date()))
        .cloned()
        .collect()
}

fn non_negative(field: &str, amount: Decimal) -> StoreResult<()> {
    if amount < Decimal::ZERO {
        return Err(StoreError::Invalid(format!(
            "{field} must not be negative, got {amount}"
        )));
    }
    Ok(())
}

fn single(mut outcomes: Vec<StoreResult<Uuid>>) -> StoreResult<Uuid> {
    outcomes
        .pop()
        .unwrap_or_else(|| Err(StoreError::Unavailable("empty insert".into())))
}

/// Reads a data file written by [`save_tables`].
pub fn load_tables(path: &Path) -> StoreResult<Tables> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| StoreError::Serde(err.to_string()))
}

/// Writes `tables` to `path` via a temporary sibling file and a rename.
pub fn save_tables(tables: &Tables, path: &Path) -> StoreResult<()> {
    let data =
        serde_json::to_string_pretty(tables).map_err(|err| StoreError::Serde(err.to_string()))?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    sibling(path, TMP_SUFFIX)
}

fn lock_path(path: &Path) -> PathBuf {
    sibling(path, LOCK_SUFFIX)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{suffix}"),
        None => suffix.to_string(),
    };
    sibling.set_extension(ext);
    sibling
}

fn open_lock_file(path: &Path) -> StoreResult<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    Ok(file)
}

fn write_atomic(path: &Path, data: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
