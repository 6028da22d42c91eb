//! In-memory `LedgerStore` double with fault injection for service tests.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use chrono::NaiveDate;
use finledger_domain::{
    Category, DateWindow, Expense, Income, IncomeBranch, LedgerEntry, MonthlySummary, OwnerId,
    Period, RecurringTemplate, SavingGoal, SavingGoalTransaction,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::storage::{LedgerStore, StoreError, StoreResult};

#[derive(Default)]
pub struct Tables {
    pub incomes: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub categories: Vec<Category>,
    pub branches: Vec<IncomeBranch>,
    pub goals: Vec<SavingGoal>,
    pub contributions: Vec<SavingGoalTransaction>,
    pub templates: Vec<RecurringTemplate>,
    pub summaries: Vec<MonthlySummary>,
}

#[derive(Default)]
pub struct Faults {
    pub reads: bool,
    pub summary_insert: bool,
    pub template_reads: bool,
    pub watermarks: bool,
    pub goal_updates: bool,
    /// Entries generated from these templates are rejected on insert.
    pub entry_templates: HashSet<Uuid>,
}

#[derive(Default)]
pub struct FakeStore {
    pub tables: Mutex<Tables>,
    pub faults: Mutex<Faults>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap()
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.faults().reads {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(())
    }

    fn entry_rejected(&self, key: Option<Uuid>) -> bool {
        key.map(|id| self.faults().entry_templates.contains(&id))
            .unwrap_or(false)
    }
}

fn insert_rows<E: LedgerEntry + Clone>(
    rows: &mut Vec<E>,
    batch: Vec<E>,
    rejected: impl Fn(&E) -> bool,
) -> Vec<StoreResult<Uuid>> {
    batch
        .into_iter()
        .map(|entry| {
            if rejected(&entry) {
                return Err(StoreError::Unavailable("insert rejected".into()));
            }
            if let Some(key) = entry.recurrence() {
                if rows.iter().any(|row| row.recurrence() == Some(key)) {
                    return Err(StoreError::Conflict(format!(
                        "entry for template {} in {}",
                        key.template_id, key.period
                    )));
                }
            }
            let id = entry.id();
            rows.push(entry);
            Ok(id)
        })
        .collect()
}

impl LedgerStore for FakeStore {
    fn incomes_between(&self, owner: OwnerId, window: DateWindow) -> StoreResult<Vec<Income>> {
        self.check_reads()?;
        Ok(self
            .tables()
            .incomes
            .iter()
            .filter(|row| row.owner == owner && window.contains(row.date))
            .cloned()
            .collect())
    }

    fn expenses_between(&self, owner: OwnerId, window: DateWindow) -> StoreResult<Vec<Expense>> {
        self.check_reads()?;
        Ok(self
            .tables()
            .expenses
            .iter()
            .filter(|row| row.owner == owner && window.contains(row.date))
            .cloned()
            .collect())
    }

    fn insert_incomes(&self, incomes: Vec<Income>) -> Vec<StoreResult<Uuid>> {
        let rejected: HashSet<Uuid> = incomes
            .iter()
            .filter(|row| self.entry_rejected(row.recurrence.map(|key| key.template_id)))
            .map(|row| row.id)
            .collect();
        let mut tables = self.tables();
        insert_rows(&mut tables.incomes, incomes, |row| rejected.contains(&row.id))
    }

    fn insert_expenses(&self, expenses: Vec<Expense>) -> Vec<StoreResult<Uuid>> {
        let rejected: HashSet<Uuid> = expenses
            .iter()
            .filter(|row| self.entry_rejected(row.recurrence.map(|key| key.template_id)))
            .map(|row| row.id)
            .collect();
        let mut tables = self.tables();
        insert_rows(&mut tables.expenses, expenses, |row| rejected.contains(&row.id))
    }

    fn categories(&self, owner: OwnerId) -> StoreResult<Vec<Category>> {
        self.check_reads()?;
        Ok(self
            .tables()
            .categories
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect())
    }

    fn income_branches(&self, owner: OwnerId) -> StoreResult<Vec<IncomeBranch>> {
        self.check_reads()?;
        Ok(self
            .tables()
            .branches
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect())
    }

    fn saving_goals(&self, owner: OwnerId) -> StoreResult<Vec<SavingGoal>> {
        self.check_reads()?;
        Ok(self
            .tables()
            .goals
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect())
    }

    fn goals_matching(&self, owner: OwnerId, needle: &str) -> StoreResult<Vec<SavingGoal>> {
        Ok(self
            .saving_goals(owner)?
            .into_iter()
            .filter(|goal| goal.name_matches(&[needle]))
            .collect())
    }

    fn set_goal_amount(&self, goal_id: Uuid, current_amount: Decimal) -> StoreResult<()> {
        if self.faults().goal_updates {
            return Err(StoreError::Unavailable("goal updates disabled".into()));
        }
        let mut tables = self.tables();
        let goal = tables
            .goals
            .iter_mut()
            .find(|goal| goal.id == goal_id)
            .ok_or_else(|| StoreError::NotFound(goal_id.to_string()))?;
        goal.current_amount = current_amount;
        Ok(())
    }

    fn contributions_between(
        &self,
        goal_ids: &[Uuid],
        window: DateWindow,
    ) -> StoreResult<Vec<SavingGoalTransaction>> {
        self.check_reads()?;
        Ok(self
            .tables()
            .contributions
            .iter()
            .filter(|row| goal_ids.contains(&row.goal_id) && window.contains(row.date))
            .cloned()
            .collect())
    }

    fn insert_contribution(&self, contribution: SavingGoalTransaction) -> StoreResult<()> {
        self.tables().contributions.push(contribution);
        Ok(())
    }

    fn active_templates(&self, owner: OwnerId) -> StoreResult<Vec<RecurringTemplate>> {
        if self.faults().template_reads {
            return Err(StoreError::Unavailable("template reads disabled".into()));
        }
        Ok(self
            .tables()
            .templates
            .iter()
            .filter(|row| row.owner == owner && row.active)
            .cloned()
            .collect())
    }

    fn set_template_watermark(&self, template_id: Uuid, processed: NaiveDate) -> StoreResult<()> {
        if self.faults().watermarks {
            return Err(StoreError::Unavailable("watermark updates disabled".into()));
        }
        let mut tables = self.tables();
        let template = tables
            .templates
            .iter_mut()
            .find(|row| row.id == template_id)
            .ok_or_else(|| StoreError::NotFound(template_id.to_string()))?;
        template.last_processed = Some(processed);
        Ok(())
    }

    // Not affected by the `reads` fault so closures reach aggregation.
    fn summary_exists(&self, owner: OwnerId, period: Period) -> StoreResult<bool> {
        Ok(self
            .tables()
            .summaries
            .iter()
            .any(|row| row.owner == owner && row.period == period))
    }

    fn insert_summary(&self, summary: MonthlySummary) -> StoreResult<()> {
        if self.faults().summary_insert {
            return Err(StoreError::Unavailable("summary insert disabled".into()));
        }
        let mut tables = self.tables();
        if tables
            .summaries
            .iter()
            .any(|row| row.owner == summary.owner && row.period == summary.period)
        {
            return Err(StoreError::Conflict(format!("summary for {}", summary.period)));
        }
        tables.summaries.push(summary);
        Ok(())
    }

    fn summaries(&self, owner: OwnerId) -> StoreResult<Vec<MonthlySummary>> {
        self.check_reads()?;
        Ok(self
            .tables()
            .summaries
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect())
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn period(month: u32, year: i32) -> Period {
    Period::new(month, year).unwrap()
}
