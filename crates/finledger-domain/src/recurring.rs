//! Recurring income/expense templates and their processing watermark.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    calendar,
    common::*,
    entry::{EntryKind, Expense, Income, RecurrenceKey},
    period::Period,
};

/// A template materialized once per period into a concrete ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringTemplate {
    pub id: Uuid,
    pub owner: OwnerId,
    pub kind: EntryKind,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Preferred day of month (1..=31); missing or zero means the 1st.
    #[serde(default)]
    pub day_of_month: Option<u32>,
    /// Category for expense templates, income branch for income templates.
    #[serde(default)]
    pub group_id: Option<Uuid>,
    pub active: bool,
    /// Date of the most recently materialized entry.
    #[serde(default)]
    pub last_processed: Option<NaiveDate>,
}

impl RecurringTemplate {
    pub fn new(owner: OwnerId, kind: EntryKind, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind,
            amount,
            description: None,
            day_of_month: None,
            group_id: None,
            active: true,
            last_processed: None,
        }
    }

    pub fn with_day(mut self, day_of_month: u32) -> Self {
        self.day_of_month = Some(day_of_month);
        self
    }

    pub fn with_group(mut self, group_id: Uuid) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// `true` when the watermark already falls within `period`.
    pub fn processed_in(&self, period: Period) -> bool {
        self.last_processed
            .map(|date| period.contains(date))
            .unwrap_or(false)
    }

    /// The date this template lands on in `period`, clamped for short months.
    pub fn due_date(&self, period: Period) -> NaiveDate {
        let day = calendar::clamp_day_of_month(self.day_of_month.unwrap_or(1), period);
        period.date_on(day)
    }

    pub fn recurrence_key(&self, period: Period) -> RecurrenceKey {
        RecurrenceKey {
            template_id: self.id,
            period,
        }
    }

    /// Builds the income entry for `period`. Only meaningful for income templates.
    pub fn income_for(&self, period: Period) -> Income {
        Income {
            id: Uuid::new_v4(),
            owner: self.owner,
            amount: self.amount,
            date: self.due_date(period),
            description: self.description.clone(),
            branch_id: self.group_id,
            is_recurring: true,
            recurrence: Some(self.recurrence_key(period)),
        }
    }

    /// Builds the expense entry for `period`. Only meaningful for expense templates.
    pub fn expense_for(&self, period: Period) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            owner: self.owner,
            amount: self.amount,
            date: self.due_date(period),
            description: self.description.clone(),
            category_id: self.group_id,
            is_recurring: true,
            recurrence: Some(self.recurrence_key(period)),
        }
    }
}

impl Identifiable for RecurringTemplate {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for RecurringTemplate {
    fn owner(&self) -> OwnerId {
        self.owner
    }
}
