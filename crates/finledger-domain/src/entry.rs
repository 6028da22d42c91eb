//! Concrete ledger entries: incomes and expenses.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, period::Period};

/// Which side of the ledger an entry or template belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        };
        f.write_str(label)
    }
}

/// Idempotency key stamped on entries generated from a recurring template.
///
/// A datastore holds at most one entry per key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecurrenceKey {
    pub template_id: Uuid,
    pub period: Period,
}

/// Common read access to income and expense rows.
pub trait LedgerEntry: Identifiable + Owned {
    fn amount(&self) -> Decimal;
    fn date(&self) -> NaiveDate;
    /// Category (expenses) or income branch (incomes) reference.
    fn group_id(&self) -> Option<Uuid>;
    fn recurrence(&self) -> Option<RecurrenceKey>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: Uuid,
    pub owner: OwnerId,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceKey>,
}

impl Income {
    pub fn new(owner: OwnerId, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            amount,
            date,
            description: None,
            branch_id: None,
            is_recurring: false,
            recurrence: None,
        }
    }

    pub fn with_branch(mut self, branch_id: Uuid) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub owner: OwnerId,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceKey>,
}

impl Expense {
    pub fn new(owner: OwnerId, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            amount,
            date,
            description: None,
            category_id: None,
            is_recurring: false,
            recurrence: None,
        }
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Identifiable for Income {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Income {
    fn owner(&self) -> OwnerId {
        self.owner
    }
}

impl LedgerEntry for Income {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn group_id(&self) -> Option<Uuid> {
        self.branch_id
    }

    fn recurrence(&self) -> Option<RecurrenceKey> {
        self.recurrence
    }
}

impl Identifiable for Expense {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Expense {
    fn owner(&self) -> OwnerId {
        self.owner
    }
}

impl LedgerEntry for Expense {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn group_id(&self) -> Option<Uuid> {
        self.category_id
    }

    fn recurrence(&self) -> Option<RecurrenceKey> {
        self.recurrence
    }
}

/// A running total left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountOverflow;

impl fmt::Display for AmountOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("amount total is out of range")
    }
}

impl std::error::Error for AmountOverflow {}

/// Sums `amounts`, failing instead of panicking when the total overflows.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, AmountOverflow>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount).ok_or(AmountOverflow))
}

/// Adds `amount` onto `slot` in place.
pub fn accumulate(slot: &mut Decimal, amount: Decimal) -> Result<(), AmountOverflow> {
    *slot = slot.checked_add(amount).ok_or(AmountOverflow)?;
    Ok(())
}

/// Sums the amounts of a slice of entries.
pub fn total_amount<E: LedgerEntry>(entries: &[E]) -> Result<Decimal, AmountOverflow> {
    checked_sum(entries.iter().map(LedgerEntry::amount))
}

/// `income - expenses - savings`, checked.
pub fn checked_balance(
    income: Decimal,
    expenses: Decimal,
    savings: Decimal,
) -> Result<Decimal, AmountOverflow> {
    income
        .checked_sub(expenses)
        .and_then(|rest| rest.checked_sub(savings))
        .ok_or(AmountOverflow)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).expect("valid date")
    }

    #[test]
    fn totals_report_overflow_instead_of_panicking() {
        let owner = OwnerId::new();
        let fine = vec![
            Expense::new(owner, Decimal::from(40), day()),
            Expense::new(owner, Decimal::from(2), day()),
        ];
        assert_eq!(total_amount(&fine), Ok(Decimal::from(42)));

        let huge = vec![
            Expense::new(owner, Decimal::MAX, day()),
            Expense::new(owner, Decimal::ONE, day()),
        ];
        assert_eq!(total_amount(&huge), Err(AmountOverflow));

        let mut slot = Decimal::MAX;
        assert_eq!(accumulate(&mut slot, Decimal::ONE), Err(AmountOverflow));
        assert_eq!(slot, Decimal::MAX);
    }

    #[test]
    fn balance_is_checked() {
        assert_eq!(
            checked_balance(Decimal::from(300), Decimal::from(50), Decimal::from(30)),
            Ok(Decimal::from(220))
        );
        assert_eq!(
            checked_balance(Decimal::ZERO, Decimal::MAX, Decimal::MAX),
            Err(AmountOverflow)
        );
    }
}
