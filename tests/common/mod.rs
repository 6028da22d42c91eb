#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use finledger_domain::{Category, EntryKind, Expense, Income, OwnerId, RecurringTemplate, SavingGoal};
use finledger_storage_json::JsonLedgerStore;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Ids of the rows written by [`seed_march_2024`].
pub struct Seeded {
    pub owner: OwnerId,
    pub goal_id: Uuid,
    pub rent_template: Uuid,
}

/// March 2024: incomes 100 + 200, one 50 expense, one 30 contribution, and a monthly
/// rent template on the 31st.
pub fn seed_march_2024(store: &JsonLedgerStore) -> Seeded {
    let owner = OwnerId::new();
    let housing = store
        .add_category(Category::new(owner, "Housing"))
        .expect("category");
    store
        .add_income(Income::new(owner, dec(100), date(2024, 3, 1)))
        .expect("income");
    store
        .add_income(Income::new(owner, dec(200), date(2024, 3, 15)))
        .expect("income");
    store
        .add_expense(Expense::new(owner, dec(50), date(2024, 3, 20)).with_category(housing))
        .expect("expense");

    let goal_id = store
        .add_goal(SavingGoal::new(owner, "Emergency fund", dec(500)))
        .expect("goal");
    finledger_core::ContributionService::add_funds(store, owner, goal_id, dec(30), date(2024, 3, 25))
        .expect("contribution");

    let rent_template = store
        .add_template(
            RecurringTemplate::new(owner, EntryKind::Expense, dec(900))
                .with_day(31)
                .with_group(housing)
                .with_description("Rent"),
        )
        .expect("template");

    Seeded {
        owner,
        goal_id,
        rent_template,
    }
}
