use chrono::NaiveDate;
use finledger_core::{
    ClosureService, GroupLabels, LedgerStore, PeriodLocks, RecurringService, StoreError,
};
use finledger_domain::{
    Category, EntryKind, Expense, Income, MonthlySummary, OwnerId, Period, RecurringTemplate,
    SavingGoal, SavingGoalTransaction, SnapshotData,
};
use finledger_storage_json::{load_tables, JsonLedgerStore};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn period(month: u32, year: i32) -> Period {
    Period::new(month, year).expect("valid period")
}

fn summary(owner: OwnerId, period: Period) -> MonthlySummary {
    MonthlySummary::new(
        owner,
        period,
        Decimal::from(10),
        Decimal::from(4),
        Decimal::ZERO,
        SnapshotData::default(),
        chrono::Utc::now(),
    )
}

#[test]
fn data_survives_reopening_the_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.json");
    let owner = OwnerId::new();

    {
        let store = JsonLedgerStore::open(&path).expect("open store");
        let food = store
            .add_category(Category::new(owner, "Food"))
            .expect("add category");
        store
            .add_expense(
                Expense::new(owner, Decimal::from(42), date(2024, 4, 3)).with_category(food),
            )
            .expect("add expense");
        store
            .add_income(Income::new(owner, Decimal::from(1000), date(2024, 4, 1)))
            .expect("add income");
    }
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let reopened = JsonLedgerStore::open(&path).expect("reopen store");
    let expenses = reopened
        .expenses_between(owner, period(4, 2024).bounds())
        .expect("expenses");
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].amount, Decimal::from(42));
    assert_eq!(reopened.categories(owner).expect("categories").len(), 1);
    assert_eq!(reopened.incomes(owner).len(), 1);
}

#[test]
fn reads_are_owner_scoped_and_inclusive() {
    let store = JsonLedgerStore::in_memory();
    let owner = OwnerId::new();
    let other = OwnerId::new();
    store
        .add_income(Income::new(owner, Decimal::ONE, date(2024, 2, 1)))
        .expect("first day");
    store
        .add_income(Income::new(owner, Decimal::ONE, date(2024, 2, 29)))
        .expect("last day");
    store
        .add_income(Income::new(owner, Decimal::ONE, date(2024, 3, 1)))
        .expect("next month");
    store
        .add_income(Income::new(other, Decimal::ONE, date(2024, 2, 10)))
        .expect("other owner");

    let rows = store
        .incomes_between(owner, period(2, 2024).bounds())
        .expect("incomes");
    assert_eq!(rows.len(), 2);
}

#[test]
fn second_summary_for_a_period_conflicts() {
    let store = JsonLedgerStore::in_memory();
    let owner = OwnerId::new();
    store
        .insert_summary(summary(owner, period(4, 2024)))
        .expect("first summary");
    let err = store
        .insert_summary(summary(owner, period(4, 2024)))
        .expect_err("duplicate summary");
    assert!(matches!(err, StoreError::Conflict(_)));

    store
        .insert_summary(summary(OwnerId::new(), period(4, 2024)))
        .expect("other owner may close the same period");
    assert!(store.summary_exists(owner, period(4, 2024)).expect("exists"));
    assert_eq!(store.summaries(owner).expect("summaries").len(), 1);
}

#[test]
fn recurrence_key_is_unique_per_template_and_period() {
    let store = JsonLedgerStore::in_memory();
    let owner = OwnerId::new();
    let template = RecurringTemplate::new(owner, EntryKind::Expense, Decimal::from(30));

    let outcomes = store.insert_expenses(vec![
        template.expense_for(period(5, 2024)),
        template.expense_for(period(5, 2024)),
        template.expense_for(period(6, 2024)),
    ]);
    assert!(outcomes[0].is_ok());
    assert!(matches!(outcomes[1], Err(StoreError::Conflict(_))));
    assert!(outcomes[2].is_ok());
    assert_eq!(store.expenses(owner).len(), 2);
}

#[test]
fn watermark_never_moves_backwards() {
    let store = JsonLedgerStore::in_memory();
    let owner = OwnerId::new();
    let id = store
        .add_template(RecurringTemplate::new(owner, EntryKind::Income, Decimal::TEN))
        .expect("add template");

    store
        .set_template_watermark(id, date(2024, 6, 1))
        .expect("advance");
    store
        .set_template_watermark(id, date(2024, 5, 1))
        .expect("stale update");
    assert_eq!(store.templates(owner)[0].last_processed, Some(date(2024, 6, 1)));

    store.deactivate_template(id).expect("deactivate");
    assert!(store.active_templates(owner).expect("templates").is_empty());
}

#[test]
fn goal_lookup_is_case_insensitive_and_contributions_need_a_goal() {
    let store = JsonLedgerStore::in_memory();
    let owner = OwnerId::new();
    let goal = store
        .add_goal(SavingGoal::new(owner, "Fondo de Emergencia", Decimal::from(500)))
        .expect("add goal");

    let matches = store.goals_matching(owner, "EMERGENCIA").expect("match");
    assert_eq!(matches.len(), 1);
    assert!(store
        .goals_matching(OwnerId::new(), "emergencia")
        .expect("match")
        .is_empty());

    store
        .insert_contribution(SavingGoalTransaction::new(goal, Decimal::TEN, date(2024, 4, 2)))
        .expect("contribution");
    let orphan = store.insert_contribution(SavingGoalTransaction::new(
        uuid::Uuid::new_v4(),
        Decimal::TEN,
        date(2024, 4, 2),
    ));
    assert!(matches!(orphan, Err(StoreError::NotFound(_))));
    assert_eq!(store.contributions(goal).len(), 1);
}

#[test]
fn closure_against_the_json_store_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.json");
    let store = JsonLedgerStore::open(&path).expect("open store");
    let locks = PeriodLocks::new();
    let owner = OwnerId::new();

    store
        .add_income(Income::new(owner, Decimal::from(300), date(2024, 4, 10)))
        .expect("income");
    store
        .add_template(
            RecurringTemplate::new(owner, EntryKind::Expense, Decimal::from(80)).with_day(31),
        )
        .expect("template");

    let labels = GroupLabels::default();
    let outcome = ClosureService::close_period(
        &store,
        &locks,
        owner,
        period(4, 2024),
        &labels,
        chrono::Utc::now(),
    )
    .expect("close april");
    assert_eq!(outcome.summary.balance, Decimal::from(300));
    assert_eq!(outcome.generated(), 1);

    let again = ClosureService::close_period(
        &store,
        &locks,
        owner,
        period(4, 2024),
        &labels,
        chrono::Utc::now(),
    );
    assert!(again.expect_err("second close").is_benign());

    let report = RecurringService::materialize(&store, owner, period(5, 2024));
    assert_eq!(report.created(), 0);

    let on_disk = load_tables(&path).expect("load tables");
    assert_eq!(on_disk.monthly_summaries.len(), 1);
    assert_eq!(on_disk.expenses.len(), 1);
    assert_eq!(on_disk.expenses[0].date, date(2024, 5, 31));
    assert_eq!(
        on_disk.recurring_transactions[0].last_processed,
        Some(date(2024, 5, 31))
    );
}

#[test]
fn negative_amounts_are_rejected() {
    let store = JsonLedgerStore::in_memory();
    let owner = OwnerId::new();

    let income = store.add_income(Income::new(owner, Decimal::from(-100), date(2024, 4, 1)));
    assert!(matches!(income, Err(StoreError::Invalid(_))));
    let expense = store.add_expense(Expense::new(owner, Decimal::from(-5), date(2024, 4, 2)));
    assert!(matches!(expense, Err(StoreError::Invalid(_))));
    let template = store.add_template(RecurringTemplate::new(
        owner,
        EntryKind::Expense,
        Decimal::from(-250),
    ));
    assert!(matches!(template, Err(StoreError::Invalid(_))));

    let outcomes = store.insert_expenses(vec![
        Expense::new(owner, Decimal::from(-1), date(2024, 4, 3)),
        Expense::new(owner, Decimal::from(7), date(2024, 4, 3)),
    ]);
    assert!(matches!(outcomes[0], Err(StoreError::Invalid(_))));
    assert!(outcomes[1].is_ok());

    let goal = store
        .add_goal(SavingGoal::new(owner, "Trip", Decimal::from(100)))
        .expect("goal");
    assert!(matches!(
        store.insert_contribution(SavingGoalTransaction::new(goal, Decimal::from(-3), date(2024, 4, 4))),
        Err(StoreError::Invalid(_))
    ));
    assert!(matches!(
        store.set_goal_amount(goal, Decimal::from(-3)),
        Err(StoreError::Invalid(_))
    ));

    assert!(store.incomes(owner).is_empty());
    assert_eq!(store.expenses(owner).len(), 1);
    assert!(store.templates(owner).is_empty());
    assert!(store.contributions(goal).is_empty());
}

#[test]
fn two_handles_on_one_file_keep_each_others_writes() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.json");
    let owner = OwnerId::new();
    let first = JsonLedgerStore::open(&path).expect("first handle");
    let second = JsonLedgerStore::open(&path).expect("second handle");

    first
        .add_income(Income::new(owner, Decimal::from(300), date(2024, 3, 5)))
        .expect("income");
    first
        .insert_summary(summary(owner, period(3, 2024)))
        .expect("first summary");

    let err = second
        .insert_summary(summary(owner, period(3, 2024)))
        .expect_err("summary already stored by the other handle");
    assert!(err.is_conflict());

    second
        .add_expense(Expense::new(owner, Decimal::from(20), date(2024, 3, 6)))
        .expect("expense");

    let on_disk = load_tables(&path).expect("load");
    assert_eq!(on_disk.incomes.len(), 1);
    assert_eq!(on_disk.expenses.len(), 1);
    assert_eq!(on_disk.monthly_summaries.len(), 1);
    assert_eq!(second.incomes(owner).len(), 1);

    assert!(first.expenses(owner).is_empty());
    first.refresh().expect("refresh");
    assert_eq!(first.expenses(owner).len(), 1);
}

#[test]
fn handles_on_separate_threads_serialize_through_the_file_lock() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.json");
    let owner = OwnerId::new();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let path = path.clone();
            std::thread::spawn(move || {
                let store = JsonLedgerStore::open(&path).expect("open");
                for day in 1..=5 {
                    store
                        .add_income(Income::new(
                            owner,
                            Decimal::from(worker * 10 + day),
                            date(2024, 5, day as u32),
                        ))
                        .expect("income");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    let reopened = JsonLedgerStore::open(&path).expect("reopen");
    assert_eq!(reopened.incomes(owner).len(), 20);
}
