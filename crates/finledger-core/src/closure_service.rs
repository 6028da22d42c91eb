//! Month-end closure: Open → Closed transition per `(owner, period)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use finledger_domain::{calendar, MonthlySummary, OwnerId, Period};

use crate::{
    aggregation_service::{AggregationService, GroupLabels},
    locks::PeriodLocks,
    recurring_service::{MaterializationReport, RecurringService},
    storage::LedgerStore,
    CoreError, CoreResult,
};

/// Whether the period before `today` still lacks a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClosureStatus {
    pub period: Period,
    pub is_open: bool,
}

/// A completed closure. The period is closed even when `recurring` reports failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosureOutcome {
    pub summary: MonthlySummary,
    pub recurring: MaterializationReport,
}

impl ClosureOutcome {
    pub fn generated(&self) -> usize {
        self.recurring.created()
    }
}

pub struct ClosureService;

impl ClosureService {
    pub fn check_status(
        store: &dyn LedgerStore,
        owner: OwnerId,
        today: NaiveDate,
    ) -> CoreResult<ClosureStatus> {
        let period = calendar::previous_period(today)?;
        let closed = store.summary_exists(owner, period)?;
        Ok(ClosureStatus {
            period,
            is_open: !closed,
        })
    }

    /// Closes `period` for `owner` and materializes recurring entries for the next one.
    ///
    /// Closures of the same `(owner, period)` are serialized through `locks`. Aggregation
    /// failures abort before any write. Once the summary is stored the closure succeeds;
    /// recurring outcomes are returned in the report rather than as an error.
    pub fn close_period(
        store: &dyn LedgerStore,
        locks: &PeriodLocks,
        owner: OwnerId,
        period: Period,
        labels: &GroupLabels,
        now: DateTime<Utc>,
    ) -> CoreResult<ClosureOutcome> {
        let next = calendar::next_period(period)?;
        let _guard = locks.acquire(owner, period);

        if store.summary_exists(owner, period)? {
            info!(%owner, %period, "period already closed");
            return Err(CoreError::AlreadyClosed(period));
        }

        info!(%owner, %period, "closing period");
        let aggregate = AggregationService::aggregate(store, owner, period, labels)?;
        let summary = MonthlySummary::new(
            owner,
            period,
            aggregate.total_income,
            aggregate.total_expenses,
            aggregate.total_savings,
            aggregate.snapshot(),
            now,
        );

        match store.insert_summary(summary.clone()) {
            Ok(()) => {}
            Err(err) if err.is_conflict() => {
                warn!(%owner, %period, "summary inserted concurrently");
                return Err(CoreError::AlreadyClosed(period));
            }
            Err(source) => {
                error!(%owner, %period, error = %source, "failed to persist monthly summary");
                return Err(CoreError::SummaryPersistFailure { period, source });
            }
        }

        let recurring = RecurringService::materialize(store, owner, next);
        if recurring.failed() > 0 {
            warn!(
                %owner,
                %period,
                failed = recurring.failed(),
                attempted = recurring.attempted(),
                "period closed with recurring failures"
            );
        }
        info!(%owner, %period, balance = %summary.balance, generated = recurring.created(), "period closed");

        Ok(ClosureOutcome { summary, recurring })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use finledger_domain::{
        EntryKind, Expense, Income, RecurringTemplate, SavingGoal, SavingGoalTransaction,
    };

    use super::*;
    use crate::{
        recurring_service::BatchStatus,
        testing::{date, period, FakeStore},
        time::{Clock, FixedClock},
    };

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn close(store: &FakeStore, locks: &PeriodLocks, owner: OwnerId, p: Period) -> CoreResult<ClosureOutcome> {
        let now = FixedClock::on(date(2024, 5, 2)).now();
        ClosureService::close_period(store, locks, owner, p, &GroupLabels::default(), now)
    }

    fn seeded_april(store: &FakeStore, owner: OwnerId) {
        let goal = SavingGoal::new(owner, "Car", dec(5000));
        let mut tables = store.tables();
        tables.incomes.push(Income::new(owner, dec(100), date(2024, 4, 3)));
        tables.incomes.push(Income::new(owner, dec(200), date(2024, 4, 17)));
        tables.expenses.push(Expense::new(owner, dec(50), date(2024, 4, 9)));
        tables
            .contributions
            .push(SavingGoalTransaction::new(goal.id, dec(30), date(2024, 4, 30)));
        tables.goals.push(goal);
        tables.templates.push(
            RecurringTemplate::new(owner, EntryKind::Expense, dec(800)).with_day(31),
        );
    }

    #[test]
    fn check_status_reports_previous_period() {
        let store = FakeStore::new();
        let owner = OwnerId::new();
        let status = ClosureService::check_status(&store, owner, date(2024, 1, 15)).unwrap();
        assert_eq!(status.period, period(12, 2023));
        assert!(status.is_open);
    }

    #[test]
    fn close_persists_balance_and_generates_next_period() {
        let store = FakeStore::new();
        let locks = PeriodLocks::new();
        let owner = OwnerId::new();
        seeded_april(&store, owner);

        let outcome = close(&store, &locks, owner, period(4, 2024)).unwrap();
        assert_eq!(outcome.summary.total_income, dec(300));
        assert_eq!(outcome.summary.total_expenses, dec(50));
        assert_eq!(outcome.summary.total_savings, dec(30));
        assert_eq!(outcome.summary.balance, dec(220));
        assert_eq!(outcome.generated(), 1);

        let tables = store.tables();
        assert_eq!(tables.summaries.len(), 1);
        let generated = tables
            .expenses
            .iter()
            .find(|expense| expense.is_recurring)
            .unwrap();
        assert_eq!(generated.date, date(2024, 5, 31));
    }

    #[test]
    fn closing_twice_is_rejected_without_mutation() {
        let store = FakeStore::new();
        let locks = PeriodLocks::new();
        let owner = OwnerId::new();
        seeded_april(&store, owner);

        close(&store, &locks, owner, period(4, 2024)).unwrap();
        let expenses_after_first = store.tables().expenses.len();

        let err = close(&store, &locks, owner, period(4, 2024)).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyClosed(p) if p == period(4, 2024)));
        assert!(err.is_benign());
        assert_eq!(store.tables().summaries.len(), 1);
        assert_eq!(store.tables().expenses.len(), expenses_after_first);
        assert!(!locks.is_held(owner, period(4, 2024)));
    }

    #[test]
    fn summary_failure_leaves_period_open_and_skips_recurring() {
        let store = FakeStore::new();
        let locks = PeriodLocks::new();
        let owner = OwnerId::new();
        seeded_april(&store, owner);
        store.faults().summary_insert = true;

        let err = close(&store, &locks, owner, period(4, 2024)).unwrap_err();
        assert!(matches!(err, CoreError::SummaryPersistFailure { .. }));
        assert!(store.tables().summaries.is_empty());
        assert!(store.tables().expenses.iter().all(|e| !e.is_recurring));

        let status = ClosureService::check_status(&store, owner, date(2024, 5, 10)).unwrap();
        assert!(status.is_open);
    }

    #[test]
    fn aggregation_failure_aborts_before_any_write() {
        let store = FakeStore::new();
        let locks = PeriodLocks::new();
        let owner = OwnerId::new();
        seeded_april(&store, owner);

        store.faults().reads = true;
        let err = close(&store, &locks, owner, period(4, 2024)).unwrap_err();
        assert!(matches!(err, CoreError::AggregationReadFailure { .. }));
        assert!(store.tables().summaries.is_empty());
    }

    #[test]
    fn recurring_failure_still_closes_the_period() {
        let store = FakeStore::new();
        let locks = PeriodLocks::new();
        let owner = OwnerId::new();
        seeded_april(&store, owner);
        let template_id = store.tables().templates[0].id;
        store.faults().entry_templates.insert(template_id);

        let outcome = close(&store, &locks, owner, period(4, 2024)).unwrap();
        assert_eq!(outcome.recurring.status(), BatchStatus::AllFailed);
        assert!(outcome.recurring.ensure_complete().is_err());
        assert_eq!(store.tables().summaries.len(), 1);

        let status = ClosureService::check_status(&store, owner, date(2024, 5, 10)).unwrap();
        assert!(!status.is_open);
    }

    #[test]
    fn concurrent_closures_produce_one_summary() {
        use std::{sync::Arc, thread};

        let store = Arc::new(FakeStore::new());
        let locks = Arc::new(PeriodLocks::new());
        let owner = OwnerId::new();
        seeded_april(&store, owner);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let locks = Arc::clone(&locks);
                thread::spawn(move || close(&store, &locks, owner, period(4, 2024)))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(CoreError::is_benign));
        let tables = store.tables();
        assert_eq!(tables.summaries.len(), 1);
        assert_eq!(tables.expenses.iter().filter(|e| e.is_recurring).count(), 1);
    }
}
