//! Materializes recurring templates into concrete ledger entries, once per period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use finledger_domain::{EntryKind, OwnerId, Period, RecurringTemplate};

use crate::{
    storage::{LedgerStore, StoreResult},
    CoreError, CoreResult,
};

/// What happened to one template during a materialization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TemplateOutcome {
    /// A new entry was inserted.
    Created { entry_id: Uuid },
    /// An entry for this template and period already exists.
    AlreadyMaterialized,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateResult {
    pub template_id: Uuid,
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub outcome: TemplateOutcome,
}

/// Aggregate classification of a run's per-template outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// No template was attempted.
    Nothing,
    AllSucceeded,
    Partial,
    AllFailed,
}

/// Result of one `materialize` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializationReport {
    pub target: Period,
    pub results: Vec<TemplateResult>,
    /// Set when the template list itself could not be read.
    pub load_error: Option<String>,
}

impl MaterializationReport {
    fn empty(target: Period) -> Self {
        Self {
            target,
            results: Vec::new(),
            load_error: None,
        }
    }

    pub fn created(&self) -> usize {
        self.results
            .iter()
            .filter(|result| matches!(result.outcome, TemplateOutcome::Created { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|result| matches!(result.outcome, TemplateOutcome::Failed { .. }))
            .count()
            + usize::from(self.load_error.is_some())
    }

    pub fn attempted(&self) -> usize {
        self.results.len() + usize::from(self.load_error.is_some())
    }

    pub fn failures(&self) -> impl Iterator<Item = &TemplateResult> {
        self.results
            .iter()
            .filter(|result| matches!(result.outcome, TemplateOutcome::Failed { .. }))
    }

    pub fn status(&self) -> BatchStatus {
        let attempted = self.attempted();
        let failed = self.failed();
        match (attempted, failed) {
            (0, _) => BatchStatus::Nothing,
            (_, 0) => BatchStatus::AllSucceeded,
            (a, f) if a == f => BatchStatus::AllFailed,
            _ => BatchStatus::Partial,
        }
    }

    /// Converts any failure into [`CoreError::PartialRecurringFailure`].
    pub fn ensure_complete(&self) -> CoreResult<()> {
        let failed = self.failed();
        if failed == 0 {
            return Ok(());
        }
        Err(CoreError::PartialRecurringFailure {
            target: self.target,
            failed,
            attempted: self.attempted(),
        })
    }
}

pub struct RecurringService;

impl RecurringService {
    /// Generates one entry per due, active template of `owner` for `target`.
    ///
    /// Templates whose watermark already falls in `target` are skipped without touching
    /// the datastore. Every generated entry carries a recurrence key, so an entry that
    /// slipped past the watermark (a concurrent run, or a lost watermark update) is
    /// rejected by the store and reported as already materialized. The watermark is
    /// advanced only once the entry is known to exist.
    pub fn materialize(
        store: &dyn LedgerStore,
        owner: OwnerId,
        target: Period,
    ) -> MaterializationReport {
        let mut report = MaterializationReport::empty(target);
        let templates = match store.active_templates(owner) {
            Ok(templates) => templates,
            Err(err) => {
                warn!(%owner, %target, error = %err, "failed to load recurring templates");
                report.load_error = Some(err.to_string());
                return report;
            }
        };

        let due: Vec<&RecurringTemplate> = templates
            .iter()
            .filter(|template| template.active)
            .filter(|template| {
                let done = template.processed_in(target);
                if done {
                    debug!(template = %template.id, %target, "template already processed");
                }
                !done
            })
            .collect();
        if due.is_empty() {
            return report;
        }

        let (due, negative): (Vec<_>, Vec<_>) = due
            .into_iter()
            .partition(|template| template.amount >= Decimal::ZERO);
        for template in negative {
            warn!(template = %template.id, amount = %template.amount, "skipping template with negative amount");
            report.results.push(TemplateResult {
                template_id: template.id,
                kind: template.kind,
                date: template.due_date(target),
                outcome: TemplateOutcome::Failed {
                    reason: format!("template amount must not be negative, got {}", template.amount),
                },
            });
        }

        let (incomes, expenses): (Vec<_>, Vec<_>) = due
            .into_iter()
            .partition(|template| template.kind == EntryKind::Income);

        let income_outcomes =
            store.insert_incomes(incomes.iter().map(|t| t.income_for(target)).collect());
        let expense_outcomes =
            store.insert_expenses(expenses.iter().map(|t| t.expense_for(target)).collect());

        for (template, outcome) in incomes
            .into_iter()
            .zip(income_outcomes)
            .chain(expenses.into_iter().zip(expense_outcomes))
        {
            report
                .results
                .push(Self::settle(store, template, target, outcome));
        }

        info!(
            %owner,
            %target,
            created = report.created(),
            failed = report.failed(),
            "recurring templates materialized"
        );
        report
    }

    fn settle(
        store: &dyn LedgerStore,
        template: &RecurringTemplate,
        target: Period,
        inserted: StoreResult<Uuid>,
    ) -> TemplateResult {
        let date = template.due_date(target);
        let outcome = match inserted {
            Ok(entry_id) => TemplateOutcome::Created { entry_id },
            Err(err) if err.is_conflict() => {
                debug!(template = %template.id, %target, "entry already present");
                TemplateOutcome::AlreadyMaterialized
            }
            Err(err) => {
                warn!(template = %template.id, %target, error = %err, "recurring entry insert failed");
                TemplateOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        if !matches!(outcome, TemplateOutcome::Failed { .. }) {
            if let Err(err) = store.set_template_watermark(template.id, date) {
                warn!(template = %template.id, %date, error = %err, "watermark update failed");
            }
        }

        TemplateResult {
            template_id: template.id,
            kind: template.kind,
            date,
            outcome,
        }
    }
}
