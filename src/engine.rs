//! Presentation-facing facade. Every call resolves the owner from a [`Session`] first and
//! fails with [`EngineError::Unauthenticated`] before touching the store when there is none.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use finledger_config::Config;
use finledger_core::{
    Clock, ClosureService, ContributionService, CoreError, FinancialHealth, GroupLabels,
    HealthRules, HealthService, Insight, InsightRules, InsightService, LedgerStore,
    MaterializationReport, Overview, OverviewService, PeriodLocks, Projection,
    ProjectionService, RecurringService,
};
use finledger_domain::{rules, MonthlySummary, OwnerId, Period, SavingGoal};

use crate::{
    errors::{EngineError, EngineResult},
    session::Session,
};

/// Answer to "does last month still need closing?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosureCheck {
    pub needs_closure: bool,
    pub period: Period,
    pub display_name: String,
}

/// Result of a successful closure. `warning` is set when recurring generation failed
/// for some templates; the period is closed regardless.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseReport {
    pub period: Period,
    /// Period the recurring entries were generated for.
    pub next_period: Period,
    pub summary: MonthlySummary,
    pub generated: usize,
    pub failed: usize,
    pub warning: Option<String>,
}

pub struct FinanceEngine {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    config: Config,
    locks: PeriodLocks,
}

impl FinanceEngine {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, config: Config) -> Self {
        Self {
            store,
            clock,
            config,
            locks: PeriodLocks::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn check_closure_status(&self, session: &dyn Session) -> EngineResult<ClosureCheck> {
        let owner = resolve_owner(session)?;
        let status = ClosureService::check_status(self.store.as_ref(), owner, self.clock.today())?;
        Ok(ClosureCheck {
            needs_closure: status.is_open,
            period: status.period,
            display_name: status.period.display_name(&self.config.locale),
        })
    }

    pub fn close_period(
        &self,
        session: &dyn Session,
        month: u32,
        year: i32,
    ) -> EngineResult<CloseReport> {
        let owner = resolve_owner(session)?;
        let period = Period::new(month, year).map_err(CoreError::from)?;
        let outcome = ClosureService::close_period(
            self.store.as_ref(),
            &self.locks,
            owner,
            period,
            &self.labels(),
            self.clock.now(),
        )?;

        let warning = outcome.recurring.ensure_complete().err().map(|err| err.to_string());
        Ok(CloseReport {
            period,
            next_period: outcome.recurring.target,
            generated: outcome.generated(),
            failed: outcome.recurring.failed(),
            summary: outcome.summary,
            warning,
        })
    }

    /// Re-runs recurring generation for `month/year`. Safe to repeat: entries that already
    /// exist are reported as already materialized.
    pub fn materialize(
        &self,
        session: &dyn Session,
        month: u32,
        year: i32,
    ) -> EngineResult<MaterializationReport> {
        let owner = resolve_owner(session)?;
        let target = Period::new(month, year).map_err(CoreError::from)?;
        // Same key a closure of the preceding period holds while it materializes `target`.
        let _guard = self.locks.acquire(owner, target.previous().map_err(CoreError::from)?);
        let report = RecurringService::materialize(self.store.as_ref(), owner, target);
        if report.failed() > 0 {
            warn!(%owner, %target, failed = report.failed(), "recurring retry incomplete");
        } else {
            info!(%owner, %target, created = report.created(), "recurring retry finished");
        }
        Ok(report)
    }

    pub fn project(&self, session: &dyn Session) -> EngineResult<Projection> {
        let owner = resolve_owner(session)?;
        Ok(ProjectionService::project(
            self.store.as_ref(),
            owner,
            self.clock.today(),
        )?)
    }

    pub fn financial_health(&self, session: &dyn Session) -> EngineResult<FinancialHealth> {
        let owner = resolve_owner(session)?;
        Ok(HealthService::assess(
            self.store.as_ref(),
            owner,
            self.clock.today(),
            &self.health_rules(),
        )?)
    }

    pub fn insights(&self, session: &dyn Session) -> EngineResult<Vec<Insight>> {
        let owner = resolve_owner(session)?;
        Ok(InsightService::insights(
            self.store.as_ref(),
            owner,
            self.clock.today(),
            &self.insight_rules(),
        )?)
    }

    pub fn overview(&self, session: &dyn Session) -> EngineResult<Overview> {
        let owner = resolve_owner(session)?;
        Ok(OverviewService::current_month(
            self.store.as_ref(),
            owner,
            self.clock.today(),
            &self.labels(),
            rules::clamp_history_months(self.config.overview_history_months),
        )?)
    }

    /// Records a manual contribution dated today and returns the updated goal.
    pub fn add_funds(
        &self,
        session: &dyn Session,
        goal_id: Uuid,
        amount: Decimal,
    ) -> EngineResult<SavingGoal> {
        let owner = resolve_owner(session)?;
        Ok(ContributionService::add_funds(
            self.store.as_ref(),
            owner,
            goal_id,
            amount,
            self.clock.today(),
        )?)
    }

    /// Closed periods, oldest first.
    pub fn summaries(&self, session: &dyn Session) -> EngineResult<Vec<MonthlySummary>> {
        let owner = resolve_owner(session)?;
        Ok(self.store.summaries(owner)?)
    }

    fn labels(&self) -> GroupLabels {
        GroupLabels {
            uncategorized: self.config.uncategorized_label.clone(),
        }
    }

    fn health_rules(&self) -> HealthRules {
        HealthRules {
            needs_keywords: self.config.needs_keywords.clone(),
            savings_keywords: self.config.savings_keywords.clone(),
            emergency_fund_keywords: self.config.emergency_fund_keywords.clone(),
            emergency_fund_months: self.config.emergency_fund_months,
            expense_history_months: rules::clamp_history_months(
                self.config.expense_history_months,
            ),
        }
    }

    fn insight_rules(&self) -> InsightRules {
        InsightRules {
            high_spend_increase_pct: Decimal::from(self.config.high_spend_increase_pct),
            low_savings_rate_pct: Decimal::from(self.config.low_savings_rate_pct),
            high_savings_rate_pct: Decimal::from(self.config.high_savings_rate_pct),
            emergency_fund_keywords: self.config.emergency_fund_keywords.clone(),
        }
    }
}

fn resolve_owner(session: &dyn Session) -> EngineResult<OwnerId> {
    session.owner().ok_or(EngineError::Unauthenticated)
}
