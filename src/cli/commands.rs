use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use finledger_core::{InsightKind, TemplateOutcome};

use crate::utils::build_info;

use super::{
    context::CliContext,
    output::{self, MessageKind},
    registry::CommandEntry,
    CommandError, CommandResult,
};

pub(crate) fn all_entries() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "status",
            "Show whether last month still needs closing",
            "status",
            cmd_status,
        ),
        CommandEntry::new(
            "close",
            "Close a month and generate next month's recurring entries",
            "close <month> <year>",
            cmd_close,
        ),
        CommandEntry::new(
            "materialize",
            "Retry recurring entry generation for a month",
            "materialize <month> <year>",
            cmd_materialize,
        ),
        CommandEntry::new(
            "project",
            "Project this month's spending from the daily run rate",
            "project",
            cmd_project,
        ),
        CommandEntry::new(
            "health",
            "Show the needs/wants/savings split and emergency fund coverage",
            "health",
            cmd_health,
        ),
        CommandEntry::new("insights", "List spending insights", "insights", cmd_insights),
        CommandEntry::new(
            "overview",
            "Show this month's totals, top expenses and history",
            "overview",
            cmd_overview,
        ),
        CommandEntry::new(
            "contribute",
            "Add funds to a saving goal",
            "contribute <goal-id> <amount>",
            cmd_contribute,
        ),
        CommandEntry::new(
            "summaries",
            "List closed months",
            "summaries [--json]",
            cmd_summaries,
        ),
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Stop reading commands", "exit", cmd_exit),
    ]
}

fn cmd_status(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let check = context.engine.check_closure_status(&context.session)?;
    if check.needs_closure {
        output::warning(format!(
            "{} is still open. Run `close {} {}` to close it.",
            check.display_name,
            check.period.month(),
            check.period.year()
        ));
    } else {
        output::success(format!("{} is closed.", check.display_name));
    }
    Ok(())
}

fn cmd_close(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (month, year) = parse_period_args(args, "close <month> <year>")?;
    let report = context.engine.close_period(&context.session, month, year)?;

    output::success(format!(
        "Closed {} with balance {}.",
        report.period.display_name(&context.engine.config().locale),
        context.money(report.summary.balance)
    ));
    output::info(format!(
        "Generated {} recurring entries for {}.",
        report.generated,
        report.next_period
    ));
    if let Some(warning) = report.warning {
        output::warning(warning);
        output::info(format!(
            "Run `materialize {} {}` to retry.",
            report.next_period.month(),
            report.next_period.year()
        ));
    }
    Ok(())
}

fn cmd_materialize(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (month, year) = parse_period_args(args, "materialize <month> <year>")?;
    let report = context.engine.materialize(&context.session, month, year)?;

    if let Some(reason) = &report.load_error {
        output::error(format!("Could not load recurring templates: {reason}"));
    }
    for result in &report.results {
        match &result.outcome {
            TemplateOutcome::Created { entry_id } => output::success(format!(
                "{:?} {} on {} created ({entry_id}).",
                result.kind, result.template_id, result.date
            )),
            TemplateOutcome::AlreadyMaterialized => output::info(format!(
                "{:?} {} already present for {}.",
                result.kind, result.template_id, report.target
            )),
            TemplateOutcome::Failed { reason } => output::warning(format!(
                "{:?} {} failed: {reason}",
                result.kind, result.template_id
            )),
        }
    }
    output::info(format!(
        "{} created, {} failed, {} attempted.",
        report.created(),
        report.failed(),
        report.attempted()
    ));
    Ok(())
}

fn cmd_project(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let projection = context.engine.project(&context.session)?;

    output::section(format!("Projection {}", projection.period));
    output::field("Spent so far", context.money(projection.current_spent));
    output::field("Daily average", context.money(projection.avg_daily.round_dp(2)));
    output::field("Days passed", projection.days_passed);
    output::field("Days remaining", projection.days_remaining);
    output::field("Projected spend", context.money(projection.projected_spent));
    for goal in &projection.goals_projections {
        output::field(
            &format!("Goal {}", goal.goal.name),
            format!("{} to go", context.money(goal.remaining)),
        );
    }
    Ok(())
}

fn cmd_health(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let health = context.engine.financial_health(&context.session)?;
    let split = &health.split;
    let fund = &health.emergency_fund;

    output::section("Budget split");
    output::field("Income", context.money(split.total_income));
    output::field("Needs", context.money(split.needs));
    output::field("Wants", context.money(split.wants));
    output::field("Savings", context.money(split.savings));

    output::section("Emergency fund");
    output::field("Current", context.money(fund.current));
    output::field("Target", context.money(fund.target));
    output::field(
        "Avg monthly expenses",
        context.money(fund.average_monthly_expenses),
    );
    output::field("Months covered", fund.months_covered.round_dp(1));
    Ok(())
}

fn cmd_insights(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let insights = context.engine.insights(&context.session)?;
    if insights.is_empty() {
        output::info("No insights for this month yet.");
        return Ok(());
    }
    for insight in insights {
        let kind = match insight.kind {
            InsightKind::Warning => MessageKind::Warning,
            InsightKind::Success => MessageKind::Success,
            InsightKind::Info => MessageKind::Info,
        };
        output::print(kind, format!("{}: {}", insight.title, insight.description));
        if let Some(action) = insight.action {
            println!("      -> {} ({})", action.label, action.target);
        }
    }
    Ok(())
}

fn cmd_overview(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let overview = context.engine.overview(&context.session)?;
    let totals = &overview.totals;

    output::section(format!("Overview {}", overview.period));
    output::field("Income", context.money(totals.total_income));
    output::field("Expenses", context.money(totals.total_expenses));
    output::field("Savings", context.money(totals.total_savings));
    output::field("Balance", context.money(totals.balance));
    output::field("Savings rate", format!("{}%", totals.savings_rate.round_dp(1)));

    if !overview.expense_by_category.is_empty() {
        output::section("By category");
        for (name, amount) in &overview.expense_by_category {
            output::field(name, context.money(*amount));
        }
    }

    if !overview.top_expenses.is_empty() {
        output::section("Top expenses");
        for expense in &overview.top_expenses {
            let label = expense.description.as_deref().unwrap_or("-");
            output::field(
                &format!("{} {}", expense.date, label),
                context.money(expense.amount),
            );
        }
    }

    output::section("History");
    for entry in &overview.history {
        output::field(
            &entry.period.to_string(),
            format!(
                "in {} / out {}",
                context.money(entry.income),
                context.money(entry.expenses)
            ),
        );
    }
    Ok(())
}

fn cmd_contribute(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [goal, amount] = args else {
        return Err(usage("contribute <goal-id> <amount>"));
    };
    let goal_id = Uuid::parse_str(goal)
        .map_err(|_| CommandError::InvalidArguments(format!("`{goal}` is not a goal id.")))?;
    let amount = Decimal::from_str(amount)
        .map_err(|_| CommandError::InvalidArguments(format!("`{amount}` is not an amount.")))?;

    let goal = context.engine.add_funds(&context.session, goal_id, amount)?;
    output::success(format!(
        "Added {} to {}. Now {} of {}.",
        context.money(amount),
        goal.name,
        context.money(goal.current_amount),
        context.money(goal.goal_amount)
    ));
    if goal.is_reached() {
        output::success(format!("Goal {} reached.", goal.name));
    }
    Ok(())
}

fn cmd_summaries(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let summaries = context.engine.summaries(&context.session)?;
    if args.first() == Some(&"--json") {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        output::info("No closed months yet.");
        return Ok(());
    }
    output::section("Closed months");
    for summary in &summaries {
        output::field(
            &summary.period.to_string(),
            format!(
                "income {} / expenses {} / savings {} / balance {}",
                context.money(summary.total_income),
                context.money(summary.total_expenses),
                context.money(summary.total_savings),
                context.money(summary.balance)
            ),
        );
    }
    Ok(())
}

fn cmd_version(_context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("finledger {}", meta.version));
    output::field("Build hash", format!("{} ({})", meta.git_hash, meta.git_status));
    output::field("Built at", meta.timestamp);
    output::field("Target", meta.target);
    output::field("Profile", meta.profile);
    output::field("Rustc", meta.rustc);
    Ok(())
}

fn cmd_help(context: &mut CliContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(entry) => {
                output::info(entry.description);
                output::field("Usage", entry.usage);
            }
            None => output::warning(format!("Unknown command `{name}`.")),
        }
        return Ok(());
    }

    output::section("Commands");
    for entry in context.registry.iter() {
        output::field(entry.usage, entry.description);
    }
    Ok(())
}

fn cmd_exit(_context: &mut CliContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

fn usage(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("Usage: {usage}"))
}

fn parse_period_args(args: &[&str], usage_text: &str) -> Result<(u32, i32), CommandError> {
    let [month, year] = args else {
        return Err(usage(usage_text));
    };
    let month = month
        .parse::<u32>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{month}` is not a month.")))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{year}` is not a year.")))?;
    Ok((month, year))
}
