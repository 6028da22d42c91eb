//! Default keyword lists and horizons for the analytics rules.
//!
//! Both the user configuration and the rule structs start from these values.

/// Category names containing one of these are counted as needs.
pub const NEEDS_KEYWORDS: &[&str] = &[
    "vivienda",
    "casa",
    "servicios",
    "luz",
    "agua",
    "internet",
    "supermercado",
    "transporte",
    "salud",
    "educación",
    "housing",
    "rent",
    "utilities",
    "groceries",
    "transport",
    "health",
    "education",
];

/// Category names containing one of these are counted as savings.
pub const SAVINGS_KEYWORDS: &[&str] = &["ahorro", "inversión", "savings", "investment"];

/// Goal names containing one of these identify the emergency fund.
pub const EMERGENCY_FUND_KEYWORDS: &[&str] = &["emergencia", "emergency"];

pub const DEFAULT_EMERGENCY_FUND_MONTHS: u32 = 6;
pub const DEFAULT_EXPENSE_HISTORY_MONTHS: u32 = 3;
pub const DEFAULT_OVERVIEW_HISTORY_MONTHS: u32 = 6;

/// Upper bound for any look-back horizon measured in months (ten years).
pub const MAX_HISTORY_MONTHS: u32 = 120;

/// Owned copy of a keyword list.
pub fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(|keyword| keyword.to_string()).collect()
}

/// Lifts 0 to 1 and caps at [`MAX_HISTORY_MONTHS`].
pub fn clamp_history_months(months: u32) -> u32 {
    months.clamp(1, MAX_HISTORY_MONTHS)
}
