use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use finledger_domain::rules::{self, MAX_HISTORY_MONTHS};

use crate::ConfigError;

/// User preferences and rule thresholds. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    pub ui_color_enabled: bool,

    /// Optional path of the JSON datastore. Defaults to `<data dir>/finledger/ledger.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// Bucket name for entries without a resolvable category or branch.
    pub uncategorized_label: String,

    pub emergency_fund_keywords: Vec<String>,
    pub emergency_fund_months: u32,
    pub expense_history_months: u32,
    pub overview_history_months: u32,
    pub needs_keywords: Vec<String>,
    pub savings_keywords: Vec<String>,

    pub high_spend_increase_pct: u32,
    pub low_savings_rate_pct: u32,
    pub high_savings_rate_pct: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            ui_color_enabled: true,
            data_file: None,
            uncategorized_label: "Uncategorized".into(),
            emergency_fund_keywords: rules::keywords(rules::EMERGENCY_FUND_KEYWORDS),
            emergency_fund_months: rules::DEFAULT_EMERGENCY_FUND_MONTHS,
            expense_history_months: rules::DEFAULT_EXPENSE_HISTORY_MONTHS,
            overview_history_months: rules::DEFAULT_OVERVIEW_HISTORY_MONTHS,
            needs_keywords: rules::keywords(rules::NEEDS_KEYWORDS),
            savings_keywords: rules::keywords(rules::SAVINGS_KEYWORDS),
            high_spend_increase_pct: 20,
            low_savings_rate_pct: 10,
            high_savings_rate_pct: 30,
        }
    }
}

impl Config {
    pub fn resolve_data_file(&self) -> PathBuf {
        if let Some(path) = &self.data_file {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("finledger").join("ledger.json")
    }

    /// Rejects look-back horizons outside `1..=MAX_HISTORY_MONTHS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, months) in [
            ("expense_history_months", self.expense_history_months),
            ("overview_history_months", self.overview_history_months),
        ] {
            if !(1..=MAX_HISTORY_MONTHS).contains(&months) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be between 1 and {MAX_HISTORY_MONTHS}, got {months}"
                )));
            }
        }
        Ok(())
    }

    /// `true` for Spanish locales such as `es`, `es-MX` or `es_ES`.
    pub fn is_spanish(&self) -> bool {
        self.locale.trim().to_ascii_lowercase().starts_with("es")
    }
}
