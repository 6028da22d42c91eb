//! finledger-config
//!
//! Persistent user preferences: locale, data file location and the thresholds used by
//! the health and insight rules. Owns the Config model plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::Config;
