//! finledger-domain
//!
//! Pure domain models (periods, ledger entries, saving goals, recurring templates,
//! monthly summaries), calendar arithmetic and the default analytics rules.
//! No I/O, no logging, no storage. Only data types and pure functions.

pub mod calendar;
pub mod category;
pub mod common;
pub mod entry;
pub mod goal;
pub mod period;
pub mod recurring;
pub mod rules;
pub mod summary;

pub use category::*;
pub use common::*;
pub use entry::*;
pub use goal::*;
pub use period::*;
pub use recurring::*;
pub use summary::*;
