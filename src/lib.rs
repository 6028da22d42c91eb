#![doc(test(attr(deny(warnings))))]

//! finledger
//!
//! Month-end closing for a personal finance ledger. Wires the core services to a
//! [`session::Session`], user configuration and a datastore behind [`FinanceEngine`],
//! and ships the `finledger_cli` script-mode shell.

pub mod cli;
pub mod engine;
pub mod errors;
pub mod session;
pub mod utils;

use std::sync::Once;

pub use engine::{CloseReport, ClosureCheck, FinanceEngine};
pub use errors::{EngineError, EngineResult};
pub use session::{Session, StaticSession};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "finledger tracing initialized");
    });
}
