//! finledger-core
//!
//! Period closure, recurring-entry generation, projections and the read-side
//! analytics built on top of them. Depends on finledger-domain. No CLI, no terminal
//! I/O; all persistence goes through the [`storage::LedgerStore`] seam.

pub mod aggregation_service;
pub mod closure_service;
pub mod contribution_service;
pub mod error;
pub mod health_service;
pub mod insight_service;
pub mod locks;
pub mod overview_service;
pub mod projection_service;
pub mod recurring_service;
pub mod storage;
pub mod time;

#[cfg(test)]
mod testing;

pub use aggregation_service::*;
pub use closure_service::*;
pub use contribution_service::*;
pub use error::{CoreError, CoreResult};
pub use health_service::*;
pub use insight_service::*;
pub use locks::{PeriodGuard, PeriodLocks};
pub use overview_service::*;
pub use projection_service::*;
pub use recurring_service::*;
pub use storage::{LedgerStore, StoreError, StoreResult};
pub use time::{Clock, FixedClock, SystemClock};
