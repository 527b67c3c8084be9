//! # rolemend-engine
//!
//! The reconciliation core: a pure [`auditor`] that diffs membership facts
//! against role records, a [`synchronizer`] that applies corrective actions
//! to both stores with an idempotency guard, and the [`Engine`] driver that
//! walks every team and runs the final lingering-role sweep.

pub mod auditor;
pub mod engine;
pub mod error;
pub mod report;
pub mod synchronizer;

pub use auditor::{NewRole, ReconcileAction};
pub use engine::{Engine, Phase};
pub use error::EngineError;
pub use report::Report;
pub use synchronizer::{ApplyResult, Synchronizer};
