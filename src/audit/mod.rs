//! Append-only audit trail of every transition attempt.
//!
//! Rejected attempts are recorded as faithfully as applied ones: the trail is
//! the forensic record public-finance inspection works from. Applied entries
//! carry the `ExpenseEvent` that was folded, so replaying an expense's entries
//! rebuilds its record at any past instant.

mod entry;
pub mod error;
mod replay;
mod store;

pub use entry::{AuditDraft, AuditEntry, Outcome};
pub use error::{AuditError, ReplayError};
pub use replay::{replay, replay_until};
pub use store::{AuditStore, MemoryAuditStore};
