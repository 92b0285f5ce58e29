//! Audit trail error types.

use crate::core::ExpenseId;
use crate::expense::EventError;
use thiserror::Error;

/// Failures of an `AuditStore`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    /// The backing storage could not persist the entry. Not retried here.
    #[error("audit storage failure: {0}")]
    Storage(String),

    /// Entries handed to a store on restore are not in a valid order.
    #[error("audit entry {sequence} is out of order: {reason}")]
    OutOfOrder { sequence: u64, reason: String },
}

/// Failures while rebuilding a record from its audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("entries belong to more than one expense ({first} and {other})")]
    MixedExpenses { first: ExpenseId, other: ExpenseId },

    #[error("duplicate expense sequence {0}")]
    DuplicateSequence(u64),

    #[error("applied entry {0} carries no event")]
    MissingEvent(u64),

    #[error("entry {sequence} cannot be replayed: {source}")]
    Event {
        sequence: u64,
        #[source]
        source: EventError,
    },
}
