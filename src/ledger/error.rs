//! Ledger error types.

use crate::core::{Amount, BudgetLineId};
use crate::error::WorkflowError;
use thiserror::Error;

/// Errors raised by `BudgetLedger` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unknown budget line {0}")]
    UnknownLine(BudgetLineId),

    #[error("budget line {0} is already published")]
    DuplicateLine(BudgetLineId),

    #[error("insufficient credit on budget line {line}: requested {requested}, available {available}")]
    InsufficientCredit {
        line: BudgetLineId,
        requested: Amount,
        available: Amount,
    },

    /// Bookkeeping is inconsistent. Never clamped or repaired.
    #[error("ledger invariant violated on budget line {line}: {reason}")]
    InvariantViolation { line: BudgetLineId, reason: String },
}

impl From<LedgerError> for WorkflowError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownLine(line) => WorkflowError::UnknownBudgetLine(line),
            LedgerError::InsufficientCredit {
                line,
                requested,
                available,
            } => WorkflowError::InsufficientCredit {
                line,
                requested,
                available,
            },
            other @ (LedgerError::DuplicateLine(_) | LedgerError::InvariantViolation { .. }) => {
                WorkflowError::InvariantViolation(other.to_string())
            }
        }
    }
}
