//! Errors surfaced by the workflow engine.

use crate::core::{Amount, BudgetLineId, ExpenseId, ExpenseStatus, Phase, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a transition attempt was refused.
///
/// Every variant except `InvariantViolation` and `Storage` is a user-level
/// rejection the caller can act on. Those two indicate a defect or a storage
/// fault and are never auto-corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("insufficient credit on budget line {line}: requested {requested}, available {available}")]
    InsufficientCredit {
        line: BudgetLineId,
        requested: Amount,
        available: Amount,
    },

    #[error("illegal transition: {phase} is not allowed from status {from}")]
    IllegalTransition { from: ExpenseStatus, phase: Phase },

    #[error("role mismatch for {phase}: {role} {reason}")]
    RoleMismatch {
        phase: Phase,
        role: Role,
        reason: String,
    },

    #[error("invalid amount for {phase}: {reason}")]
    InvalidAmount { phase: Phase, reason: String },

    #[error("missing attestation for {phase}: {reason}")]
    MissingAttestation { phase: Phase, reason: String },

    #[error("cancellation requires a non-empty justification")]
    MissingJustification,

    #[error("unknown expense {0}")]
    UnknownExpense(ExpenseId),

    #[error("unknown budget line {0}")]
    UnknownBudgetLine(BudgetLineId),

    #[error("expense does not match budget line {line}: {reason}")]
    LineMismatch { line: BudgetLineId, reason: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("audit storage failure: {0}")]
    Storage(String),
}

/// Stable reason code of a `WorkflowError`, as recorded in the audit trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InsufficientCredit,
    IllegalTransition,
    RoleMismatch,
    InvalidAmount,
    MissingAttestation,
    MissingJustification,
    UnknownExpense,
    UnknownBudgetLine,
    LineMismatch,
    InvariantViolation,
    Storage,
}

impl ErrorKind {
    /// Defects and storage faults, as opposed to rejected requests.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::InvariantViolation | ErrorKind::Storage)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::InsufficientCredit { .. } => ErrorKind::InsufficientCredit,
            WorkflowError::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            WorkflowError::RoleMismatch { .. } => ErrorKind::RoleMismatch,
            WorkflowError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            WorkflowError::MissingAttestation { .. } => ErrorKind::MissingAttestation,
            WorkflowError::MissingJustification => ErrorKind::MissingJustification,
            WorkflowError::UnknownExpense(_) => ErrorKind::UnknownExpense,
            WorkflowError::UnknownBudgetLine(_) => ErrorKind::UnknownBudgetLine,
            WorkflowError::LineMismatch { .. } => ErrorKind::LineMismatch,
            WorkflowError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            WorkflowError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = WorkflowError::InvalidAmount {
            phase: Phase::Liquidation,
            reason: "620000 exceeds engaged 600000".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        assert!(!err.is_fatal());
        assert!(WorkflowError::InvariantViolation("x".into()).is_fatal());
        assert!(WorkflowError::Storage("disk".into()).is_fatal());
    }

    #[test]
    fn message_names_line_and_amounts() {
        let err = WorkflowError::InsufficientCredit {
            line: BudgetLineId::from("61-2-311"),
            requested: Amount::new(500_000),
            available: Amount::new(400_000),
        };
        assert_eq!(
            err.to_string(),
            "insufficient credit on budget line 61-2-311: requested 500000, available 400000"
        );
    }
}
