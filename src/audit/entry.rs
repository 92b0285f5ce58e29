use crate::core::{Actor, ExpenseId, Phase};
use crate::error::{ErrorKind, WorkflowError};
use crate::expense::{AmountSnapshot, ExpenseEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one transition attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Applied,
    Rejected {
        reason: ErrorKind,
        message: String,
        /// Every violation found, the reported `reason` first.
        violations: Vec<ErrorKind>,
    },
}

impl Outcome {
    pub fn rejected(errors: &[WorkflowError]) -> Self {
        let reason = errors
            .first()
            .map(WorkflowError::kind)
            .unwrap_or(ErrorKind::InvariantViolation);
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Outcome::Rejected {
            reason,
            message,
            violations: errors.iter().map(WorkflowError::kind).collect(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    pub fn reason(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Applied => None,
            Outcome::Rejected { reason, .. } => Some(*reason),
        }
    }
}

/// An attempt as submitted to the store, before it is sequenced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditDraft {
    pub expense_id: ExpenseId,
    pub phase: Phase,
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
    pub before: Option<AmountSnapshot>,
    pub after: Option<AmountSnapshot>,
    pub event: Option<ExpenseEvent>,
    pub metadata: BTreeMap<String, String>,
}

/// One immutable line of the audit trail.
///
/// `sequence` is unique and increasing across the whole trail;
/// `expense_sequence` counts 1, 2, 3, ... per expense in application order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub expense_sequence: u64,
    pub expense_id: ExpenseId,
    pub phase: Phase,
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
    pub before: Option<AmountSnapshot>,
    pub after: Option<AmountSnapshot>,
    /// The folded event, present exactly when the outcome is `Applied`.
    pub event: Option<ExpenseEvent>,
    pub metadata: BTreeMap<String, String>,
}

impl AuditEntry {
    pub(crate) fn sequenced(draft: AuditDraft, sequence: u64, expense_sequence: u64) -> Self {
        Self {
            sequence,
            expense_sequence,
            expense_id: draft.expense_id,
            phase: draft.phase,
            actor: draft.actor,
            timestamp: draft.timestamp,
            outcome: draft.outcome,
            before: draft.before,
            after: draft.after,
            event: draft.event,
            metadata: draft.metadata,
        }
    }
}
