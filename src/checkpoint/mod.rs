//! Versioned snapshots of the whole engine state.
//!
//! A snapshot carries the budget lines, every expense record and the full
//! audit trail. It is what the persistence layer writes and reads; the engine
//! itself stays storage-agnostic. Snapshots are validated before an engine is
//! rebuilt from them, so a corrupt or hand-edited file cannot produce books
//! that disagree with themselves.

use crate::audit::{replay, AuditEntry, MemoryAuditStore};
use crate::config::WorkflowPolicy;
use crate::core::{Amount, BudgetLineId, ExpenseId};
use crate::engine::{Clock, PhaseTransitionEngine};
use crate::expense::ExpenseRecord;
use crate::ledger::{BudgetLedger, BudgetLine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable image of an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub taken_at: DateTime<Utc>,

    pub budget_lines: Vec<BudgetLine>,

    pub expenses: Vec<ExpenseRecord>,

    /// Complete audit trail, ordered by timestamp then sequence
    pub audit: Vec<AuditEntry>,
}

impl EngineSnapshot {
    pub fn new(
        taken_at: DateTime<Utc>,
        budget_lines: Vec<BudgetLine>,
        expenses: Vec<ExpenseRecord>,
        audit: Vec<AuditEntry>,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            taken_at,
            budget_lines,
            expenses,
            audit,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::SerializationFailed {
            format: "json",
            reason: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| CheckpointError::DeserializationFailed {
            format: "json",
            reason: e.to_string(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed {
            format: "bincode",
            reason: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes).map_err(|e| CheckpointError::DeserializationFailed {
            format: "bincode",
            reason: e.to_string(),
        })
    }

    /// Check that lines, records and audit trail agree with each other.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let lines: HashMap<&BudgetLineId, &BudgetLine> =
            self.budget_lines.iter().map(|line| (&line.id, line)).collect();
        if lines.len() != self.budget_lines.len() {
            return Err(invalid("duplicate budget line"));
        }

        let mut committed: HashMap<&BudgetLineId, Amount> = HashMap::new();
        for record in &self.expenses {
            if !lines.contains_key(&record.budget_line) {
                return Err(invalid(format!(
                    "expense {} references unknown budget line {}",
                    record.id, record.budget_line
                )));
            }
            if !record.amounts().is_ordered() {
                return Err(invalid(format!("expense {} amounts are out of order", record.id)));
            }
            let total = committed.entry(&record.budget_line).or_default();
            *total = total
                .checked_add(record.committed_credit())
                .ok_or_else(|| invalid(format!("commitments on {} overflow", record.budget_line)))?;
        }

        for line in &self.budget_lines {
            if !line.is_consistent() {
                return Err(invalid(format!(
                    "budget line {} commits {} of {}",
                    line.id, line.committed, line.allocated
                )));
            }
            let expected = committed.get(&line.id).copied().unwrap_or_default();
            if line.committed != expected {
                return Err(invalid(format!(
                    "budget line {} commits {} but its expenses hold {}",
                    line.id, line.committed, expected
                )));
            }
        }

        let mut trails: BTreeMap<ExpenseId, Vec<AuditEntry>> = BTreeMap::new();
        for entry in &self.audit {
            trails.entry(entry.expense_id).or_default().push(entry.clone());
        }
        for record in &self.expenses {
            let trail = trails.get(&record.id).map(Vec::as_slice).unwrap_or_default();
            let replayed = replay(trail)
                .map_err(|e| invalid(format!("expense {}: {e}", record.id)))?;
            if replayed.as_ref() != Some(record) {
                return Err(invalid(format!(
                    "expense {} does not match its audit trail",
                    record.id
                )));
            }
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> CheckpointError {
    CheckpointError::ValidationFailed(reason.into())
}

impl PhaseTransitionEngine {
    /// Rebuild an engine from a validated snapshot. The audit trail is
    /// reloaded into a `MemoryAuditStore`.
    pub fn restore(
        snapshot: EngineSnapshot,
        policy: WorkflowPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CheckpointError> {
        snapshot.validate()?;

        let ledger = BudgetLedger::with_lines(snapshot.budget_lines)
            .map_err(|e| invalid(e.to_string()))?;
        let audit = MemoryAuditStore::from_entries(snapshot.audit)
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self::from_parts(
            Arc::new(ledger),
            Arc::new(audit),
            clock,
            policy,
            snapshot.expenses,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{cancel, engage};
    use crate::core::{Actor, Category};
    use crate::engine::SystemClock;
    use crate::expense::ExpenseDraft;

    fn populated() -> PhaseTransitionEngine {
        let ledger = Arc::new(BudgetLedger::new());
        ledger
            .publish(BudgetLine::new("61-2-311", "Fournitures", 2026, "XOF", Amount::new(1_000_000)))
            .unwrap();
        let engine = PhaseTransitionEngine::new(ledger);
        let ord = Actor::ordonnateur("A");
        for amount in [200_000, 300_000] {
            let draft = ExpenseDraft::builder("61-2-311")
                .vendor("Librairie de France")
                .fiscal_year(2026)
                .category(Category::Fonctionnement)
                .montant_demande(amount)
                .build()
                .unwrap();
            let id = engine.create_expense(draft, ord.clone()).unwrap().id;
            engine
                .apply_transition(engage(id, ord.clone(), Amount::new(amount)))
                .unwrap();
            if amount == 200_000 {
                engine
                    .apply_transition(cancel(id, Actor::administrateur("ADM"), "erreur"))
                    .unwrap();
            }
        }
        engine
    }

    #[test]
    fn snapshot_validates_and_survives_json() {
        let snapshot = populated().snapshot();
        snapshot.validate().unwrap();

        let json = snapshot.to_json().unwrap();
        let restored = EngineSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn restore_from_bytes_rebuilds_engine() {
        let engine = populated();
        let snapshot = engine.snapshot();
        let bytes = snapshot.to_bytes().unwrap();

        let restored = PhaseTransitionEngine::restore(
            EngineSnapshot::from_bytes(&bytes).unwrap(),
            WorkflowPolicy::default(),
            Arc::new(SystemClock),
        )
        .unwrap();

        assert_eq!(restored.expenses(), engine.expenses());
        assert_eq!(restored.ledger().lines(), engine.ledger().lines());
        assert_eq!(restored.audit_trail().len(), engine.audit_trail().len());
        assert_eq!(
            restored
                .ledger()
                .available_credit(&"61-2-311".into())
                .unwrap(),
            Amount::new(700_000)
        );
    }

    #[test]
    fn snapshot_is_stamped_by_engine_clock() {
        let start = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 12, 31, 23, 0, 0).unwrap();
        let engine = PhaseTransitionEngine::builder()
            .ledger(Arc::new(BudgetLedger::new()))
            .clock(Arc::new(crate::engine::ManualClock::new(start)))
            .build()
            .unwrap();

        assert_eq!(engine.snapshot().taken_at, start);
    }

    #[test]
    fn garbage_bytes_report_codec() {
        let err = EngineSnapshot::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::DeserializationFailed { format: "bincode", .. }
        ));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.version = 99;
        assert!(matches!(
            snapshot.validate(),
            Err(CheckpointError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn tampered_commitment_is_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.budget_lines[0].committed = Amount::new(100_000);
        assert!(matches!(
            snapshot.validate(),
            Err(CheckpointError::ValidationFailed(_))
        ));
    }

    #[test]
    fn record_diverging_from_trail_is_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.expenses[0].vendor = "Autre fournisseur".to_string();
        let err = PhaseTransitionEngine::restore(
            snapshot,
            WorkflowPolicy::default(),
            Arc::new(SystemClock),
        )
        .err();
        assert!(matches!(err, Some(CheckpointError::ValidationFailed(_))));
    }
}
