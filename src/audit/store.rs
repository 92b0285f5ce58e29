//! Append-only storage for audit entries.

use super::entry::{AuditDraft, AuditEntry};
use super::error::AuditError;
use crate::core::ExpenseId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Port for persisting the audit trail.
///
/// Implementations assign `sequence` and `expense_sequence` atomically with
/// the write, so two appends for the same expense are always numbered in the
/// order they were stored. `append` is the only write; nothing is ever
/// updated or deleted.
pub trait AuditStore: Send + Sync {
    fn append(&self, draft: AuditDraft) -> Result<AuditEntry, AuditError>;

    /// Entries of one expense in application order.
    fn entries_for(&self, expense_id: &ExpenseId) -> Vec<AuditEntry>;

    /// Every entry, ordered by timestamp then sequence.
    fn entries(&self) -> Vec<AuditEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct AuditLog {
    entries: Vec<AuditEntry>,
    by_expense: HashMap<ExpenseId, Vec<usize>>,
}

impl AuditLog {
    fn push(&mut self, entry: AuditEntry) {
        self.by_expense
            .entry(entry.expense_id)
            .or_default()
            .push(self.entries.len());
        self.entries.push(entry);
    }
}

/// In-memory audit trail.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    log: RwLock<AuditLog>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload previously persisted entries.
    ///
    /// Sequences must be strictly increasing and each expense's
    /// `expense_sequence` must run 1, 2, 3, ... without gaps.
    pub fn from_entries(entries: Vec<AuditEntry>) -> Result<Self, AuditError> {
        let mut log = AuditLog::default();
        let mut sorted = entries;
        sorted.sort_by_key(|entry| entry.sequence);

        for entry in sorted {
            if let Some(last) = log.entries.last() {
                if entry.sequence <= last.sequence {
                    return Err(AuditError::OutOfOrder {
                        sequence: entry.sequence,
                        reason: "duplicate sequence".to_string(),
                    });
                }
            }
            let expected = log
                .by_expense
                .get(&entry.expense_id)
                .map_or(0, Vec::len) as u64
                + 1;
            if entry.expense_sequence != expected {
                return Err(AuditError::OutOfOrder {
                    sequence: entry.sequence,
                    reason: format!(
                        "expense {} expected sequence {}, found {}",
                        entry.expense_id, expected, entry.expense_sequence
                    ),
                });
            }
            log.push(entry);
        }

        Ok(Self {
            log: RwLock::new(log),
        })
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, draft: AuditDraft) -> Result<AuditEntry, AuditError> {
        let mut log = self.log.write();
        let sequence = log.entries.last().map_or(0, |last| last.sequence) + 1;
        let expense_sequence = log
            .by_expense
            .get(&draft.expense_id)
            .map_or(0, Vec::len) as u64
            + 1;

        let entry = AuditEntry::sequenced(draft, sequence, expense_sequence);
        log.push(entry.clone());
        Ok(entry)
    }

    fn entries_for(&self, expense_id: &ExpenseId) -> Vec<AuditEntry> {
        let log = self.log.read();
        log.by_expense
            .get(expense_id)
            .map(|indices| indices.iter().map(|&i| log.entries[i].clone()).collect())
            .unwrap_or_default()
    }

    fn entries(&self) -> Vec<AuditEntry> {
        let mut entries = self.log.read().entries.clone();
        entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.sequence.cmp(&b.sequence))
        });
        entries
    }

    fn len(&self) -> usize {
        self.log.read().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Outcome;
    use crate::core::{Actor, Phase};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn draft(expense_id: ExpenseId, minutes: i64) -> AuditDraft {
        AuditDraft {
            expense_id,
            phase: Phase::Engagement,
            actor: Actor::ordonnateur("A"),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
                + Duration::minutes(minutes),
            outcome: Outcome::Applied,
            before: None,
            after: None,
            event: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn append_assigns_global_and_per_expense_sequences() {
        let store = MemoryAuditStore::new();
        let (e1, e2) = (ExpenseId::new(), ExpenseId::new());

        let a = store.append(draft(e1, 0)).unwrap();
        let b = store.append(draft(e2, 1)).unwrap();
        let c = store.append(draft(e1, 2)).unwrap();

        assert_eq!((a.sequence, a.expense_sequence), (1, 1));
        assert_eq!((b.sequence, b.expense_sequence), (2, 1));
        assert_eq!((c.sequence, c.expense_sequence), (3, 2));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn entries_for_returns_only_that_expense_in_order() {
        let store = MemoryAuditStore::new();
        let (e1, e2) = (ExpenseId::new(), ExpenseId::new());
        store.append(draft(e1, 0)).unwrap();
        store.append(draft(e2, 1)).unwrap();
        store.append(draft(e1, 2)).unwrap();

        let seqs: Vec<u64> = store
            .entries_for(&e1)
            .iter()
            .map(|e| e.expense_sequence)
            .collect();
        assert_eq!(seqs, vec![1, 2]);
        assert!(store.entries_for(&ExpenseId::new()).is_empty());
    }

    #[test]
    fn entries_order_by_timestamp_then_sequence() {
        let store = MemoryAuditStore::new();
        let e1 = ExpenseId::new();
        store.append(draft(e1, 10)).unwrap();
        store.append(draft(e1, 5)).unwrap();
        store.append(draft(e1, 5)).unwrap();

        let order: Vec<u64> = store.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn concurrent_appends_keep_sequences_unique() {
        let store = MemoryAuditStore::new();
        let e1 = ExpenseId::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for i in 0..25 {
                        store.append(draft(e1, i)).unwrap();
                    }
                });
            }
        });

        let mut seqs: Vec<u64> = store.entries_for(&e1).iter().map(|e| e.expense_sequence).collect();
        assert_eq!(seqs.len(), 200);
        seqs.dedup();
        assert_eq!(seqs, (1..=200).collect::<Vec<u64>>());
    }

    #[test]
    fn from_entries_rejects_gaps() {
        let source = MemoryAuditStore::new();
        let e1 = ExpenseId::new();
        source.append(draft(e1, 0)).unwrap();
        source.append(draft(e1, 1)).unwrap();

        let mut entries = source.entries();
        let restored = MemoryAuditStore::from_entries(entries.clone()).unwrap();
        assert_eq!(restored.entries(), entries);

        entries.remove(0);
        assert!(matches!(
            MemoryAuditStore::from_entries(entries),
            Err(AuditError::OutOfOrder { .. })
        ));
    }
}
