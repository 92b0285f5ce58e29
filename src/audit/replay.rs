//! Rebuilding a record from its audit entries.

use super::entry::AuditEntry;
use super::error::ReplayError;
use crate::expense::ExpenseRecord;
use chrono::{DateTime, Utc};

/// Fold the applied entries of one expense, in `expense_sequence` order.
///
/// Rejected entries are skipped. Returns `None` when no creation was applied.
pub fn replay(entries: &[AuditEntry]) -> Result<Option<ExpenseRecord>, ReplayError> {
    replay_filtered(entries, |_| true)
}

/// State of the record as it stood at `instant`.
///
/// Only entries stamped at or before `instant` are folded.
pub fn replay_until(
    entries: &[AuditEntry],
    instant: DateTime<Utc>,
) -> Result<Option<ExpenseRecord>, ReplayError> {
    replay_filtered(entries, |entry| entry.timestamp <= instant)
}

fn replay_filtered<F>(entries: &[AuditEntry], keep: F) -> Result<Option<ExpenseRecord>, ReplayError>
where
    F: Fn(&AuditEntry) -> bool,
{
    let mut ordered: Vec<&AuditEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.expense_sequence);

    if let Some(first) = ordered.first() {
        if let Some(other) = ordered.iter().find(|e| e.expense_id != first.expense_id) {
            return Err(ReplayError::MixedExpenses {
                first: first.expense_id,
                other: other.expense_id,
            });
        }
    }
    if let Some(pair) = ordered
        .windows(2)
        .find(|pair| pair[0].expense_sequence == pair[1].expense_sequence)
    {
        return Err(ReplayError::DuplicateSequence(pair[1].expense_sequence));
    }

    let mut record: Option<ExpenseRecord> = None;
    for entry in ordered.into_iter().filter(|e| e.outcome.is_applied() && keep(*e)) {
        let event = entry
            .event
            .as_ref()
            .ok_or(ReplayError::MissingEvent(entry.sequence))?;
        let wrap = |source| ReplayError::Event {
            sequence: entry.sequence,
            source,
        };
        record = Some(match record.take() {
            None => event.open().map_err(wrap)?,
            Some(mut current) => {
                current.apply(event).map_err(wrap)?;
                current
            }
        });
    }
    Ok(record)
}
