//! Budget ledger: allocated credit and commitments per budget line.
//!
//! Each line sits behind its own mutex, so a reservation is a single
//! check-and-update that no other caller can observe half-applied. Distinct
//! lines never contend; the index lock is only taken for writing when a line
//! is published.

mod error;
mod line;

pub use error::LedgerError;
pub use line::BudgetLine;

use crate::core::{Amount, BudgetLineId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type LineSlot = Arc<Mutex<BudgetLine>>;

/// Credit movement on one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditMove {
    Reserve(Amount),
    Release(Amount),
}

impl CreditMove {
    fn apply(self, line: &mut BudgetLine) -> Result<(), LedgerError> {
        let committed = match self {
            CreditMove::Reserve(amount) => line
                .committed
                .checked_add(amount)
                .filter(|committed| *committed <= line.allocated)
                .ok_or_else(|| LedgerError::InsufficientCredit {
                    line: line.id.clone(),
                    requested: amount,
                    available: line.available(),
                })?,
            CreditMove::Release(amount) => {
                line.committed
                    .checked_sub(amount)
                    .ok_or_else(|| LedgerError::InvariantViolation {
                        line: line.id.clone(),
                        reason: format!(
                            "release of {} would drive committed {} below zero",
                            amount, line.committed
                        ),
                    })?
            }
        };
        line.committed = committed;
        Ok(())
    }
}

/// Registry of published budget lines and their commitments.
#[derive(Debug, Default)]
pub struct BudgetLedger {
    lines: RwLock<HashMap<BudgetLineId, LineSlot>>,
}

impl BudgetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from already-published lines, e.g. when restoring.
    pub fn with_lines(lines: impl IntoIterator<Item = BudgetLine>) -> Result<Self, LedgerError> {
        let ledger = Self::new();
        for line in lines {
            ledger.publish(line)?;
        }
        Ok(ledger)
    }

    /// Publish a budget line. Lines are never replaced or removed afterwards.
    pub fn publish(&self, line: BudgetLine) -> Result<(), LedgerError> {
        if !line.is_consistent() {
            return Err(LedgerError::InvariantViolation {
                line: line.id.clone(),
                reason: format!(
                    "committed {} exceeds allocated {}",
                    line.committed, line.allocated
                ),
            });
        }

        let mut lines = self.lines.write();
        if lines.contains_key(&line.id) {
            return Err(LedgerError::DuplicateLine(line.id));
        }
        debug!(line = %line.id, allocated = %line.allocated, "budget line published");
        lines.insert(line.id.clone(), Arc::new(Mutex::new(line)));
        Ok(())
    }

    fn slot(&self, id: &BudgetLineId) -> Result<LineSlot, LedgerError> {
        self.lines
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownLine(id.clone()))
    }

    /// Commit `amount` against the line if it fits in the remaining credit.
    ///
    /// Returns the credit still available after the reservation.
    pub fn reserve(&self, id: &BudgetLineId, amount: Amount) -> Result<Amount, LedgerError> {
        self.apply(id, CreditMove::Reserve(amount))
    }

    /// Give back `amount` previously reserved on the line.
    ///
    /// Releasing more than is committed means the books are wrong upstream;
    /// the line is left untouched and an `InvariantViolation` is returned.
    pub fn release(&self, id: &BudgetLineId, amount: Amount) -> Result<Amount, LedgerError> {
        self.apply(id, CreditMove::Release(amount))
    }

    fn apply(&self, id: &BudgetLineId, movement: CreditMove) -> Result<Amount, LedgerError> {
        let slot = self.slot(id)?;
        let mut line = slot.lock();
        movement.apply(&mut line)?;
        debug!(line = %id, ?movement, available = %line.available(), "credit moved");
        Ok(line.available())
    }

    /// Apply `movement` and run `commit` while the line stays locked.
    ///
    /// If `commit` fails the line is put back exactly as it was before the
    /// lock is released, so no other caller ever sees the movement.
    pub fn settle<T, E>(
        &self,
        id: &BudgetLineId,
        movement: CreditMove,
        commit: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<LedgerError>,
    {
        let slot = self.slot(id)?;
        let mut line = slot.lock();
        let committed = line.committed;

        movement.apply(&mut line)?;
        match commit() {
            Ok(value) => {
                debug!(line = %id, ?movement, available = %line.available(), "credit settled");
                Ok(value)
            }
            Err(err) => {
                line.committed = committed;
                debug!(line = %id, ?movement, "credit movement reverted");
                Err(err)
            }
        }
    }

    pub fn available_credit(&self, id: &BudgetLineId) -> Result<Amount, LedgerError> {
        Ok(self.slot(id)?.lock().available())
    }

    /// Copy of the line as it stands now.
    pub fn line(&self, id: &BudgetLineId) -> Result<BudgetLine, LedgerError> {
        Ok(self.slot(id)?.lock().clone())
    }

    /// Copies of every line, ordered by id.
    pub fn lines(&self) -> Vec<BudgetLine> {
        let slots: Vec<LineSlot> = self.lines.read().values().cloned().collect();
        let mut lines: Vec<BudgetLine> = slots.iter().map(|slot| slot.lock().clone()).collect();
        lines.sort_by(|a, b| a.id.cmp(&b.id));
        lines
    }

    pub fn contains(&self, id: &BudgetLineId) -> bool {
        self.lines.read().contains_key(id)
    }
}
