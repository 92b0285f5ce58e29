//! Facts that move an expenditure forward, and the pure fold over them.
//!
//! The engine decides *whether* something may happen; an `ExpenseEvent` is
//! the record that it did. Folding the events of one expense in order yields
//! its current state, which is how the audit trail is replayed.

use super::record::{ExpenseDraft, ExpenseRecord, PaymentDetails, PhaseStamp};
use crate::core::{Amount, ExpenseId, ExpenseStatus, Phase, State};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseEvent {
    Created {
        id: ExpenseId,
        draft: ExpenseDraft,
        stamp: PhaseStamp,
    },
    Engaged {
        amount: Amount,
        stamp: PhaseStamp,
    },
    Liquidated {
        amount: Amount,
        stamp: PhaseStamp,
    },
    Ordonnanced {
        amount: Amount,
        reference: Option<String>,
        stamp: PhaseStamp,
    },
    Paid {
        amount: Amount,
        payment: Option<PaymentDetails>,
        stamp: PhaseStamp,
    },
    Cancelled {
        justification: String,
        /// Credit handed back to the budget line, if any was held.
        released: Option<Amount>,
        stamp: PhaseStamp,
    },
}

/// An event that cannot be folded onto the record it was given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("expense {0} already exists")]
    AlreadyCreated(ExpenseId),

    #[error("first event of an expense must be its creation, got {0}")]
    NotCreated(Phase),

    #[error("{phase} cannot be applied to a record in status {status}")]
    IllegalEvent { status: ExpenseStatus, phase: Phase },

    #[error("{phase} amount {amount} breaks the amount ordering (ceiling {ceiling:?})")]
    AmountOrder {
        phase: Phase,
        amount: Amount,
        ceiling: Option<Amount>,
    },

    #[error("released credit {released:?} does not match engaged amount {engaged:?}")]
    ReleaseMismatch {
        released: Option<Amount>,
        engaged: Option<Amount>,
    },
}

impl ExpenseEvent {
    pub fn phase(&self) -> Phase {
        match self {
            ExpenseEvent::Created { .. } => Phase::Creation,
            ExpenseEvent::Engaged { .. } => Phase::Engagement,
            ExpenseEvent::Liquidated { .. } => Phase::Liquidation,
            ExpenseEvent::Ordonnanced { .. } => Phase::Ordonnancement,
            ExpenseEvent::Paid { .. } => Phase::Paiement,
            ExpenseEvent::Cancelled { .. } => Phase::Annulation,
        }
    }

    pub fn stamp(&self) -> &PhaseStamp {
        match self {
            ExpenseEvent::Created { stamp, .. }
            | ExpenseEvent::Engaged { stamp, .. }
            | ExpenseEvent::Liquidated { stamp, .. }
            | ExpenseEvent::Ordonnanced { stamp, .. }
            | ExpenseEvent::Paid { stamp, .. }
            | ExpenseEvent::Cancelled { stamp, .. } => stamp,
        }
    }

    /// Open a record from its creation event.
    pub fn open(&self) -> Result<ExpenseRecord, EventError> {
        match self {
            ExpenseEvent::Created { id, draft, stamp } => {
                Ok(ExpenseRecord::from_draft(*id, draft, stamp.clone()))
            }
            other => Err(EventError::NotCreated(other.phase())),
        }
    }
}

fn within(phase: Phase, amount: Amount, ceiling: Option<Amount>) -> Result<(), EventError> {
    match ceiling {
        Some(ceiling) if !amount.is_zero() && amount <= ceiling => Ok(()),
        _ => Err(EventError::AmountOrder {
            phase,
            amount,
            ceiling,
        }),
    }
}

impl ExpenseRecord {
    /// Fold one event onto the record.
    ///
    /// Re-checks the status edge and the amount ordering so that a corrupt
    /// event stream cannot produce an inconsistent record. On error the
    /// record is left unchanged.
    pub fn apply(&mut self, event: &ExpenseEvent) -> Result<(), EventError> {
        let phase = event.phase();

        match event {
            ExpenseEvent::Created { id, .. } => return Err(EventError::AlreadyCreated(*id)),
            _ if !self.status.can_transition_to(&phase.target_status()) => {
                return Err(EventError::IllegalEvent {
                    status: self.status,
                    phase,
                });
            }
            ExpenseEvent::Engaged { amount, stamp } => {
                if amount.is_zero() {
                    return Err(EventError::AmountOrder {
                        phase,
                        amount: *amount,
                        ceiling: None,
                    });
                }
                self.montant_engage = Some(*amount);
                self.engagement = Some(stamp.clone());
            }
            ExpenseEvent::Liquidated { amount, stamp } => {
                within(phase, *amount, self.montant_engage)?;
                self.montant_liquide = Some(*amount);
                self.service_fait = true;
                self.liquidation = Some(stamp.clone());
            }
            ExpenseEvent::Ordonnanced {
                amount,
                reference,
                stamp,
            } => {
                within(phase, *amount, self.montant_liquide)?;
                self.montant_ordonnance = Some(*amount);
                self.ordonnancement_reference = reference.clone();
                self.ordonnancement = Some(stamp.clone());
            }
            ExpenseEvent::Paid {
                amount,
                payment,
                stamp,
            } => {
                within(phase, *amount, self.montant_ordonnance)?;
                self.montant_paye = Some(*amount);
                self.payment = payment.clone();
                self.paiement = Some(stamp.clone());
            }
            ExpenseEvent::Cancelled {
                justification,
                released,
                stamp,
            } => {
                let held = self.status.holds_commitment().then_some(self.montant_engage);
                if *released != held.flatten() {
                    return Err(EventError::ReleaseMismatch {
                        released: *released,
                        engaged: self.montant_engage,
                    });
                }
                self.cancellation_justification = Some(justification.clone());
                self.annulation = Some(stamp.clone());
            }
        }

        self.status = phase.target_status();
        Ok(())
    }
}
