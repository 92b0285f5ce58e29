//! Workflow phases and the roles allowed to perform them.

use super::actor::Role;
use super::status::ExpenseStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A step a caller may ask the engine to perform on an expenditure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Creation,
    Engagement,
    Liquidation,
    Ordonnancement,
    Paiement,
    Annulation,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Creation,
        Phase::Engagement,
        Phase::Liquidation,
        Phase::Ordonnancement,
        Phase::Paiement,
        Phase::Annulation,
    ];

    /// Status a record holds once this phase has been applied.
    pub fn target_status(self) -> ExpenseStatus {
        match self {
            Phase::Creation => ExpenseStatus::Brouillon,
            Phase::Engagement => ExpenseStatus::Engage,
            Phase::Liquidation => ExpenseStatus::Liquide,
            Phase::Ordonnancement => ExpenseStatus::Ordonnance,
            Phase::Paiement => ExpenseStatus::Paye,
            Phase::Annulation => ExpenseStatus::Annule,
        }
    }

    pub fn required_roles(self) -> &'static [Role] {
        match self {
            Phase::Creation | Phase::Engagement | Phase::Liquidation | Phase::Ordonnancement => {
                &[Role::Ordonnateur]
            }
            Phase::Paiement => &[Role::Comptable],
            Phase::Annulation => &[Role::Administrateur, Role::Ordonnateur],
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.required_roles().contains(&role)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Creation => "Création",
            Phase::Engagement => "Engagement",
            Phase::Liquidation => "Liquidation",
            Phase::Ordonnancement => "Ordonnancement",
            Phase::Paiement => "Paiement",
            Phase::Annulation => "Annulation",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
