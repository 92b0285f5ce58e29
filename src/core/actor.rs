//! Asserted identities and the roles they act under.
//!
//! Authentication happens outside the engine. An `Actor` is whatever the
//! caller asserts; the engine only checks the role against the phase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role classes of public-finance officers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Authorizing officer: creates, engages, liquidates and orders payment.
    Ordonnateur,
    /// Accounting officer: executes payment and is personally liable for it.
    Comptable,
    /// Budget administrator: may cancel.
    Administrateur,
    /// Inspection Générale des Finances: reads, never acts.
    #[serde(rename = "IGF")]
    Igf,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Ordonnateur,
        Role::Comptable,
        Role::Administrateur,
        Role::Igf,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::Ordonnateur => "Ordonnateur",
            Role::Comptable => "Comptable",
            Role::Administrateur => "Administrateur",
            Role::Igf => "IGF",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity asserted by the caller for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn ordonnateur(id: impl Into<String>) -> Self {
        Self::new(id, Role::Ordonnateur)
    }

    pub fn comptable(id: impl Into<String>) -> Self {
        Self::new(id, Role::Comptable)
    }

    pub fn administrateur(id: impl Into<String>) -> Self {
        Self::new(id, Role::Administrateur)
    }

    /// Same person, regardless of the role asserted.
    pub fn same_identity(&self, other: &Actor) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
