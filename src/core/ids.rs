//! Stable identifiers for budget lines and expenditures.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a budget line, as printed in the budget nomenclature
/// (for example `"61-2-311"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetLineId(String);

impl BudgetLineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BudgetLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BudgetLineId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BudgetLineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of an expenditure record. Generated by the engine at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(Uuid);

impl ExpenseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_expense_ids_are_unique() {
        assert_ne!(ExpenseId::new(), ExpenseId::new());
    }

    #[test]
    fn budget_line_id_serializes_as_plain_string() {
        let id = BudgetLineId::from("61-2-311");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"61-2-311\"");
        assert_eq!(id.to_string(), "61-2-311");
    }
}
