use crate::core::{Amount, BudgetLineId};
use serde::{Deserialize, Serialize};

/// One allocated-credit bucket of the fiscal year's budget.
///
/// `allocated` is fixed at publication. `committed` only moves through
/// `BudgetLedger::reserve` and `BudgetLedger::release`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub id: BudgetLineId,
    pub label: String,
    pub fiscal_year: i32,
    /// ISO-4217 code, e.g. `XOF`.
    pub currency: String,
    pub allocated: Amount,
    pub committed: Amount,
}

impl BudgetLine {
    /// A freshly voted line with nothing committed yet.
    pub fn new(
        id: impl Into<BudgetLineId>,
        label: impl Into<String>,
        fiscal_year: i32,
        currency: impl Into<String>,
        allocated: Amount,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            fiscal_year,
            currency: currency.into(),
            allocated,
            committed: Amount::ZERO,
        }
    }

    pub fn available(&self) -> Amount {
        self.allocated.saturating_sub(self.committed)
    }

    pub fn is_consistent(&self) -> bool {
        self.committed <= self.allocated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_is_allocated_minus_committed() {
        let mut line = BudgetLine::new("61-2-311", "Fournitures", 2026, "XOF", Amount::new(1_000_000));
        assert_eq!(line.available(), Amount::new(1_000_000));
        line.committed = Amount::new(600_000);
        assert_eq!(line.available(), Amount::new(400_000));
        assert!(line.is_consistent());
    }
}
