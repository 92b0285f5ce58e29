//! Builder for expense drafts.

use crate::builder::error::BuildError;
use crate::core::{Amount, BudgetLineId, Category};
use crate::expense::ExpenseDraft;
use std::collections::BTreeMap;

/// Builder for an [`ExpenseDraft`]. Currency defaults to `XOF`.
#[derive(Clone, Debug)]
pub struct ExpenseDraftBuilder {
    budget_line: BudgetLineId,
    vendor: Option<String>,
    object: Option<String>,
    currency: String,
    fiscal_year: Option<i32>,
    category: Option<Category>,
    montant_demande: Option<Amount>,
    metadata: BTreeMap<String, String>,
}

impl ExpenseDraft {
    pub fn builder(budget_line: impl Into<BudgetLineId>) -> ExpenseDraftBuilder {
        ExpenseDraftBuilder::new(budget_line)
    }
}

impl ExpenseDraftBuilder {
    pub fn new(budget_line: impl Into<BudgetLineId>) -> Self {
        Self {
            budget_line: budget_line.into(),
            vendor: None,
            object: None,
            currency: "XOF".to_string(),
            fiscal_year: None,
            category: None,
            montant_demande: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn fiscal_year(mut self, year: i32) -> Self {
        self.fiscal_year = Some(year);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn montant_demande(mut self, amount: impl Into<Amount>) -> Self {
        self.montant_demande = Some(amount.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ExpenseDraft, BuildError> {
        Ok(ExpenseDraft {
            budget_line: self.budget_line,
            vendor: self.vendor.ok_or(BuildError::MissingField("vendor"))?,
            object: self.object.unwrap_or_default(),
            currency: self.currency,
            fiscal_year: self.fiscal_year.ok_or(BuildError::MissingField("fiscal_year"))?,
            category: self.category.ok_or(BuildError::MissingField("category"))?,
            montant_demande: self
                .montant_demande
                .ok_or(BuildError::MissingField("montant_demande"))?,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reports_first_missing_field() {
        let result = ExpenseDraft::builder("61-2-311").vendor("Sotrapal").build();
        assert_eq!(result.unwrap_err(), BuildError::MissingField("fiscal_year"));
    }

    #[test]
    fn currency_defaults_to_xof() {
        let draft = ExpenseDraft::builder("61-2-311")
            .vendor("Sotrapal")
            .fiscal_year(2026)
            .category(Category::Investissement)
            .montant_demande(2_500_000)
            .build()
            .unwrap();
        assert_eq!(draft.currency, "XOF");
        assert_eq!(draft.montant_demande, Amount::new(2_500_000));
    }
}
