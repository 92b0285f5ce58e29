//! The expenditure aggregate and its read projections.

use crate::core::{Actor, Amount, BudgetLineId, Category, ExpenseId, ExpenseStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the ordonnateur fills in when opening an expenditure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub budget_line: BudgetLineId,
    pub vendor: String,
    /// Object of the expenditure, e.g. "Achat de fournitures de bureau".
    pub object: String,
    pub currency: String,
    pub fiscal_year: i32,
    pub category: Category,
    pub montant_demande: Amount,
    pub metadata: BTreeMap<String, String>,
}

/// Who did a phase, when, and on what evidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStamp {
    pub actor: Actor,
    pub at: DateTime<Utc>,
    /// Identifiers of supporting documents (invoices, PV de réception, ...).
    pub evidence: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Virement,
    Cheque,
    Especes,
    MobileMoney,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub bank: Option<String>,
    pub reference: String,
}

/// The five amounts of a record at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountSnapshot {
    pub demande: Amount,
    pub engage: Option<Amount>,
    pub liquide: Option<Amount>,
    pub ordonnance: Option<Amount>,
    pub paye: Option<Amount>,
}

impl AmountSnapshot {
    /// `paye ≤ ordonnance ≤ liquide ≤ engage` for every pair that is set.
    pub fn is_ordered(&self) -> bool {
        let chain = [self.engage, self.liquide, self.ordonnance, self.paye];
        chain
            .windows(2)
            .all(|pair| match (pair[0], pair[1]) {
                (Some(upper), Some(lower)) => lower <= upper,
                (None, Some(_)) => false,
                _ => true,
            })
    }
}

/// One expenditure moving through the execution cycle.
///
/// Owned by the engine; callers only ever see clones. All changes go through
/// [`ExpenseRecord::apply`], which is also what audit replay uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub budget_line: BudgetLineId,
    pub vendor: String,
    pub object: String,
    pub currency: String,
    pub fiscal_year: i32,
    pub category: Category,
    pub status: ExpenseStatus,

    pub montant_demande: Amount,
    pub montant_engage: Option<Amount>,
    pub montant_liquide: Option<Amount>,
    pub montant_ordonnance: Option<Amount>,
    pub montant_paye: Option<Amount>,

    /// Service-fait attestation given at liquidation.
    pub service_fait: bool,

    pub creation: PhaseStamp,
    pub engagement: Option<PhaseStamp>,
    pub liquidation: Option<PhaseStamp>,
    pub ordonnancement: Option<PhaseStamp>,
    pub paiement: Option<PhaseStamp>,
    pub annulation: Option<PhaseStamp>,

    pub ordonnancement_reference: Option<String>,
    pub payment: Option<PaymentDetails>,
    pub cancellation_justification: Option<String>,

    pub metadata: BTreeMap<String, String>,
}

impl ExpenseRecord {
    pub(crate) fn from_draft(id: ExpenseId, draft: &ExpenseDraft, creation: PhaseStamp) -> Self {
        Self {
            id,
            budget_line: draft.budget_line.clone(),
            vendor: draft.vendor.clone(),
            object: draft.object.clone(),
            currency: draft.currency.clone(),
            fiscal_year: draft.fiscal_year,
            category: draft.category,
            status: ExpenseStatus::Brouillon,
            montant_demande: draft.montant_demande,
            montant_engage: None,
            montant_liquide: None,
            montant_ordonnance: None,
            montant_paye: None,
            service_fait: false,
            creation,
            engagement: None,
            liquidation: None,
            ordonnancement: None,
            paiement: None,
            annulation: None,
            ordonnancement_reference: None,
            payment: None,
            cancellation_justification: None,
            metadata: draft.metadata.clone(),
        }
    }

    pub fn amounts(&self) -> AmountSnapshot {
        AmountSnapshot {
            demande: self.montant_demande,
            engage: self.montant_engage,
            liquide: self.montant_liquide,
            ordonnance: self.montant_ordonnance,
            paye: self.montant_paye,
        }
    }

    /// Credit this record currently holds on its budget line.
    pub fn committed_credit(&self) -> Amount {
        if self.status.holds_commitment() {
            self.montant_engage.unwrap_or(Amount::ZERO)
        } else {
            Amount::ZERO
        }
    }
}
