//! Builder for transition requests.

use crate::builder::error::BuildError;
use crate::core::{Actor, Amount, ExpenseId, Phase};
use crate::engine::TransitionRequest;
use crate::expense::PaymentDetails;
use std::collections::BTreeMap;

/// Builder for constructing transition requests with a fluent API.
#[derive(Clone, Debug)]
pub struct TransitionRequestBuilder {
    expense_id: ExpenseId,
    phase: Phase,
    actor: Option<Actor>,
    amount: Option<Amount>,
    service_fait: bool,
    evidence: Vec<String>,
    justification: Option<String>,
    reference: Option<String>,
    payment: Option<PaymentDetails>,
    metadata: BTreeMap<String, String>,
}

impl TransitionRequest {
    pub fn builder(expense_id: ExpenseId, phase: Phase) -> TransitionRequestBuilder {
        TransitionRequestBuilder::new(expense_id, phase)
    }
}

impl TransitionRequestBuilder {
    pub fn new(expense_id: ExpenseId, phase: Phase) -> Self {
        Self {
            expense_id,
            phase,
            actor: None,
            amount: None,
            service_fait: false,
            evidence: Vec::new(),
            justification: None,
            reference: None,
            payment: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the acting identity (required).
    pub fn actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Set the phase amount. Leave unset to carry the previous amount forward.
    pub fn amount(mut self, amount: impl Into<Amount>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    /// Attest that the service was rendered (liquidation).
    pub fn service_fait(mut self, attested: bool) -> Self {
        self.service_fait = attested;
        self
    }

    /// Reference a supporting document. May be called repeatedly.
    pub fn evidence(mut self, document: impl Into<String>) -> Self {
        self.evidence.push(document.into());
        self
    }

    pub fn justification(mut self, text: impl Into<String>) -> Self {
        self.justification = Some(text.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn payment(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Build the request.
    pub fn build(self) -> Result<TransitionRequest, BuildError> {
        let actor = self.actor.ok_or(BuildError::MissingActor)?;

        Ok(TransitionRequest {
            expense_id: self.expense_id,
            phase: self.phase,
            actor,
            amount: self.amount,
            service_fait: self.service_fait,
            evidence: self.evidence,
            justification: self.justification,
            reference: self.reference,
            payment: self.payment,
            metadata: self.metadata,
        })
    }
}
