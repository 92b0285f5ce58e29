//! Context provided to enforcement checks.

use crate::config::WorkflowPolicy;
use crate::core::{Amount, Phase};
use crate::engine::TransitionRequest;
use crate::expense::ExpenseRecord;

/// Everything a rule may look at. Built once per attempt, never mutated.
#[derive(Clone, Debug)]
pub struct TransitionContext<'a> {
    pub record: &'a ExpenseRecord,
    pub request: &'a TransitionRequest,
    pub policy: &'a WorkflowPolicy,
    /// Requested amount, or the carried-forward one when the request omits it
    /// and the policy allows carrying forward.
    pub amount: Option<Amount>,
}

impl<'a> TransitionContext<'a> {
    pub fn new(
        record: &'a ExpenseRecord,
        request: &'a TransitionRequest,
        policy: &'a WorkflowPolicy,
    ) -> Self {
        let amount = match request.amount {
            Some(amount) => Some(amount),
            None if policy.carry_forward_amounts => prior_amount(record, request.phase),
            None => None,
        };
        Self {
            record,
            request,
            policy,
            amount,
        }
    }

    pub fn phase(&self) -> Phase {
        self.request.phase
    }

    /// Amount fixed by the previous phase.
    pub fn prior_amount(&self) -> Option<Amount> {
        prior_amount(self.record, self.phase())
    }
}

fn prior_amount(record: &ExpenseRecord, phase: Phase) -> Option<Amount> {
    match phase {
        Phase::Engagement => Some(record.montant_demande),
        Phase::Liquidation => record.montant_engage,
        Phase::Ordonnancement => record.montant_liquide,
        Phase::Paiement => record.montant_ordonnance,
        Phase::Creation | Phase::Annulation => None,
    }
}
