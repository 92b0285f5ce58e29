use crate::core::{Actor, Amount, ExpenseId, Phase};
use crate::expense::PaymentDetails;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A caller's request to move one expense to `phase`.
///
/// `amount` may be omitted, in which case the previous phase's amount is
/// carried forward (when the policy allows it). Build with
/// [`TransitionRequest::builder`](crate::builder::TransitionRequestBuilder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub expense_id: ExpenseId,
    pub phase: Phase,
    pub actor: Actor,
    pub amount: Option<Amount>,
    /// Service-fait attestation; required for liquidation.
    pub service_fait: bool,
    pub evidence: Vec<String>,
    /// Mandatory for cancellation.
    pub justification: Option<String>,
    /// Ordonnancement (mandat) reference.
    pub reference: Option<String>,
    pub payment: Option<PaymentDetails>,
    pub metadata: BTreeMap<String, String>,
}
