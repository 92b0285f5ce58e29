//! Builder API for requests, drafts and engines.
//!
//! The free functions below cover the common single-step requests.

pub mod draft;
pub mod engine;
pub mod error;
pub mod request;

pub use draft::ExpenseDraftBuilder;
pub use engine::EngineBuilder;
pub use error::BuildError;
pub use request::TransitionRequestBuilder;

use crate::core::{Actor, Amount, ExpenseId, Phase};
use crate::engine::TransitionRequest;

/// Engagement request for `amount`.
///
/// # Example
///
/// ```
/// use ohada_execution::builder::engage;
/// use ohada_execution::core::{Actor, Amount, ExpenseId, Phase};
///
/// let request = engage(ExpenseId::new(), Actor::ordonnateur("A"), Amount::new(600_000));
/// assert_eq!(request.phase, Phase::Engagement);
/// ```
pub fn engage(expense_id: ExpenseId, actor: Actor, amount: Amount) -> TransitionRequest {
    bare(expense_id, Phase::Engagement, actor, Some(amount))
}

/// Liquidation request with the service-fait attestation and one document.
pub fn liquidate(
    expense_id: ExpenseId,
    actor: Actor,
    amount: Amount,
    evidence: impl Into<String>,
) -> TransitionRequest {
    let mut request = bare(expense_id, Phase::Liquidation, actor, Some(amount));
    request.service_fait = true;
    request.evidence.push(evidence.into());
    request
}

pub fn ordonnance(expense_id: ExpenseId, actor: Actor, amount: Amount) -> TransitionRequest {
    bare(expense_id, Phase::Ordonnancement, actor, Some(amount))
}

pub fn pay(expense_id: ExpenseId, actor: Actor, amount: Amount) -> TransitionRequest {
    bare(expense_id, Phase::Paiement, actor, Some(amount))
}

/// Cancellation request.
///
/// # Example
///
/// ```
/// use ohada_execution::builder::cancel;
/// use ohada_execution::core::{Actor, ExpenseId};
///
/// let request = cancel(ExpenseId::new(), Actor::administrateur("ADM"), "doublon");
/// assert_eq!(request.justification.as_deref(), Some("doublon"));
/// ```
pub fn cancel(
    expense_id: ExpenseId,
    actor: Actor,
    justification: impl Into<String>,
) -> TransitionRequest {
    let mut request = bare(expense_id, Phase::Annulation, actor, None);
    request.justification = Some(justification.into());
    request
}

fn bare(
    expense_id: ExpenseId,
    phase: Phase,
    actor: Actor,
    amount: Option<Amount>,
) -> TransitionRequest {
    TransitionRequest {
        expense_id,
        phase,
        actor,
        amount,
        service_fait: false,
        evidence: Vec::new(),
        justification: None,
        reference: None,
        payment: None,
        metadata: Default::default(),
    }
}
