//! Phase rules, accumulated with `Validation`.

use crate::config::WorkflowPolicy;
use crate::core::Phase;
use crate::enforcement::builder::RulesBuilder;
use crate::enforcement::context::TransitionContext;
use crate::error::WorkflowError;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub type RuleResult = Validation<(), NonEmptyVec<WorkflowError>>;

/// Type alias for rule check functions
pub type RuleCheck = Box<dyn Fn(&TransitionContext<'_>) -> RuleResult + Send + Sync>;

/// The checks one phase must pass. Every check runs; all violations are
/// reported, in the order the checks were registered.
pub struct PhaseRules {
    pub(crate) phase: Phase,
    pub(crate) checks: Vec<RuleCheck>,
}

impl PhaseRules {
    /// Standard rules for `phase` under `policy`.
    pub fn for_phase(phase: Phase, policy: &WorkflowPolicy) -> Self {
        let builder = RulesBuilder::new(phase);
        let builder = match phase {
            Phase::Creation => builder,
            Phase::Engagement => {
                let builder = builder.require(amount_positive);
                if policy.allow_engagement_above_request {
                    builder
                } else {
                    builder.require(engagement_within_request)
                }
            }
            Phase::Liquidation => builder
                .require(amount_positive)
                .require(amount_within_prior)
                .require(service_fait_attested)
                .require(evidence_attached),
            Phase::Ordonnancement => {
                let builder = if policy.liquidation_ordonnancement_separation {
                    builder.require(ordonnancement_identity_separated)
                } else {
                    builder
                };
                builder.require(amount_positive).require(amount_within_prior)
            }
            Phase::Paiement => {
                let builder = builder.require(payment_role_separated);
                let builder = if policy.payment_identity_separation {
                    builder.require(payment_identity_separated)
                } else {
                    builder
                };
                builder.require(amount_positive).require(amount_within_prior)
            }
            Phase::Annulation => builder.require(justification_given),
        };
        builder.build()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run all checks, accumulating ALL violations.
    pub fn enforce(&self, context: &TransitionContext<'_>) -> RuleResult {
        let checks: Vec<RuleResult> = self.checks.iter().map(|check| check(context)).collect();
        Validation::all_vec(checks).map(|_| ())
    }

    /// Same as `enforce`, flattened into a plain list (empty when satisfied).
    pub fn violations(&self, context: &TransitionContext<'_>) -> Vec<WorkflowError> {
        match self.enforce(context) {
            Validation::Success(()) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }
}

fn ok() -> RuleResult {
    Validation::success(())
}

/// Zero is never a meaningful phase amount; a missing one is refused too.
pub fn amount_positive(ctx: &TransitionContext<'_>) -> RuleResult {
    match ctx.amount {
        Some(amount) if !amount.is_zero() => ok(),
        Some(_) => Validation::fail(WorkflowError::InvalidAmount {
            phase: ctx.phase(),
            reason: "amount must be greater than zero".to_string(),
        }),
        None => Validation::fail(WorkflowError::InvalidAmount {
            phase: ctx.phase(),
            reason: "amount is required".to_string(),
        }),
    }
}

/// Liquidation ≤ engagement, ordonnancement ≤ liquidation, payment ≤
/// ordonnancement. Equal is allowed.
pub fn amount_within_prior(ctx: &TransitionContext<'_>) -> RuleResult {
    let Some(amount) = ctx.amount else {
        return ok();
    };
    match ctx.prior_amount() {
        Some(ceiling) if amount <= ceiling => ok(),
        Some(ceiling) => Validation::fail(WorkflowError::InvalidAmount {
            phase: ctx.phase(),
            reason: format!("{amount} exceeds the previous phase amount {ceiling}"),
        }),
        None => Validation::fail(WorkflowError::InvariantViolation(format!(
            "expense {} in status {} has no amount preceding {}",
            ctx.record.id,
            ctx.record.status,
            ctx.phase()
        ))),
    }
}

pub fn engagement_within_request(ctx: &TransitionContext<'_>) -> RuleResult {
    match ctx.amount {
        Some(amount) if amount > ctx.record.montant_demande => {
            Validation::fail(WorkflowError::InvalidAmount {
                phase: ctx.phase(),
                reason: format!(
                    "{amount} exceeds the requested amount {}",
                    ctx.record.montant_demande
                ),
            })
        }
        _ => ok(),
    }
}

pub fn service_fait_attested(ctx: &TransitionContext<'_>) -> RuleResult {
    if ctx.request.service_fait {
        ok()
    } else {
        Validation::fail(WorkflowError::MissingAttestation {
            phase: ctx.phase(),
            reason: "service fait is not attested".to_string(),
        })
    }
}

pub fn evidence_attached(ctx: &TransitionContext<'_>) -> RuleResult {
    if ctx.request.evidence.iter().any(|e| !e.trim().is_empty()) {
        ok()
    } else {
        Validation::fail(WorkflowError::MissingAttestation {
            phase: ctx.phase(),
            reason: "no supporting document referenced".to_string(),
        })
    }
}

pub fn justification_given(ctx: &TransitionContext<'_>) -> RuleResult {
    match ctx.request.justification.as_deref() {
        Some(text) if !text.trim().is_empty() => ok(),
        _ => Validation::fail(WorkflowError::MissingJustification),
    }
}

/// The comptable and the ordonnateur must act under different role classes.
pub fn payment_role_separated(ctx: &TransitionContext<'_>) -> RuleResult {
    match &ctx.record.ordonnancement {
        Some(stamp) if stamp.actor.role == ctx.request.actor.role => {
            Validation::fail(WorkflowError::RoleMismatch {
                phase: ctx.phase(),
                role: ctx.request.actor.role,
                reason: "is the role that ordered this payment".to_string(),
            })
        }
        _ => ok(),
    }
}

pub fn payment_identity_separated(ctx: &TransitionContext<'_>) -> RuleResult {
    match &ctx.record.ordonnancement {
        Some(stamp) if stamp.actor.same_identity(&ctx.request.actor) => {
            Validation::fail(WorkflowError::RoleMismatch {
                phase: ctx.phase(),
                role: ctx.request.actor.role,
                reason: format!("{} signed the ordonnancement", ctx.request.actor.id),
            })
        }
        _ => ok(),
    }
}

pub fn ordonnancement_identity_separated(ctx: &TransitionContext<'_>) -> RuleResult {
    match &ctx.record.liquidation {
        Some(stamp) if stamp.actor.same_identity(&ctx.request.actor) => {
            Validation::fail(WorkflowError::RoleMismatch {
                phase: ctx.phase(),
                role: ctx.request.actor.role,
                reason: format!("{} controlled the liquidation", ctx.request.actor.id),
            })
        }
        _ => ok(),
    }
}
