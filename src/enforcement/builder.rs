//! Builder API for assembling phase rules.

use crate::core::Phase;
use crate::enforcement::context::TransitionContext;
use crate::enforcement::rules::{PhaseRules, RuleCheck, RuleResult};
use crate::error::WorkflowError;
use stillwater::validation::Validation;

/// Builder for creating phase rules
pub struct RulesBuilder {
    phase: Phase,
    checks: Vec<RuleCheck>,
}

impl RulesBuilder {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            checks: Vec::new(),
        }
    }

    /// Add a validation check
    pub fn require<F>(mut self, check: F) -> Self
    where
        F: Fn(&TransitionContext<'_>) -> RuleResult + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Add a simple predicate check; `error` builds the violation when the
    /// predicate is false.
    pub fn require_pred<P, E>(mut self, predicate: P, error: E) -> Self
    where
        P: Fn(&TransitionContext<'_>) -> bool + Send + Sync + 'static,
        E: Fn(&TransitionContext<'_>) -> WorkflowError + Send + Sync + 'static,
    {
        let check = move |ctx: &TransitionContext<'_>| {
            if predicate(ctx) {
                Validation::success(())
            } else {
                Validation::fail(error(ctx))
            }
        };
        self.checks.push(Box::new(check));
        self
    }

    /// Build the phase rules
    pub fn build(self) -> PhaseRules {
        PhaseRules {
            phase: self.phase,
            checks: self.checks,
        }
    }
}
