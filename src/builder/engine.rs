//! Builder for constructing engines.

use crate::audit::{AuditStore, MemoryAuditStore};
use crate::builder::error::BuildError;
use crate::config::WorkflowPolicy;
use crate::engine::{Clock, PhaseTransitionEngine, SystemClock};
use crate::ledger::BudgetLedger;
use std::sync::Arc;

/// Builder for constructing a `PhaseTransitionEngine` with a fluent API.
#[derive(Default)]
pub struct EngineBuilder {
    ledger: Option<Arc<BudgetLedger>>,
    audit: Option<Arc<dyn AuditStore>>,
    clock: Option<Arc<dyn Clock>>,
    policy: WorkflowPolicy,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the budget ledger (required).
    pub fn ledger(mut self, ledger: Arc<BudgetLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set the audit store. Defaults to an in-memory store.
    pub fn audit_store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(store);
        self
    }

    /// Set the clock. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn policy(mut self, policy: WorkflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the engine.
    /// Returns an error if the ledger is missing.
    pub fn build(self) -> Result<PhaseTransitionEngine, BuildError> {
        let ledger = self.ledger.ok_or(BuildError::MissingLedger)?;
        let audit: Arc<dyn AuditStore> = match self.audit {
            Some(store) => store,
            None => Arc::new(MemoryAuditStore::new()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        Ok(PhaseTransitionEngine::from_parts(
            ledger,
            audit,
            clock,
            self.policy,
            Vec::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_ledger() {
        let result = EngineBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingLedger)));
    }

    #[test]
    fn builder_applies_policy() {
        let engine = EngineBuilder::new()
            .ledger(Arc::new(BudgetLedger::new()))
            .policy(WorkflowPolicy::role_class_only())
            .build()
            .unwrap();
        assert!(!engine.policy().payment_identity_separation);
        assert!(engine.audit_trail().is_empty());
    }
}
