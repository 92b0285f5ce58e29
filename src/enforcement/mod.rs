//! Validation-based enforcement of phase rules.
//!
//! Rules are pure checks over a [`TransitionContext`]. They use Stillwater's
//! `Validation` to accumulate ALL violations of a request instead of stopping
//! at the first one, so the audit trail records everything that was wrong
//! with a rejected attempt.
//!
//! Status edges and the base role of a phase are checked by the engine
//! before rules run; rules cover amounts, attestations, justification and
//! separation of duties.
//!
//! # Example
//!
//! ```rust
//! use ohada_execution::config::WorkflowPolicy;
//! use ohada_execution::core::Phase;
//! use ohada_execution::enforcement::PhaseRules;
//!
//! let rules = PhaseRules::for_phase(Phase::Liquidation, &WorkflowPolicy::default());
//! assert_eq!(rules.len(), 4);
//! ```

pub mod builder;
pub mod context;
pub mod rules;

pub use builder::RulesBuilder;
pub use context::TransitionContext;
pub use rules::{PhaseRules, RuleCheck, RuleResult};
