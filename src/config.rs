//! Workflow policy configuration.
//!
//! Separation-of-duties rules that public-finance regulations leave to each
//! administration are expressed as flags here rather than hard-coded in the
//! engine.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Prefix of environment variables overriding the policy, e.g.
/// `OHADA_PAYMENT_IDENTITY_SEPARATION=false`.
pub const ENV_PREFIX: &str = "OHADA";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to load workflow policy: {0}")]
    Load(#[from] config::ConfigError),
}

/// Policy flags consulted by the engine on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowPolicy {
    /// Reject payment when the comptable is the same person who signed the
    /// ordonnancement, even under a different role.
    pub payment_identity_separation: bool,
    /// Require the ordonnancement signer to be a different person from the
    /// liquidation controller.
    pub liquidation_ordonnancement_separation: bool,
    /// Allow `montant_engage` to exceed `montant_demande`.
    pub allow_engagement_above_request: bool,
    /// When a request omits its amount, use the previous phase's amount.
    pub carry_forward_amounts: bool,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            payment_identity_separation: true,
            liquidation_ordonnancement_separation: false,
            allow_engagement_above_request: true,
            carry_forward_amounts: true,
        }
    }
}

impl WorkflowPolicy {
    /// Load the policy with precedence:
    /// 1. Default values
    /// 2. The TOML file at `path`, if given and present
    /// 3. Environment variables prefixed with `OHADA_`
    pub fn load(path: Option<&Path>) -> Result<Self, PolicyError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let policy = builder.build()?.try_deserialize()?;
        tracing::debug!(?policy, "workflow policy loaded");
        Ok(policy)
    }

    /// Only role classes are checked; one person may hold several roles.
    pub fn role_class_only() -> Self {
        Self {
            payment_identity_separation: false,
            liquidation_ordonnancement_separation: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_enforce_payment_identity_separation() {
        let policy = WorkflowPolicy::default();
        assert!(policy.payment_identity_separation);
        assert!(!policy.liquidation_ordonnancement_separation);
        assert!(policy.carry_forward_amounts);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let policy = WorkflowPolicy::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(policy, WorkflowPolicy::default());
    }

    #[test]
    fn file_overrides_only_listed_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "liquidation_ordonnancement_separation = true").unwrap();
        writeln!(file, "carry_forward_amounts = false").unwrap();

        let policy = WorkflowPolicy::load(Some(file.path())).unwrap();

        assert!(policy.liquidation_ordonnancement_separation);
        assert!(!policy.carry_forward_amounts);
        assert!(policy.payment_identity_separation);
        assert!(policy.allow_engagement_above_request);
    }

    #[test]
    fn role_class_only_relaxes_identity_checks() {
        let policy = WorkflowPolicy::role_class_only();
        assert!(!policy.payment_identity_separation);
        assert!(!policy.liquidation_ordonnancement_separation);
    }
}
