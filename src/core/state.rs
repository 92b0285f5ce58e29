//! Core State trait for workflow states.
//!
//! Every status an expenditure can be in implements this trait, which provides
//! pure methods for inspecting the state graph without side effects.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for workflow states.
///
/// All methods are pure. A state knows its display name, whether it is
/// terminal, and which states it may legally move to next. The engine never
/// moves a record along an edge this trait does not allow.
///
/// # Required Traits
///
/// - `Clone`: States are copied into audit snapshots
/// - `PartialEq`: States must be comparable for transition logic
/// - `Debug`: States must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: States are persisted with their records
///
/// # Example
///
/// ```rust
/// use ohada_execution::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Mandat {
///     Emis,
///     Vise,
///     Rejete,
/// }
///
/// impl State for Mandat {
///     fn name(&self) -> &str {
///         match self {
///             Self::Emis => "Émis",
///             Self::Vise => "Visé",
///             Self::Rejete => "Rejeté",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Vise | Self::Rejete)
///     }
///
///     fn can_transition_to(&self, next: &Self) -> bool {
///         matches!((self, next), (Self::Emis, Self::Vise | Self::Rejete))
///     }
/// }
///
/// assert!(Mandat::Emis.can_transition_to(&Mandat::Vise));
/// assert!(!Mandat::Vise.can_transition_to(&Mandat::Emis));
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// No edge leaves a final state. Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check whether `next` is a legal successor of this state.
    ///
    /// Default implementation allows nothing.
    fn can_transition_to(&self, next: &Self) -> bool {
        let _ = next;
        false
    }
}
