//! Build errors for request, draft and engine builders.

use thiserror::Error;

/// Errors that can occur when building requests, drafts and engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Actor not specified. Call .actor(actor) before .build()")]
    MissingActor,

    #[error("Budget ledger not specified. Call .ledger(ledger) before .build()")]
    MissingLedger,

    #[error("Required field `{0}` not specified")]
    MissingField(&'static str),
}
