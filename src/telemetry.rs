//! Tracing helpers.
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the binary embedding it. `init_tracing` is a convenience for demos and
//! small services.

use crate::core::{Actor, ExpenseId, Phase};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .try_init()
}

/// Span covering one transition attempt.
pub fn transition_span(expense_id: &ExpenseId, phase: Phase, actor: &Actor) -> tracing::Span {
    tracing::info_span!(
        "transition",
        expense.id = %expense_id,
        phase = %phase,
        actor.id = %actor.id,
        actor.role = %actor.role,
    )
}
