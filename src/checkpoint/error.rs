//! Snapshot errors.

use thiserror::Error;

/// Errors raised while encoding, decoding or checking an `EngineSnapshot`.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to encode snapshot as {format}: {reason}")]
    SerializationFailed { format: &'static str, reason: String },

    #[error("failed to decode {format} snapshot: {reason}")]
    DeserializationFailed { format: &'static str, reason: String },

    #[error("snapshot format version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Lines, records and audit trail disagree; the snapshot must not be
    /// restored.
    #[error("snapshot is inconsistent: {0}")]
    ValidationFailed(String),
}
