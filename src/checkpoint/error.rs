//! Errors raised while encoding, decoding or checking a [`Checkpoint`](super::Checkpoint).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The history could not be written as JSON or bincode
    #[error("cannot encode checkpoint: {0}")]
    SerializationFailed(String),

    /// The bytes are not a checkpoint, or the node chain in them is broken
    #[error("cannot decode checkpoint: {0}")]
    DeserializationFailed(String),

    /// Snapshot written by a different `CHECKPOINT_VERSION`
    #[error("checkpoint format v{found} cannot be read (expected v{supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Snapshot belongs to a machine with another signature
    #[error("checkpoint was saved for '{found}', not '{expected}'")]
    SignatureMismatch { found: String, expected: String },
}
