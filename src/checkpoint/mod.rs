//! Checkpoint and restore for machines.
//!
//! A [`Checkpoint`] captures a machine's active node together with the
//! history chain it references, keyed by the configuration signature. Hosts
//! save checkpoints into a [`StateStore`] when a machine is unmounted and
//! restore them when it is mounted again.

use crate::core::{Context, MachineState, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod mount;
pub mod store;

pub use error::CheckpointError;
pub use mount::{mount, unmount, Mount};
pub use store::{MemoryStore, StateStore};

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a machine.
/// Does NOT include listeners (not serializable).
///
/// The JSON encoding works for any context. The binary encoding uses
/// `bincode`, which cannot decode self-describing values such as
/// `serde_json::Value`; use it with concrete context types.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<C: Context> {
    /// Checkpoint format version
    pub version: u32,

    /// Signature of the configuration the snapshot was taken from
    pub signature: String,

    /// When the checkpoint was taken
    pub saved_at: DateTime<Utc>,

    /// Active node and the chain it references
    pub history: StateHistory<C>,
}

impl<C: Context> Checkpoint<C> {
    pub fn capture(signature: impl Into<String>, history: StateHistory<C>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            signature: signature.into(),
            saved_at: Utc::now(),
            history,
        }
    }

    /// The node that was active when the checkpoint was taken.
    pub fn active(&self) -> &MachineState<C> {
        self.history.current()
    }

    pub fn history(&self) -> &StateHistory<C> {
        &self.history
    }

    pub fn into_history(self) -> StateHistory<C> {
        self.history
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(text)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Check that this checkpoint can be restored into a machine with the
    /// given signature.
    pub fn validate(&self, signature: &str) -> Result<(), CheckpointError> {
        self.check_version()?;
        if self.signature != signature {
            return Err(CheckpointError::SignatureMismatch {
                found: self.signature.clone(),
                expected: signature.to_string(),
            });
        }
        Ok(())
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateGraph;
    use serde_json::{json, Value};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Feed {
        page: u32,
    }

    impl Context for Feed {
        type Patch = u32;

        fn merge(&self, page: u32) -> Self {
            Self { page }
        }
    }

    fn feed_graph() -> StateGraph {
        StateGraph::new()
            .with_transition("loading", "loaded", "ready")
            .with_transition("ready", "loadMore", "loading")
    }

    fn feed_history() -> StateHistory<Feed> {
        let graph = feed_graph();
        let mut history =
            StateHistory::new(MachineState::initial("loading", Feed { page: 0 }, &graph));
        history.record("ready", Feed { page: 1 }, "loaded", &graph);
        history.record("loading", Feed { page: 1 }, "loadMore", &graph);
        history
    }

    #[test]
    fn capture_records_version_and_active_node() {
        let history = feed_history();
        let active = history.current_id();
        let checkpoint = Checkpoint::capture("feed-abc", history);

        assert_eq!(checkpoint.version, CHECKPOINT_VERSION);
        assert_eq!(checkpoint.signature, "feed-abc");
        assert_eq!(checkpoint.active().id, active);
        assert_eq!(checkpoint.history().len(), 3);
    }

    #[test]
    fn json_preserves_chain() {
        let checkpoint = Checkpoint::capture("feed-abc", feed_history());
        let json = checkpoint.to_json().unwrap();
        let restored: Checkpoint<Feed> = Checkpoint::from_json(&json).unwrap();

        assert_eq!(restored.active(), checkpoint.active());
        assert_eq!(restored.history().get_path(), vec!["loading", "ready", "loading"]);
        assert_eq!(restored.saved_at, checkpoint.saved_at);
    }

    #[test]
    fn json_works_for_dynamic_context() {
        let graph = StateGraph::new().with_transition("off", "toggle", "off");
        let history = StateHistory::new(MachineState::initial("off", json!({ "n": 1 }), &graph));
        let checkpoint = Checkpoint::capture("-x", history);

        let restored: Checkpoint<Value> = Checkpoint::from_json(&checkpoint.to_json().unwrap()).unwrap();
        assert_eq!(restored.active().context, json!({ "n": 1 }));
    }

    #[test]
    fn binary_preserves_chain() {
        let checkpoint = Checkpoint::capture("feed-abc", feed_history());
        let bytes = checkpoint.to_bytes().unwrap();
        let restored: Checkpoint<Feed> = Checkpoint::from_bytes(&bytes).unwrap();

        assert_eq!(restored.active(), checkpoint.active());
        assert_eq!(restored.history().cursor(), 2);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut checkpoint = Checkpoint::capture("feed-abc", feed_history());
        checkpoint.version = 99;
        let json = checkpoint.to_json().unwrap();

        match Checkpoint::<Feed>::from_json(&json) {
            Err(CheckpointError::UnsupportedVersion { found, supported }) => {
                assert_eq!(found, 99);
                assert_eq!(supported, CHECKPOINT_VERSION);
            }
            other => panic!("Expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn malformed_input_is_reported() {
        let result = Checkpoint::<Feed>::from_json("{ \"version\": 1 }");
        assert!(matches!(result, Err(CheckpointError::DeserializationFailed(_))));

        let result = Checkpoint::<Feed>::from_bytes(&[1, 2, 3]);
        assert!(matches!(result, Err(CheckpointError::DeserializationFailed(_))));
    }

    #[test]
    fn validate_checks_signature() {
        let checkpoint = Checkpoint::capture("feed-abc", feed_history());

        assert!(checkpoint.validate("feed-abc").is_ok());
        assert!(matches!(
            checkpoint.validate("feed-def"),
            Err(CheckpointError::SignatureMismatch { .. })
        ));
    }
}
