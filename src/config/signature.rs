//! Structural configuration signatures.
//!
//! A signature is `"{id}-{sha256}"` where the hash is taken over a canonical
//! JSON rendering of the configuration. Canonical means every map is emitted
//! with sorted keys, so equal configurations hash equally regardless of how
//! they were assembled.

use crate::builder::BuildError;
use crate::core::{Context, StateGraph};
use crate::listener::Phase;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Serialize)]
#[serde(bound = "")]
struct Canonical<'a, C: Context> {
    id: &'a str,
    initial: &'a str,
    context: &'a C,
    states: &'a StateGraph,
    /// Listener functions cannot be hashed; their count per phase is.
    events: BTreeMap<Phase, usize>,
}

/// Signature of one machine configuration.
pub(crate) fn config_signature<C: Context>(
    id: &str,
    initial: &str,
    context: &C,
    states: &StateGraph,
    events: BTreeMap<Phase, usize>,
) -> Result<String, BuildError> {
    let canonical = Canonical {
        id,
        initial,
        context,
        states,
        events,
    };
    digest(id, &canonical)
}

/// Signature of a composite: its id plus each member's name and signature in
/// member order.
pub(crate) fn composite_signature<'a>(
    id: &str,
    members: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    for (name, signature) in members {
        hasher.update([0u8]);
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(signature.as_bytes());
    }
    format!("{id}-{}", hex::encode(hasher.finalize()))
}

fn digest<T: Serialize>(id: &str, value: &T) -> Result<String, BuildError> {
    // Going through `Value` sorts object keys, including any inside the
    // context, which may come from a hash map.
    let canonical: Value =
        serde_json::to_value(value).map_err(|e| BuildError::Canonicalize(e.to_string()))?;
    let bytes =
        serde_json::to_vec(&canonical).map_err(|e| BuildError::Canonicalize(e.to_string()))?;
    Ok(format!("{id}-{}", hex::encode(Sha256::digest(&bytes))))
}
