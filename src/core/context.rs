//! Machine context and context patches.
//!
//! A machine carries one context value alongside its state name. Transitions
//! may patch that value with a shallow merge, either from a ready-made patch
//! or from a function of the current context.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Trait for machine context values.
///
/// `merge` must be pure: it returns a new context built from `self` with the
/// fields present in `patch` overwritten, leaving every other field as is.
///
/// # Example
///
/// ```rust
/// use rewind::core::Context;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Countdown {
///     seconds: u32,
///     label: String,
/// }
///
/// #[derive(Clone, Default)]
/// struct CountdownPatch {
///     seconds: Option<u32>,
///     label: Option<String>,
/// }
///
/// impl Context for Countdown {
///     type Patch = CountdownPatch;
///
///     fn merge(&self, patch: CountdownPatch) -> Self {
///         Self {
///             seconds: patch.seconds.unwrap_or(self.seconds),
///             label: patch.label.unwrap_or_else(|| self.label.clone()),
///         }
///     }
/// }
///
/// let ctx = Countdown { seconds: 3, label: "tea".into() };
/// let next = ctx.merge(CountdownPatch { seconds: Some(2), ..Default::default() });
/// assert_eq!(next, Countdown { seconds: 2, label: "tea".into() });
/// ```
pub trait Context: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Partial value accepted by [`Context::merge`].
    type Patch: Send + 'static;

    /// Shallow-merge `patch` into a copy of this context.
    fn merge(&self, patch: Self::Patch) -> Self;
}

/// Object patches are merged key by key. A `null` patch leaves the context
/// untouched; any other patch replaces it.
impl Context for Value {
    type Patch = Value;

    fn merge(&self, patch: Value) -> Self {
        match (self, patch) {
            (Value::Object(base), Value::Object(fields)) => {
                let mut merged = base.clone();
                merged.extend(fields);
                Value::Object(merged)
            }
            (_, Value::Null) => self.clone(),
            (_, replacement) => replacement,
        }
    }
}

impl Context for () {
    type Patch = ();

    fn merge(&self, _patch: ()) -> Self {}
}

type PatchFn<C> = Arc<dyn Fn(&C) -> <C as Context>::Patch + Send + Sync>;

/// Patch handed to `send`: either a partial value or a function from the
/// current context to a partial value.
pub enum ContextPatch<C: Context> {
    Value(C::Patch),
    With(PatchFn<C>),
}

impl<C: Context> ContextPatch<C> {
    pub fn value(patch: C::Patch) -> Self {
        Self::Value(patch)
    }

    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&C) -> C::Patch + Send + Sync + 'static,
    {
        Self::With(Arc::new(f))
    }

    /// Merge this patch into `context`.
    pub fn apply(self, context: &C) -> C {
        let patch = match self {
            Self::Value(patch) => patch,
            Self::With(f) => f(context),
        };
        context.merge(patch)
    }
}

impl<C: Context> Clone for ContextPatch<C>
where
    C::Patch: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Self::Value(patch) => Self::Value(patch.clone()),
            Self::With(f) => Self::With(Arc::clone(f)),
        }
    }
}

impl<C: Context> Debug for ContextPatch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("ContextPatch::Value(..)"),
            Self::With(_) => f.write_str("ContextPatch::With(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_patch_merges_shallowly() {
        let ctx = json!({ "seconds": 3, "label": "tea", "nested": { "a": 1 } });
        let merged = ctx.merge(json!({ "seconds": 2, "nested": { "b": 2 } }));

        assert_eq!(
            merged,
            json!({ "seconds": 2, "label": "tea", "nested": { "b": 2 } })
        );
    }

    #[test]
    fn null_patch_is_noop() {
        let ctx = json!({ "seconds": 3 });
        assert_eq!(ctx.merge(Value::Null), ctx);
    }

    #[test]
    fn scalar_patch_replaces_context() {
        let ctx = json!({ "seconds": 3 });
        assert_eq!(ctx.merge(json!(7)), json!(7));
    }

    #[test]
    fn function_patch_reads_current_context() {
        let ctx = json!({ "seconds": 3 });
        let patch = ContextPatch::<Value>::with(|c| {
            json!({ "seconds": c["seconds"].as_u64().unwrap_or(0) - 1 })
        });

        assert_eq!(patch.apply(&ctx), json!({ "seconds": 2 }));
    }

    #[test]
    fn cloned_patch_applies_identically() {
        let patch = ContextPatch::<Value>::value(json!({ "on": true }));
        let copy = patch.clone();
        let ctx = json!({ "on": false });

        assert_eq!(patch.apply(&ctx), copy.apply(&ctx));
    }

    #[test]
    fn unit_context_merges_to_unit() {
        ().merge(());
    }
}
