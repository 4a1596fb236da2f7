//! Core message types shared by the factories and the projector.
//!
//! # Overview
//!
//! - [`TypeKey`] = `prefix.name`, the only link between an action and its reducer
//! - [`Envelope`] = what an action creator produces (payload still pending)
//! - [`Action`] = what a reducer sees (payload settled)
//! - [`Dispatch`] = the store's raw dispatch function
//!
//! Payloads are always futures. Synchronous values are wrapped explicitly when
//! the envelope is built, so every consumer awaits the same way.

use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::error::{ActionFailure, Error, Result};

/// Dot-joined `prefix.name` identifying one action/reducer pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    /// Join a prefix and a name.
    pub fn new(prefix: &str, name: &str) -> Self {
        Self(format!("{}.{}", prefix, name))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reject blank prefixes before any key is built.
pub(crate) fn check_prefix(prefix: &str, factory: &'static str) -> Result<()> {
    if prefix.trim().is_empty() {
        return Err(Error::InvalidPrefix {
            factory,
            prefix: prefix.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Arguments
// =============================================================================

/// One argument passed to an action creator.
#[derive(Debug, Clone)]
pub enum Arg {
    /// A plain JSON value.
    Value(Value),
    /// An error value. A lone error argument flags the envelope.
    Error(ActionFailure),
}

impl Arg {
    /// The argument as JSON. Errors render as their message.
    pub fn to_value(&self) -> Value {
        match self {
            Arg::Value(value) => value.clone(),
            Arg::Error(failure) => Value::String(failure.message()),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<ActionFailure> for Arg {
    fn from(failure: ActionFailure) -> Self {
        Arg::Error(failure)
    }
}

/// Ordered call arguments for an action creator.
///
/// Use the [`args!`](crate::args) macro for the common case.
#[derive(Debug, Clone, Default)]
pub struct Args(SmallVec<[Arg; 2]>);

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Arguments from a list of JSON values.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(values.into_iter().map(|v| Arg::Value(v.into())).collect())
    }

    /// A single error argument.
    pub fn error(failure: ActionFailure) -> Self {
        let mut args = Self::new();
        args.0.push(Arg::Error(failure));
        args
    }

    /// Append an argument.
    pub fn with(mut self, arg: impl Into<Arg>) -> Self {
        self.0.push(arg.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    /// The argument at `index` if it is a plain value.
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.0.get(index) {
            Some(Arg::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The failure when the call has exactly one argument and it is an error.
    pub fn single_error(&self) -> Option<&ActionFailure> {
        match self.0.as_slice() {
            [Arg::Error(failure)] => Some(failure),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.0.iter()
    }

    /// Pass-through result used by simple actions.
    ///
    /// Zero args give `null`, one arg gives itself (an error as its message),
    /// several give a JSON array. The payload always resolves.
    pub fn passthrough(&self) -> Returned {
        match self.0.as_slice() {
            [] => Returned::Value(Value::Null),
            [single] => Returned::Value(single.to_value()),
            many => Returned::Value(Value::Array(many.iter().map(Arg::to_value).collect())),
        }
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<T: IntoIterator<Item = Arg>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Payload
// =============================================================================

type PayloadFuture = BoxFuture<'static, std::result::Result<Value, ActionFailure>>;

/// What an action body hands back before it is normalized into a [`Payload`].
pub enum Returned {
    /// Available now.
    Value(Value),
    /// Failed synchronously.
    Failed(ActionFailure),
    /// Resolves later.
    Pending(PayloadFuture),
}

impl Returned {
    /// Wrap async work.
    pub fn future<F, E>(future: F) -> Self
    where
        F: Future<Output = std::result::Result<Value, E>> + Send + 'static,
        E: Into<anyhow::Error>,
    {
        Returned::Pending(future.map(|result| result.map_err(ActionFailure::new)).boxed())
    }

    pub(crate) fn into_payload(self) -> Payload {
        match self {
            Returned::Value(value) => Payload::ready(value),
            Returned::Failed(failure) => Payload::rejected(failure),
            Returned::Pending(future) => Payload {
                inner: future.shared(),
            },
        }
    }
}

impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        Returned::Value(value)
    }
}

impl From<()> for Returned {
    fn from(_: ()) -> Self {
        Returned::Value(Value::Null)
    }
}

impl<E: Into<anyhow::Error>> From<std::result::Result<Value, E>> for Returned {
    fn from(result: std::result::Result<Value, E>) -> Self {
        match result {
            Ok(value) => Returned::Value(value),
            Err(e) => Returned::Failed(ActionFailure::new(e)),
        }
    }
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Returned::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Returned::Failed(failure) => f.debug_tuple("Failed").field(failure).finish(),
            Returned::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// A shared, at-most-once-resolving payload.
///
/// Cloning is cheap; every clone observes the same resolution.
#[derive(Clone)]
pub struct Payload {
    inner: Shared<PayloadFuture>,
}

impl Payload {
    /// A payload that is already resolved.
    pub fn ready(value: Value) -> Self {
        Self::from_result(Ok(value))
    }

    /// The `null` payload used by bare notifications.
    pub fn undefined() -> Self {
        Self::ready(Value::Null)
    }

    /// A payload that is already rejected.
    pub fn rejected(failure: ActionFailure) -> Self {
        Self::from_result(Err(failure))
    }

    fn from_result(result: std::result::Result<Value, ActionFailure>) -> Self {
        Self {
            inner: futures::future::ready(result).boxed().shared(),
        }
    }

    /// Await the payload.
    pub async fn settle(&self) -> std::result::Result<Value, ActionFailure> {
        self.inner.clone().await
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

// =============================================================================
// Envelope / Action
// =============================================================================

/// The `{type, payload, error}` message produced by an action creator.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub type_key: TypeKey,
    pub payload: Payload,
    /// Set when the dispatch communicates a failure. Reducers skip it.
    pub error: bool,
}

impl Envelope {
    pub fn new(type_key: TypeKey, payload: Payload) -> Self {
        Self {
            type_key,
            payload,
            error: false,
        }
    }

    /// Await the payload and produce the action reducers will see.
    ///
    /// A rejected payload becomes an error-flagged action whose payload is the
    /// failure message.
    pub async fn settle(&self) -> Action {
        match self.payload.settle().await {
            Ok(payload) => Action {
                type_key: self.type_key.clone(),
                payload,
                error: self.error,
            },
            Err(failure) => Action {
                type_key: self.type_key.clone(),
                payload: Value::String(failure.message()),
                error: true,
            },
        }
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// A settled action, as handed to reducers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub type_key: TypeKey,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
}

impl Action {
    pub fn new(type_key: TypeKey, payload: Value) -> Self {
        Self {
            type_key,
            payload,
            error: false,
        }
    }

    /// An error-flagged action.
    pub fn failed(type_key: TypeKey, payload: Value) -> Self {
        Self {
            type_key,
            payload,
            error: true,
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Handle to the store's raw dispatch function.
#[derive(Clone)]
pub struct Dispatch {
    f: Arc<dyn Fn(Envelope) + Send + Sync>,
}

impl Dispatch {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Envelope) + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn dispatch(&self, envelope: Envelope) {
        (self.f)(envelope)
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatch(..)")
    }
}

/// Identifies one dispatch binding (one connected component instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(Uuid);

impl BindingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_key_joins_with_dot() {
        let key = TypeKey::new("todos", "add");
        assert_eq!(key.as_str(), "todos.add");
        assert_eq!(key.to_string(), "todos.add");
    }

    #[test]
    fn test_blank_prefix_rejected() {
        assert!(check_prefix("todos", "create_actions").is_ok());
        assert_eq!(
            check_prefix("  ", "create_actions"),
            Err(Error::InvalidPrefix {
                factory: "create_actions",
                prefix: "  ".to_string(),
            })
        );
    }

    #[test]
    fn test_single_error_only_for_lone_error() {
        let failure = ActionFailure::msg("nope");
        assert!(Args::error(failure.clone()).single_error().is_some());
        assert!(Args::new().single_error().is_none());
        assert!(Args::from_values([json!(1)]).single_error().is_none());
        let two = Args::error(failure).with(json!(1));
        assert!(two.single_error().is_none());
    }

    #[tokio::test]
    async fn test_passthrough_shapes() {
        let zero = Args::new().passthrough().into_payload();
        assert_eq!(zero.settle().await.unwrap(), Value::Null);

        let one = Args::from_values([json!("a")]).passthrough().into_payload();
        assert_eq!(one.settle().await.unwrap(), json!("a"));

        let two = Args::from_values([json!("a"), json!(2)]).passthrough().into_payload();
        assert_eq!(two.settle().await.unwrap(), json!(["a", 2]));
    }

    #[tokio::test]
    async fn test_passthrough_lone_error_resolves_to_message() {
        let payload = Args::error(ActionFailure::msg("bad input"))
            .passthrough()
            .into_payload();
        assert_eq!(payload.settle().await.unwrap(), json!("bad input"));
    }

    #[tokio::test]
    async fn test_lone_error_envelope_keeps_its_own_flag() {
        let type_key = TypeKey::new("p", "failed");
        let payload = Args::error(ActionFailure::msg("bad input")).passthrough().into_payload();

        let unflagged = Envelope::new(type_key.clone(), payload.clone()).settle().await;
        assert!(!unflagged.error);
        assert_eq!(unflagged.payload, json!("bad input"));

        let mut envelope = Envelope::new(type_key, payload);
        envelope.error = true;
        assert!(envelope.settle().await.error);
    }

    #[tokio::test]
    async fn test_pending_payload_shared_between_clones() {
        let payload = Returned::future(async { Ok::<_, anyhow::Error>(json!(7)) }).into_payload();
        let copy = payload.clone();
        assert_eq!(payload.settle().await.unwrap(), json!(7));
        assert_eq!(copy.settle().await.unwrap(), json!(7));
    }

    #[tokio::test]
    async fn test_rejected_payload_settles_error_flagged() {
        let envelope = Envelope::new(
            TypeKey::new("p", "load"),
            Payload::rejected(ActionFailure::msg("timeout")),
        );
        let action = envelope.settle().await;
        assert!(action.error);
        assert_eq!(action.payload, json!("timeout"));
    }

    #[test]
    fn test_action_serializes_with_type_field() {
        let action = Action::new(TypeKey::new("p", "f"), json!(10));
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, json!({ "type": "p.f", "payload": 10 }));

        let flagged = Action::failed(TypeKey::new("p", "f"), json!("x"));
        let value = serde_json::to_value(&flagged).unwrap();
        assert_eq!(value["error"], json!(true));
    }
}
