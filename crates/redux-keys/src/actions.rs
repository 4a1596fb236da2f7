//! Action factory: namespaced action creators.
//!
//! An [`ActionSet`] maps names to creators. Calling a creator runs its body with
//! a fresh [`ActionContext`] and returns an [`Envelope`] whose payload is always
//! a future.
//!
//! # Example
//!
//! ```ignore
//! use redux_keys::{args, create_actions_with_simple, ActionDefs, Returned};
//! use serde_json::json;
//!
//! let todos = create_actions_with_simple("todos", &["loading", "loaded"], ActionDefs::new()
//!     .action("double", |_, args| json!(args.value(0).and_then(|v| v.as_i64()).unwrap_or(0) * 2))
//!     .action("fetch", |ctx, _| {
//!         let ctx = ctx.clone();
//!         Returned::future(async move {
//!             ctx.call("loading", args![])?;
//!             let items = load_items().await?;
//!             ctx.call("loaded", args![])?;
//!             Ok::<_, anyhow::Error>(items)
//!         })
//!     }))?;
//!
//! let envelope = todos.call("double", args![5])?;
//! assert_eq!(envelope.type_key.as_str(), "todos.double");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::{check_prefix, Args, Dispatch, Envelope, Payload, Returned, TypeKey};
use crate::error::{Error, Result};
use crate::registry::{KeyKind, KeyRegistry};

type ActionBody = Arc<dyn Fn(&ActionContext, Args) -> Returned + Send + Sync>;

/// Whether a lone error argument flags the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFlag {
    /// Set `error` when the call has exactly one argument and it is an error.
    #[default]
    SingleErrorArg,
    /// Never set `error`; the failure only travels as an argument.
    Never,
}

/// Declarations fed to [`create_actions`].
#[derive(Default)]
pub struct ActionDefs {
    bodies: BTreeMap<String, ActionBody>,
    simple: Vec<String>,
    error_flag: ErrorFlag,
    registry: Option<Arc<KeyRegistry>>,
}

impl ActionDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an action with a custom body.
    pub fn action<F, R>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&ActionContext, Args) -> R + Send + Sync + 'static,
        R: Into<Returned>,
    {
        self.bodies
            .insert(name.into(), Arc::new(move |ctx: &ActionContext, args: Args| -> Returned {
                body(ctx, args).into()
            }));
        self
    }

    /// Declare a pass-through action.
    pub fn simple(mut self, name: impl Into<String>) -> Self {
        self.simple.push(name.into());
        self
    }

    /// Choose how a lone error argument is reported.
    pub fn error_flag(mut self, flag: ErrorFlag) -> Self {
        self.error_flag = flag;
        self
    }

    /// Record every key in `registry` when the set is built.
    pub fn register_in(mut self, registry: &Arc<KeyRegistry>) -> Self {
        self.registry = Some(Arc::clone(registry));
        self
    }
}

impl fmt::Debug for ActionDefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefs")
            .field("actions", &self.bodies.keys().collect::<Vec<_>>())
            .field("simple", &self.simple)
            .field("error_flag", &self.error_flag)
            .finish()
    }
}

/// Build an action set from `defs` under `prefix`.
pub fn create_actions(prefix: &str, defs: ActionDefs) -> Result<ActionSet> {
    check_prefix(prefix, "create_actions")?;

    let ActionDefs {
        mut bodies,
        simple,
        error_flag,
        registry,
    } = defs;

    for name in simple {
        bodies.insert(name, Arc::new(|_: &ActionContext, args: Args| args.passthrough()));
    }

    let creators = bodies
        .into_iter()
        .map(|(name, body)| {
            let type_key = TypeKey::new(prefix, &name);
            if let Some(registry) = &registry {
                registry.register(KeyKind::Action, type_key.clone());
            }
            (name, Slot { type_key, body })
        })
        .collect();

    Ok(ActionSet {
        inner: Arc::new(ActionSetInner {
            prefix: prefix.to_string(),
            creators,
            error_flag,
        }),
    })
}

/// Build an action set, installing every name in `simple` as a pass-through action.
pub fn create_actions_with_simple(
    prefix: &str,
    simple: &[&str],
    defs: ActionDefs,
) -> Result<ActionSet> {
    let defs = simple.iter().fold(defs, |defs, name| defs.simple(*name));
    create_actions(prefix, defs)
}

struct Slot {
    type_key: TypeKey,
    body: ActionBody,
}

struct ActionSetInner {
    prefix: String,
    creators: BTreeMap<String, Slot>,
    error_flag: ErrorFlag,
}

/// Named action creators sharing one prefix.
#[derive(Clone)]
pub struct ActionSet {
    inner: Arc<ActionSetInner>,
}

impl ActionSet {
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.creators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.creators.is_empty()
    }

    pub fn type_key(&self, name: &str) -> Option<TypeKey> {
        self.inner.creators.get(name).map(|slot| slot.type_key.clone())
    }

    pub fn get(&self, name: &str) -> Option<ActionCreator> {
        ActionCreator::lookup(&self.inner, name)
    }

    /// Like [`get`](Self::get), failing with [`Error::UnknownAction`].
    pub fn creator(&self, name: &str) -> Result<ActionCreator> {
        self.get(name).ok_or_else(|| unknown(&self.inner, name))
    }

    /// Invoke the named creator.
    pub fn call(&self, name: &str, args: Args) -> Result<Envelope> {
        Ok(self.creator(name)?.call(args))
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionCreator> + '_ {
        self.names()
            .filter_map(move |name| ActionCreator::lookup(&self.inner, name))
    }
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSet")
            .field("prefix", &self.inner.prefix)
            .field("actions", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

fn unknown(inner: &ActionSetInner, name: &str) -> Error {
    Error::UnknownAction {
        prefix: inner.prefix.clone(),
        name: name.to_string(),
    }
}

/// A single generated action creator.
#[derive(Clone)]
pub struct ActionCreator {
    set: Arc<ActionSetInner>,
    name: String,
    type_key: TypeKey,
    body: ActionBody,
}

impl ActionCreator {
    fn lookup(set: &Arc<ActionSetInner>, name: &str) -> Option<Self> {
        let slot = set.creators.get(name)?;
        Some(Self {
            set: Arc::clone(set),
            name: name.to_string(),
            type_key: slot.type_key.clone(),
            body: Arc::clone(&slot.body),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Build an envelope without a store binding.
    pub fn call(&self, args: Args) -> Envelope {
        self.invoke(None, args)
    }

    /// Build an envelope with a fresh context, optionally bound to a dispatch.
    pub(crate) fn invoke(&self, dispatch: Option<&Dispatch>, args: Args) -> Envelope {
        let ctx = ActionContext {
            set: Arc::clone(&self.set),
            dispatch: dispatch.cloned(),
        };
        let error = self.set.error_flag == ErrorFlag::SingleErrorArg && args.single_error().is_some();
        let payload = (self.body)(&ctx, args).into_payload();

        debug!(action = %self.type_key, error, bound = ctx.is_bound(), "action created");
        Envelope {
            type_key: self.type_key.clone(),
            payload,
            error,
        }
    }
}

impl fmt::Debug for ActionCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("type_key", &self.type_key)
            .finish()
    }
}

/// Capability handed to every action body.
///
/// Grants access to sibling actions of the same set and, when the invocation
/// came through a store binding, to the store's raw dispatch.
#[derive(Clone)]
pub struct ActionContext {
    set: Arc<ActionSetInner>,
    dispatch: Option<Dispatch>,
}

impl ActionContext {
    pub fn prefix(&self) -> &str {
        &self.set.prefix
    }

    /// Type key a sibling name maps to, defined or not.
    pub fn type_key(&self, name: &str) -> TypeKey {
        TypeKey::new(&self.set.prefix, name)
    }

    /// Whether `name` is a defined sibling.
    pub fn has(&self, name: &str) -> bool {
        self.set.creators.contains_key(name)
    }

    /// Whether this invocation is bound to a store dispatch.
    pub fn is_bound(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Invoke a sibling action. When bound, its envelope is dispatched too.
    pub fn call(&self, name: &str, args: Args) -> Result<Envelope> {
        let sibling = ActionCreator::lookup(&self.set, name).ok_or_else(|| unknown(&self.set, name))?;
        let envelope = sibling.invoke(self.dispatch.as_ref(), args);
        if let Some(dispatch) = &self.dispatch {
            dispatch.dispatch(envelope.clone());
        }
        Ok(envelope)
    }

    /// Build a bare `prefix.name` envelope with a `null` payload. When bound, it
    /// is dispatched through the raw dispatch.
    pub fn notify(&self, name: &str) -> Envelope {
        let envelope = Envelope::new(self.type_key(name), Payload::undefined());
        if let Some(dispatch) = &self.dispatch {
            debug!(action = %envelope.type_key, "notification dispatched");
            dispatch.dispatch(envelope.clone());
        }
        envelope
    }

    /// [`call`](Self::call) for defined siblings, [`notify`](Self::notify) otherwise.
    pub fn delegate(&self, name: &str, args: Args) -> Envelope {
        match self.call(name, args) {
            Ok(envelope) => envelope,
            Err(_) => self.notify(name),
        }
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("prefix", &self.set.prefix)
            .field("bound", &self.is_bound())
            .finish()
    }
}
