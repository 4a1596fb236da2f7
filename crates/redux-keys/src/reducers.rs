//! Reducer factory: namespaced reducer tables.
//!
//! [`handle_actions`] wraps every reducer body so that error-flagged actions
//! leave state untouched, keys the table by `prefix.name`, and hands the table
//! to a [`ReducerCombiner`]. The factory itself never runs a reducer.
//!
//! # Example
//!
//! ```ignore
//! let counter = handle_actions("counter", ReducerDefs::new()
//!     .on("incr", |_, n: i64, _| n + 1)
//!     .on("twice", |ctx, n, action| {
//!         let n = ctx.delegate("incr", n, action).unwrap_or(n);
//!         ctx.delegate("incr", n, action).unwrap_or(n)
//!     }), 0, &TableCombiner)?;
//!
//! let state = counter.reduce(None, &Action::new(TypeKey::new("counter", "twice"), Value::Null));
//! assert_eq!(state, 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::{check_prefix, Action, TypeKey};
use crate::error::{Error, Result};
use crate::registry::{KeyKind, KeyRegistry};

type ReducerBody<S> = Arc<dyn Fn(&ReducerContext<S>, S, &Action) -> S + Send + Sync>;

/// A wrapped reducer as stored in a [`ReducerTable`].
pub type Reducer<S> = Arc<dyn Fn(S, &Action) -> S + Send + Sync>;

/// Type key to wrapped reducer.
pub type ReducerTable<S> = BTreeMap<TypeKey, Reducer<S>>;

/// Turns a reducer table and an initial state into the store's reducer.
///
/// This is the seam to the store engine; the factory never inspects the result.
pub trait ReducerCombiner<S> {
    type Combined;

    fn combine(&self, table: ReducerTable<S>, initial_state: S) -> Self::Combined;
}

/// Declarations fed to [`handle_actions`].
pub struct ReducerDefs<S> {
    bodies: BTreeMap<String, ReducerBody<S>>,
    registry: Option<Arc<KeyRegistry>>,
}

impl<S> Default for ReducerDefs<S> {
    fn default() -> Self {
        Self {
            bodies: BTreeMap::new(),
            registry: None,
        }
    }
}

impl<S: 'static> ReducerDefs<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the reducer for `name`.
    pub fn on<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&ReducerContext<S>, S, &Action) -> S + Send + Sync + 'static,
    {
        self.bodies.insert(name.into(), Arc::new(body));
        self
    }

    /// Record every key in `registry` when the table is built.
    pub fn register_in(mut self, registry: &Arc<KeyRegistry>) -> Self {
        self.registry = Some(Arc::clone(registry));
        self
    }

    /// Wrap and key every body without combining.
    pub fn into_table(self, prefix: &str) -> Result<ReducerTable<S>> {
        check_prefix(prefix, "handle_actions")?;

        let inner = Arc::new(ReducerSetInner {
            prefix: prefix.to_string(),
            bodies: self.bodies,
        });

        let mut table = ReducerTable::new();
        for (name, body) in &inner.bodies {
            let type_key = TypeKey::new(prefix, name);
            if let Some(registry) = &self.registry {
                registry.register(KeyKind::Reducer, type_key.clone());
            }
            let set = Arc::clone(&inner);
            let body = Arc::clone(body);
            let reducer: Reducer<S> = Arc::new(move |state: S, action: &Action| -> S {
                apply(&set, &body, state, action)
            });
            table.insert(type_key, reducer);
        }
        Ok(table)
    }
}

impl<S> fmt::Debug for ReducerDefs<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerDefs")
            .field("reducers", &self.bodies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Build the reducer table for `prefix` and combine it with `initial_state`.
pub fn handle_actions<S, C>(
    prefix: &str,
    defs: ReducerDefs<S>,
    initial_state: S,
    combiner: &C,
) -> Result<C::Combined>
where
    S: 'static,
    C: ReducerCombiner<S>,
{
    let table = defs.into_table(prefix)?;
    debug!(prefix, reducers = table.len(), "reducer table built");
    Ok(combiner.combine(table, initial_state))
}

struct ReducerSetInner<S> {
    prefix: String,
    bodies: BTreeMap<String, ReducerBody<S>>,
}

fn apply<S>(set: &Arc<ReducerSetInner<S>>, body: &ReducerBody<S>, state: S, action: &Action) -> S {
    if action.error {
        debug!(action = %action.type_key, "error-flagged action skipped");
        return state;
    }
    let ctx = ReducerContext {
        set: Arc::clone(set),
    };
    body(&ctx, state, action)
}

/// Access to sibling reducers of the same set.
pub struct ReducerContext<S> {
    set: Arc<ReducerSetInner<S>>,
}

impl<S> ReducerContext<S> {
    pub fn prefix(&self) -> &str {
        &self.set.prefix
    }

    pub fn has(&self, name: &str) -> bool {
        self.set.bodies.contains_key(name)
    }

    /// Run a sibling's wrapped reducer.
    pub fn delegate(&self, name: &str, state: S, action: &Action) -> Result<S> {
        let body = self.set.bodies.get(name).ok_or_else(|| Error::UnknownReducer {
            prefix: self.set.prefix.clone(),
            name: name.to_string(),
        })?;
        Ok(apply(&self.set, body, state, action))
    }
}

impl<S> fmt::Debug for ReducerContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerContext")
            .field("prefix", &self.set.prefix)
            .finish()
    }
}

/// Combiner producing a [`CombinedReducer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableCombiner;

impl<S: Clone> ReducerCombiner<S> for TableCombiner {
    type Combined = CombinedReducer<S>;

    fn combine(&self, table: ReducerTable<S>, initial_state: S) -> CombinedReducer<S> {
        CombinedReducer {
            table: Arc::new(table),
            initial_state,
        }
    }
}

/// A keyed reducer: looks up the action's type key, leaves state alone for
/// unknown types.
#[derive(Clone)]
pub struct CombinedReducer<S> {
    table: Arc<ReducerTable<S>>,
    initial_state: S,
}

impl<S: Clone> CombinedReducer<S> {
    pub fn initial_state(&self) -> S {
        self.initial_state.clone()
    }

    /// Reduce one action. `None` starts from the initial state.
    pub fn reduce(&self, state: Option<S>, action: &Action) -> S {
        let state = state.unwrap_or_else(|| self.initial_state.clone());
        match self.table.get(&action.type_key) {
            Some(reducer) => reducer(state, action),
            None => state,
        }
    }

    pub fn handles(&self, type_key: &TypeKey) -> bool {
        self.table.contains_key(type_key)
    }

    pub fn type_keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.table.keys()
    }
}

impl<S> fmt::Debug for CombinedReducer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("type_keys", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}
