//! Consistency check between declared action keys and declared reducer keys.
//!
//! The registry is an explicit object owned by the composition root and handed
//! to the factories via `register_in`. Run [`KeyRegistry::check`] once at
//! startup, after every factory has executed.
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(KeyRegistry::new());
//!
//! let actions = create_actions("todos", ActionDefs::new()
//!     .simple("clear")
//!     .register_in(&registry))?;
//! let reducer = handle_actions("todos", ReducerDefs::new()
//!     .on("clear", |_, _, _| Vec::new())
//!     .register_in(&registry), Vec::new(), &TableCombiner)?;
//!
//! assert!(registry.check().is_clean());
//! ```

use dashmap::DashSet;
use serde::Serialize;
use tracing::error;

use crate::core::TypeKey;

/// Which side of the pairing a key was declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Action,
    Reducer,
}

/// Bookkeeping of every declared action and reducer key.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    actions: DashSet<TypeKey>,
    reducers: DashSet<TypeKey>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declared key.
    pub fn register(&self, kind: KeyKind, key: TypeKey) {
        self.set(kind).insert(key);
    }

    pub fn contains(&self, kind: KeyKind, key: &TypeKey) -> bool {
        self.set(kind).contains(key)
    }

    /// Number of distinct keys declared for `kind`.
    pub fn len(&self, kind: KeyKind) -> usize {
        self.set(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.reducers.is_empty()
    }

    fn set(&self, kind: KeyKind) -> &DashSet<TypeKey> {
        match kind {
            KeyKind::Action => &self.actions,
            KeyKind::Reducer => &self.reducers,
        }
    }

    /// Compute both set differences without logging.
    pub fn report(&self) -> KeyReport {
        KeyReport {
            unmatched_actions: difference(&self.actions, &self.reducers),
            unmatched_reducers: difference(&self.reducers, &self.actions),
        }
    }

    /// Compute both set differences and log one diagnostic per non-empty side.
    ///
    /// Advisory only: never fails.
    pub fn check(&self) -> KeyReport {
        let report = self.report();
        for (kind, keys) in report.sides() {
            if !keys.is_empty() {
                error!(?kind, count = keys.len(), "{}", diagnostic(kind, keys));
            }
        }
        report
    }
}

fn difference(left: &DashSet<TypeKey>, right: &DashSet<TypeKey>) -> Vec<TypeKey> {
    let mut keys: Vec<TypeKey> = left
        .iter()
        .filter(|key| !right.contains(key.key()))
        .map(|key| key.key().clone())
        .collect();
    keys.sort();
    keys
}

fn join(keys: &[TypeKey]) -> String {
    keys.iter()
        .map(TypeKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of a registry check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyReport {
    /// Action keys no reducer handles, sorted.
    pub unmatched_actions: Vec<TypeKey>,
    /// Reducer keys no action produces, sorted.
    pub unmatched_reducers: Vec<TypeKey>,
}

impl KeyReport {
    pub fn is_clean(&self) -> bool {
        self.unmatched_actions.is_empty() && self.unmatched_reducers.is_empty()
    }

    /// The diagnostics [`KeyRegistry::check`] logs, one per non-empty side.
    pub fn diagnostics(&self) -> Vec<String> {
        self.sides()
            .into_iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(kind, keys)| diagnostic(kind, keys))
            .collect()
    }

    fn sides(&self) -> [(KeyKind, &[TypeKey]); 2] {
        [
            (KeyKind::Action, self.unmatched_actions.as_slice()),
            (KeyKind::Reducer, self.unmatched_reducers.as_slice()),
        ]
    }
}

fn diagnostic(kind: KeyKind, keys: &[TypeKey]) -> String {
    let side = match kind {
        KeyKind::Action => "actions",
        KeyKind::Reducer => "reducers",
    };
    format!("unmatched {}: {}", side, join(keys))
}

/// Check the registry and log mismatches.
pub fn check_action_keys(registry: &KeyRegistry) -> KeyReport {
    registry.check()
}
