//! # redux-keys
//!
//! Naming conventions and bindings over a unidirectional state store.
//!
//! ## Core Concepts
//!
//! Every action and every reducer is addressed by a [`TypeKey`]: `prefix.name`.
//! That key is the only link between the two sides.
//!
//! - [`create_actions`] builds action creators producing [`Envelope`]s
//! - [`handle_actions`] builds the matching reducer table
//! - [`connect`] projects store state and binds creators to the store's dispatch
//! - [`KeyRegistry::check`] reports keys declared on one side only
//!
//! ## Architecture
//!
//! ```text
//! consumer ──► BoundAction.call() ──► ActionCreator ──► Envelope{type, payload}
//!                                          │                  │
//!                                  ActionContext              ▼ Dispatch
//!                               (siblings, dispatch)        store
//!                                                             │ settle payload
//!                                                             ▼
//!                                        CombinedReducer ──► wrapped reducer
//!                                                             │ (skips error: true)
//!                                                             ▼
//! consumer ◄── Projection.map_state() ◄──────────────────── state
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Payloads are always futures** - synchronous values are wrapped explicitly
//! 2. **Error-flagged actions never change state** - every wrapped reducer skips them
//! 3. **Contexts are per call** - an [`ActionContext`] is built for each invocation
//! 4. **Registry is explicit** - no process-wide bookkeeping
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use redux_keys::{
//!     args, connect, create_actions_with_simple, handle_actions, Action,
//!     ActionDefs, ActionGroup, ConnectArg, KeyRegistry, ReducerDefs, TableCombiner,
//! };
//! use serde_json::{json, Value};
//!
//! let registry = Arc::new(KeyRegistry::new());
//!
//! // 1. Actions
//! let todos = create_actions_with_simple("todos", &["clear"], ActionDefs::new()
//!     .action("add", |_, args| args.value(0).cloned().unwrap_or(Value::Null))
//!     .register_in(&registry))?;
//!
//! // 2. Reducers
//! let reducer = handle_actions("todos", ReducerDefs::new()
//!     .on("add", |_, mut items: Vec<Value>, action: &Action| {
//!         items.push(action.payload.clone());
//!         items
//!     })
//!     .on("clear", |_, _, _| Vec::new())
//!     .register_in(&registry), Vec::new(), &TableCombiner)?;
//!
//! // 3. Startup check
//! assert!(registry.check().is_clean());
//!
//! // 4. Projection
//! let connector = connect(["todos".into(), ConnectArg::actions([("todos", ActionGroup::from(&todos))])])?;
//! let props = connector.projection().map_state(&json!({ "todos": [] }))?;
//! ```
//!
//! ## What This Is Not
//!
//! Not a store: creation, middleware, persistence and subscription management
//! belong to the engine behind [`ReducerCombiner`], [`Dispatch`] and
//! [`ComponentBinder`].

// Core modules
mod actions;
mod args_macro;
mod connect;
mod core;
mod error;
mod path;
mod reducers;
mod registry;

// Round-trip tests across factories (test-only)
#[cfg(test)]
mod round_trip_tests;

// Re-export core types
pub use crate::core::{Action, Arg, Args, BindingId, Dispatch, Envelope, Payload, Returned, TypeKey};

// Re-export error types
pub use crate::error::{ActionFailure, Error, Result};

// Re-export action factory
pub use actions::{
    create_actions, create_actions_with_simple, ActionContext, ActionCreator, ActionDefs,
    ActionSet, ErrorFlag,
};

// Re-export reducer factory
pub use reducers::{
    handle_actions, CombinedReducer, Reducer, ReducerCombiner, ReducerContext, ReducerDefs,
    ReducerTable, TableCombiner,
};

// Re-export key registry
pub use registry::{check_action_keys, KeyKind, KeyRegistry, KeyReport};

// Re-export projector
pub use connect::{
    connect, ActionGroup, BoundAction, BoundEntry, BoundGroup, ComponentBinder, ConnectArg,
    Connector, DispatchProps, GroupEntry, MapValue, Projection, Props, StateSpec,
};
pub use path::StatePath;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
