//! # Todo Demo
//!
//! Declares a namespaced action set and reducer table, mounts them in the
//! in-memory store, connects a component and drives it through a fetch.
//!
//! Run with `RUST_LOG=redux_keys=debug cargo run -p todo-demo` to see every
//! envelope and binding.

use std::sync::Arc;

use anyhow::Result;
use redux_keys::{
    args, connect, create_actions_with_simple, handle_actions, Action, ActionContext,
    ActionDefs, ActionFailure, ActionGroup, ActionSet, Args, CombinedReducer, ConnectArg,
    KeyRegistry, ReducerDefs, Returned, TableCombiner,
};
use redux_keys_testing::{TestBinder, TestStore};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
struct Todos {
    items: Vec<String>,
    loading: bool,
}

// ============================================================================
// Actions
// ============================================================================

fn todo_actions(registry: &Arc<KeyRegistry>) -> Result<ActionSet> {
    let actions = create_actions_with_simple(
        "todos",
        &["loading", "loaded", "add", "clear"],
        ActionDefs::new()
            .action("fetch", |ctx: &ActionContext, _| {
                let ctx = ctx.clone();
                Returned::future(async move {
                    ctx.call("loading", args![])?;
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    ctx.call("loaded", args![])?;
                    Ok::<_, anyhow::Error>(json!(["write docs", "ship it"]))
                })
            })
            .register_in(registry),
    )?;
    Ok(actions)
}

// ============================================================================
// Reducers
// ============================================================================

fn todo_reducer(registry: &Arc<KeyRegistry>) -> Result<CombinedReducer<Todos>> {
    let reducer = handle_actions(
        "todos",
        ReducerDefs::new()
            .on("loading", |_, mut s: Todos, _| {
                s.loading = true;
                s
            })
            .on("loaded", |_, mut s: Todos, _| {
                s.loading = false;
                s
            })
            .on("fetch", |_, mut s: Todos, action: &Action| {
                s.items = serde_json::from_value(action.payload.clone()).unwrap_or_default();
                s
            })
            .on("add", |_, mut s: Todos, action: &Action| {
                if let Some(item) = action.payload.as_str() {
                    s.items.push(item.to_string());
                }
                s
            })
            .on("clear", |_, mut s: Todos, _| {
                s.items.clear();
                s
            })
            .register_in(registry),
        Todos::default(),
        &TableCombiner,
    )?;
    Ok(reducer)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,redux_keys=debug")),
        )
        .init();

    let registry = Arc::new(KeyRegistry::new());
    let actions = todo_actions(&registry)?;
    let store = Arc::new(TestStore::new().with_slice("todos", todo_reducer(&registry)?)?);

    let report = registry.check();
    info!(clean = report.is_clean(), "action keys checked");

    let component = connect([
        ConnectArg::aliases([("list", "todos.items"), ("busy", "todos.loading")]),
        ConnectArg::actions([("todos", ActionGroup::from(&actions))]),
    ])?
    .wrap(&TestBinder::new(&store), "TodoList");

    component.actions().call("todos", "fetch", args![])?;
    store.settle().await?;
    info!(props = %serde_json::Value::Object(component.props()?), "after fetch");

    component.actions().call("todos", "add", args!["celebrate"])?;
    // A lone error argument flags the envelope; the reducer ignores it.
    component.actions().call(
        "todos",
        "add",
        Args::error(ActionFailure::msg("quota exceeded")),
    )?;
    store.settle().await?;
    info!(props = %serde_json::Value::Object(component.props()?), "after add");

    for action in store.applied() {
        info!(action = %action.type_key, error = action.error, payload = %action.payload, "applied");
    }

    Ok(())
}
