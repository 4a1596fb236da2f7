//! Envelopes from an action set flowing through the reducer table declared
//! under the same prefix and names.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::{
    args, create_actions, create_actions_with_simple, handle_actions, Action, ActionDefs,
    ActionFailure, Args, CombinedReducer, KeyRegistry, ReducerDefs, TableCombiner, TypeKey,
};

fn random_name(len: usize) -> String {
    (0..len).map(|_| fastrand::alphabetic()).collect()
}

/// Reducer set counting how often each name ran.
fn counting(prefix: &str, names: &[String]) -> (CombinedReducer<i64>, BTreeMap<String, Arc<AtomicUsize>>) {
    let mut counters = BTreeMap::new();
    let mut defs = ReducerDefs::<i64>::new();
    for name in names {
        let counter = Arc::new(AtomicUsize::new(0));
        counters.insert(name.clone(), Arc::clone(&counter));
        defs = defs.on(name.clone(), move |_, n: i64, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            n + 1
        });
    }
    let reducer = handle_actions(prefix, defs, 0, &TableCombiner).unwrap();
    (reducer, counters)
}

#[tokio::test]
async fn test_type_keys_correlate_for_random_names() {
    fastrand::seed(7);
    for _ in 0..20 {
        let prefix = random_name(6);
        let names: Vec<String> = (0..4).map(|i| format!("{}{}", random_name(5), i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let actions = create_actions_with_simple(&prefix, &refs, ActionDefs::new()).unwrap();
        let (reducer, counters) = counting(&prefix, &names);

        let mut state = reducer.initial_state();
        for name in &names {
            let envelope = actions.call(name, args![]).unwrap();
            assert_eq!(envelope.type_key, TypeKey::new(&prefix, name));
            assert_eq!(envelope.type_key.as_str(), format!("{}.{}", prefix, name));

            let action = envelope.settle().await;
            state = reducer.reduce(Some(state), &action);
        }

        assert_eq!(state, names.len() as i64);
        for counter in counters.values() {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }
}

#[tokio::test]
async fn test_each_dispatch_runs_matching_reducer_once() {
    let names = vec!["a".to_string(), "b".to_string()];
    let actions = create_actions(
        "pair",
        ActionDefs::new().simple("a").simple("b"),
    )
    .unwrap();
    let (reducer, counters) = counting("pair", &names);

    let mut state = None;
    for _ in 0..3 {
        let action = actions.call("a", args![]).unwrap().settle().await;
        state = Some(reducer.reduce(state, &action));
    }

    assert_eq!(counters["a"].load(Ordering::SeqCst), 3);
    assert_eq!(counters["b"].load(Ordering::SeqCst), 0);
    assert_eq!(state, Some(3));
}

#[tokio::test]
async fn test_error_argument_never_reaches_reducer() {
    let actions = create_actions("load", ActionDefs::new().simple("done")).unwrap();
    let (reducer, counters) = counting("load", &["done".to_string()]);

    let envelope = actions
        .call("done", Args::error(ActionFailure::msg("offline")))
        .unwrap();
    assert!(envelope.error);

    let action = envelope.settle().await;
    assert!(action.error);
    assert_eq!(action.payload, json!("offline"));
    assert_eq!(reducer.reduce(Some(41), &action), 41);
    assert_eq!(counters["done"].load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_async_payload_skips_reducer() {
    let actions = create_actions(
        "load",
        ActionDefs::new().action("fetch", |_, _| {
            crate::Returned::future(async { Err::<Value, _>(anyhow::anyhow!("503")) })
        }),
    )
    .unwrap();
    let (reducer, counters) = counting("load", &["fetch".to_string()]);

    let action: Action = actions.call("fetch", args![]).unwrap().settle().await;
    assert!(action.error);
    assert_eq!(reducer.reduce(Some(1), &action), 1);
    assert_eq!(counters["fetch"].load(Ordering::SeqCst), 0);
}

#[test]
fn test_shared_registry_sees_both_sides() {
    let registry = Arc::new(KeyRegistry::new());
    create_actions(
        "todos",
        ActionDefs::new().simple("add").simple("remove").register_in(&registry),
    )
    .unwrap();
    handle_actions(
        "todos",
        ReducerDefs::new()
            .on("add", |_, n: i64, _| n + 1)
            .on("archive", |_, n: i64, _| n)
            .register_in(&registry),
        0,
        &TableCombiner,
    )
    .unwrap();

    let report = registry.check();
    assert_eq!(report.unmatched_actions, vec![TypeKey::new("todos", "remove")]);
    assert_eq!(report.unmatched_reducers, vec![TypeKey::new("todos", "archive")]);
    assert_eq!(report.diagnostics().len(), 2);
}
