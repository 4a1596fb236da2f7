//! In-memory store for tests.
//!
//! # Guarantees
//!
//! - **FIFO**: envelopes are reduced in dispatch order
//! - **Settled payloads**: a reducer only ever sees the resolved payload
//! - **Re-entrant**: envelopes dispatched while a payload settles join the queue
//!
//! Nothing happens until [`TestStore::settle`] is awaited.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use redux_keys::{Action, CombinedReducer, Dispatch, Envelope};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Type-erased slice: one combined reducer owning one top-level state key.
///
/// Reduction is two-phase so a failing slice leaves every slice untouched.
trait AnySlice: Send {
    fn key(&self) -> &str;

    /// Reduce into a pending state and return its JSON snapshot.
    fn stage(&mut self, action: &Action) -> Result<Value>;

    /// Make the pending state current.
    fn commit(&mut self);

    fn discard(&mut self);
}

struct Slice<S> {
    key: String,
    reducer: CombinedReducer<S>,
    state: Option<S>,
    staged: Option<S>,
}

impl<S> AnySlice for Slice<S>
where
    S: Clone + Serialize + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        &self.key
    }

    fn stage(&mut self, action: &Action) -> Result<Value> {
        let next = self.reducer.reduce(self.state.clone(), action);
        let snapshot = serde_json::to_value(&next)?;
        self.staged = Some(next);
        Ok(snapshot)
    }

    fn commit(&mut self) {
        if let Some(next) = self.staged.take() {
            self.state = Some(next);
        }
    }

    fn discard(&mut self) {
        self.staged = None;
    }
}

/// A minimal store: dispatch queue, slices, JSON state tree.
pub struct TestStore {
    state: Mutex<Map<String, Value>>,
    slices: Mutex<Vec<Box<dyn AnySlice>>>,
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    applied: Mutex<Vec<Action>>,
    version: watch::Sender<u64>,
}

impl TestStore {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (version, _) = watch::channel(0);
        Self {
            state: Mutex::new(Map::new()),
            slices: Mutex::new(Vec::new()),
            sender,
            receiver: Mutex::new(receiver),
            applied: Mutex::new(Vec::new()),
            version,
        }
    }

    /// Mount `reducer` under the top-level state key `key`.
    pub fn with_slice<S>(self, key: impl Into<String>, reducer: CombinedReducer<S>) -> Result<Self>
    where
        S: Clone + Serialize + Send + Sync + 'static,
    {
        let key = key.into();
        let initial = serde_json::to_value(reducer.initial_state())?;
        lock(&self.state).insert(key.clone(), initial);
        lock(&self.slices).push(Box::new(Slice {
            key,
            reducer,
            state: None,
            staged: None,
        }));
        Ok(self)
    }

    /// The raw dispatch function of this store.
    pub fn dispatcher(&self) -> Dispatch {
        let sender = self.sender.clone();
        Dispatch::new(move |envelope: Envelope| {
            let type_key = envelope.type_key.clone();
            if sender.send(envelope).is_err() {
                warn!(action = %type_key, "store dropped, envelope discarded");
            }
        })
    }

    pub fn dispatch(&self, envelope: Envelope) {
        self.dispatcher().dispatch(envelope)
    }

    /// Drain the queue: settle each payload and run every slice.
    ///
    /// Returns the actions applied by this call, in order.
    pub async fn settle(&self) -> Result<Vec<Action>> {
        let mut applied = Vec::new();
        loop {
            let next = lock(&self.receiver).try_recv();
            let Ok(envelope) = next else { break };

            let action = envelope.settle().await;
            self.apply(&action)?;
            applied.push(action);
        }
        Ok(applied)
    }

    fn apply(&self, action: &Action) -> Result<()> {
        let mut slices = lock(&self.slices);
        let staged: Result<Vec<(String, Value)>> = slices
            .iter_mut()
            .map(|slice| Ok((slice.key().to_string(), slice.stage(action)?)))
            .collect();
        let snapshots = match staged {
            Ok(snapshots) => snapshots,
            Err(e) => {
                slices.iter_mut().for_each(|slice| slice.discard());
                warn!(action = %action.type_key, error = %e, "slice snapshot failed, nothing applied");
                return Err(e);
            }
        };
        slices.iter_mut().for_each(|slice| slice.commit());
        drop(slices);

        let mut state = lock(&self.state);
        for (key, value) in snapshots {
            state.insert(key, value);
        }
        drop(state);

        lock(&self.applied).push(action.clone());
        self.version.send_modify(|version| *version += 1);
        debug!(action = %action.type_key, error = action.error, "action applied");
        Ok(())
    }

    /// Snapshot of the whole state tree.
    pub fn state(&self) -> Value {
        Value::Object(lock(&self.state).clone())
    }

    /// Every action applied so far.
    pub fn applied(&self) -> Vec<Action> {
        lock(&self.applied).clone()
    }

    /// Number of applied actions; bumps on every change.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Change notifications.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestStore")
            .field("slices", &lock(&self.slices).len())
            .field("version", &self.version())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
