//! Component binder backed by a [`TestStore`].

use std::sync::Arc;

use anyhow::Result;
use redux_keys::{ComponentBinder, DispatchProps, Projection, Props};
use tokio::sync::watch;

use crate::store::TestStore;

/// Binds projections to a shared [`TestStore`].
#[derive(Debug, Clone)]
pub struct TestBinder {
    store: Arc<TestStore>,
}

impl TestBinder {
    pub fn new(store: &Arc<TestStore>) -> Self {
        Self {
            store: Arc::clone(store),
        }
    }
}

impl ComponentBinder for TestBinder {
    type Component = &'static str;
    type Connected = ConnectedComponent;

    fn bind(&self, projection: Projection, component: &'static str) -> ConnectedComponent {
        let actions = projection.map_dispatch(self.store.dispatcher());
        ConnectedComponent {
            name: component,
            changes: self.store.subscribe(),
            store: Arc::clone(&self.store),
            projection,
            actions,
        }
    }
}

/// A named component subscribed to a store.
#[derive(Debug)]
pub struct ConnectedComponent {
    name: &'static str,
    projection: Projection,
    actions: DispatchProps,
    store: Arc<TestStore>,
    changes: watch::Receiver<u64>,
}

impl ConnectedComponent {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state-side properties.
    pub fn props(&self) -> redux_keys::Result<Props> {
        self.projection.map_state(&self.store.state())
    }

    /// Dispatch-side properties of this instance.
    pub fn actions(&self) -> &DispatchProps {
        &self.actions
    }

    /// Wait for the next store change and recompute the properties.
    pub async fn changed(&mut self) -> Result<Props> {
        self.changes.changed().await?;
        Ok(self.props()?)
    }
}
