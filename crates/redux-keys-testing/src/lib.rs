//! Testing utilities for redux-keys.
//!
//! The core crate treats the store engine and the component binder as
//! external collaborators. This crate provides small in-memory stand-ins for
//! both so action sets, reducer tables and projections can be exercised end
//! to end:
//!
//! - [`TestStore`] queues dispatched envelopes, settles their payloads and runs
//!   every registered slice
//! - [`TestBinder`] connects a [`Projection`](redux_keys::Projection) to a store
//! - [`RecordingDispatch`] records envelopes without reducing them
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(TestStore::new().with_slice("todos", reducer)?);
//! let component = connect(["todos.items".into()])?.wrap(&TestBinder::new(&store), "TodoList");
//!
//! component.actions().call("todos", "add", args!["milk"])?;
//! store.settle().await?;
//! assert_eq!(component.props()?["items"], json!(["milk"]));
//! ```

mod binder;
mod recording;
mod store;


pub use binder::{ConnectedComponent, TestBinder};
pub use recording::RecordingDispatch;
pub use store::TestStore;
