//! Error types for redux-keys.
//!
//! [`Error`] covers everything the factories and the projector can reject
//! synchronously. [`ActionFailure`] is the value-level error: it travels as an
//! action argument or as the rejection of a payload, and never aborts a call.
//!
//! # Error Boundary Rule
//!
//! > **No `anyhow::Error` ever reaches a reducer.**
//!
//! - `anyhow` is internal transport (ergonomic for action bodies)
//! - a rejected payload settles into an error-flagged [`Action`](crate::Action)
//!   carrying only the failure message

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Pattern-matchable errors returned by the factories and the projector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A factory was given a blank namespace prefix.
    #[error("{factory} needs a non-empty prefix, got {prefix:?}")]
    InvalidPrefix {
        /// Which factory rejected it (`create_actions` or `handle_actions`).
        factory: &'static str,
        /// The rejected prefix.
        prefix: String,
    },

    /// An action context was asked for a sibling that was never defined.
    #[error("no action named {name:?} under prefix {prefix:?}")]
    UnknownAction {
        /// Prefix of the action set.
        prefix: String,
        /// The missing name.
        name: String,
    },

    /// Bound dispatch props were asked for an action not in the named group.
    #[error("no action {name:?} in action group {group:?}")]
    UnknownBoundAction {
        /// The group property key given to `connect`.
        group: String,
        /// The missing name.
        name: String,
    },

    /// A reducer context was asked for a sibling that was never defined.
    #[error("no reducer named {name:?} under prefix {prefix:?}")]
    UnknownReducer {
        /// Prefix of the reducer set.
        prefix: String,
        /// The missing name.
        name: String,
    },

    /// A dotted path tried to descend into a value that is not a container.
    #[error("[store connect error] Unknown store path: \"{path}\"")]
    PathResolution {
        /// The full dotted path that failed.
        path: String,
    },

    /// An empty string was given as a state path.
    #[error("state path must not be empty")]
    EmptyStatePath,

    /// A connect argument mixed state paths and action groups.
    #[error("invalid connect argument: {reason}")]
    InvalidConnectArg {
        /// What was wrong.
        reason: String,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure value carried by arguments and payloads.
///
/// Cheap to clone, so a single failure can be observed by every awaiter of a
/// shared payload.
#[derive(Clone)]
pub struct ActionFailure(Arc<anyhow::Error>);

impl ActionFailure {
    /// Wrap any error.
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(error.into()))
    }

    /// Build a failure from a plain message.
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self(Arc::new(anyhow::Error::msg(message)))
    }

    /// The failure rendered as a single line.
    pub fn message(&self) -> String {
        self.0.to_string()
    }

    /// Access the underlying error, e.g. to `downcast_ref`.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Debug for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionFailure").field(&self.message()).finish()
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for ActionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
