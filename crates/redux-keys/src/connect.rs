//! Store projector: state and dispatch projection for connected consumers.
//!
//! A [`Connector`] describes which state paths a consumer reads and which
//! action groups it may dispatch. Its [`Projection`] provides the two functions
//! a component binder needs:
//!
//! - [`Projection::map_state`] resolves dotted paths into a property map
//! - [`Projection::map_dispatch`] binds action creators to the store's dispatch
//!
//! Subscription and re-rendering belong to the [`ComponentBinder`].
//!
//! # Example
//!
//! ```ignore
//! use redux_keys::{connect, ConnectArg, ActionGroup};
//!
//! // states only
//! let c = connect(["projects.data".into(), "projects.other".into()])?;
//! // aliased states
//! let c = connect([ConnectArg::aliases([("project", "projects"), ("other", "projects.other")])])?;
//! // states and actions
//! let c = connect(["projects.data".into(), ConnectArg::actions([("projects", ActionGroup::from(&project_actions))])])?;
//!
//! let props = c.projection().map_state(&store_state)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::actions::{ActionCreator, ActionSet};
use crate::core::{Args, BindingId, Dispatch, Envelope};
use crate::error::{Error, Result};
use crate::path::StatePath;

/// Projected state properties.
pub type Props = Map<String, Value>;

/// One state-projection entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSpec {
    /// Projected under its last segment.
    Path(StatePath),
    /// Each path projected under its alias.
    Aliases(Vec<(String, StatePath)>),
}

/// An entry of an [`ActionGroup`].
#[derive(Debug, Clone)]
pub enum GroupEntry {
    Creator(ActionCreator),
    /// Passed through to the consumer untouched.
    Constant(Value),
}

/// Named action creators (and constants) exposed under one property key.
#[derive(Debug, Clone, Default)]
pub struct ActionGroup {
    entries: BTreeMap<String, GroupEntry>,
}

impl ActionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creator(mut self, name: impl Into<String>, creator: ActionCreator) -> Self {
        self.entries.insert(name.into(), GroupEntry::Creator(creator));
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.entries.insert(name.into(), GroupEntry::Constant(value));
        self
    }

    /// Add every creator of `set` under its own name.
    pub fn with_set(self, set: &ActionSet) -> Self {
        set.iter().fold(self, |group, creator| {
            let name = creator.name().to_string();
            group.with_creator(name, creator)
        })
    }

    pub fn get(&self, name: &str) -> Option<&GroupEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&ActionSet> for ActionGroup {
    fn from(set: &ActionSet) -> Self {
        ActionGroup::new().with_set(set)
    }
}

// =============================================================================
// Positional arguments
// =============================================================================

/// Value inside a [`ConnectArg::Map`].
#[derive(Debug, Clone)]
pub enum MapValue {
    Path(String),
    Group(ActionGroup),
}

/// One positional argument to [`connect`].
///
/// Maps keep insertion order: the first value decides whether a trailing map
/// is an alias map or the action map.
#[derive(Debug, Clone)]
pub enum ConnectArg {
    Path(String),
    Map(Vec<(String, MapValue)>),
}

impl ConnectArg {
    /// An alias map: alias -> dotted path.
    pub fn aliases<I, K, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        ConnectArg::Map(
            entries
                .into_iter()
                .map(|(k, p)| (k.into(), MapValue::Path(p.into())))
                .collect(),
        )
    }

    /// An action map: property key -> group.
    pub fn actions<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ActionGroup)>,
        K: Into<String>,
    {
        ConnectArg::Map(
            entries
                .into_iter()
                .map(|(k, g)| (k.into(), MapValue::Group(g)))
                .collect(),
        )
    }
}

impl From<&str> for ConnectArg {
    fn from(path: &str) -> Self {
        ConnectArg::Path(path.to_string())
    }
}

impl From<String> for ConnectArg {
    fn from(path: String) -> Self {
        ConnectArg::Path(path)
    }
}

/// Build a connector from positional arguments.
///
/// A trailing map is the action map unless its first value is a path, in
/// which case it is one more alias map and the action map is empty.
pub fn connect<I>(args: I) -> Result<Connector>
where
    I: IntoIterator<Item = ConnectArg>,
{
    let mut args: Vec<ConnectArg> = args.into_iter().collect();
    let mut connector = Connector::new();

    match args.pop() {
        Some(ConnectArg::Map(entries)) if !first_is_path(&entries) => {
            for (key, value) in entries {
                match value {
                    MapValue::Group(group) => connector = connector.actions(key, group),
                    MapValue::Path(path) => {
                        return Err(Error::InvalidConnectArg {
                            reason: format!("action map entry {:?} is the path {:?}", key, path),
                        })
                    }
                }
            }
        }
        Some(other) => args.push(other),
        None => {}
    }

    let mut specs = Vec::with_capacity(args.len());
    for arg in args {
        specs.push(match arg {
            ConnectArg::Path(path) => StateSpec::Path(StatePath::parse(path)?),
            ConnectArg::Map(entries) => StateSpec::Aliases(alias_entries(entries)?),
        });
    }
    connector.specs = specs;
    Ok(connector)
}

fn first_is_path(entries: &[(String, MapValue)]) -> bool {
    matches!(entries.first(), Some((_, MapValue::Path(_))))
}

fn alias_entries(entries: Vec<(String, MapValue)>) -> Result<Vec<(String, StatePath)>> {
    entries
        .into_iter()
        .map(|(alias, value)| match value {
            MapValue::Path(path) => Ok((alias, StatePath::parse(path)?)),
            MapValue::Group(_) => Err(Error::InvalidConnectArg {
                reason: format!("alias {:?} maps to an action group", alias),
            }),
        })
        .collect()
}

// =============================================================================
// Connector / Projection
// =============================================================================

/// Outer-surface binder that subscribes a component to the store.
pub trait ComponentBinder {
    type Component;
    type Connected;

    fn bind(&self, projection: Projection, component: Self::Component) -> Self::Connected;
}

/// State specs and action groups for one consumer.
#[derive(Debug, Clone, Default)]
pub struct Connector {
    specs: Vec<StateSpec>,
    groups: BTreeMap<String, ActionGroup>,
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project `path` under its last segment.
    pub fn path(mut self, path: &str) -> Result<Self> {
        self.specs.push(StateSpec::Path(StatePath::parse(path)?));
        Ok(self)
    }

    /// Project `path` under `alias`.
    pub fn alias(self, alias: impl Into<String>, path: &str) -> Result<Self> {
        self.aliases([(alias.into(), path)])
    }

    pub fn aliases<I, K, P>(mut self, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(alias, path)| Ok((alias.into(), StatePath::parse(path.as_ref())?)))
            .collect::<Result<Vec<_>>>()?;
        self.specs.push(StateSpec::Aliases(entries));
        Ok(self)
    }

    /// Expose `group` under the property `key`.
    pub fn actions(mut self, key: impl Into<String>, group: impl Into<ActionGroup>) -> Self {
        self.groups.insert(key.into(), group.into());
        self
    }

    pub fn specs(&self) -> &[StateSpec] {
        &self.specs
    }

    pub fn group(&self, key: &str) -> Option<&ActionGroup> {
        self.groups.get(key)
    }

    pub fn projection(&self) -> Projection {
        Projection {
            inner: Arc::new(self.clone()),
        }
    }

    /// Hand the projection to `binder` together with `component`.
    pub fn wrap<B: ComponentBinder>(self, binder: &B, component: B::Component) -> B::Connected {
        binder.bind(
            Projection {
                inner: Arc::new(self),
            },
            component,
        )
    }
}

/// The `map_state` / `map_dispatch` pair handed to a component binder.
#[derive(Clone)]
pub struct Projection {
    inner: Arc<Connector>,
}

impl Projection {
    /// Project `state` into consumer properties.
    pub fn map_state(&self, state: &Value) -> Result<Props> {
        let mut props = Props::new();
        for spec in &self.inner.specs {
            match spec {
                StateSpec::Path(path) => {
                    props.insert(path.leaf().to_string(), path.resolve(state)?);
                }
                StateSpec::Aliases(entries) => {
                    for (alias, path) in entries {
                        props.insert(alias.clone(), path.resolve(state)?);
                    }
                }
            }
        }
        Ok(props)
    }

    /// Bind every action group to `dispatch`.
    pub fn map_dispatch(&self, dispatch: Dispatch) -> DispatchProps {
        let binding = BindingId::new();
        let groups = self
            .inner
            .groups
            .iter()
            .map(|(key, group)| {
                let entries = group
                    .entries
                    .iter()
                    .map(|(name, entry)| {
                        let bound = match entry {
                            GroupEntry::Creator(creator) => BoundEntry::Action(BoundAction {
                                creator: creator.clone(),
                                dispatch: dispatch.clone(),
                            }),
                            GroupEntry::Constant(value) => BoundEntry::Constant(value.clone()),
                        };
                        (name.clone(), bound)
                    })
                    .collect();
                (key.clone(), BoundGroup { entries })
            })
            .collect::<BTreeMap<_, _>>();

        debug!(%binding, groups = groups.len(), "dispatch bound");
        DispatchProps { binding, groups }
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("specs", &self.inner.specs)
            .field("groups", &self.inner.groups.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Bound dispatch props
// =============================================================================

/// An action creator bound to a store dispatch.
#[derive(Debug, Clone)]
pub struct BoundAction {
    creator: ActionCreator,
    dispatch: Dispatch,
}

impl BoundAction {
    pub fn type_key(&self) -> &crate::core::TypeKey {
        self.creator.type_key()
    }

    /// Run the creator with a context bound to the dispatch, then dispatch its
    /// envelope.
    pub fn call(&self, args: Args) -> Envelope {
        let envelope = self.creator.invoke(Some(&self.dispatch), args);
        self.dispatch.dispatch(envelope.clone());
        envelope
    }
}

#[derive(Debug, Clone)]
pub enum BoundEntry {
    Action(BoundAction),
    Constant(Value),
}

/// One bound action group.
#[derive(Debug, Clone, Default)]
pub struct BoundGroup {
    entries: BTreeMap<String, BoundEntry>,
}

impl BoundGroup {
    pub fn get(&self, name: &str) -> Option<&BoundEntry> {
        self.entries.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&BoundAction> {
        match self.entries.get(name) {
            Some(BoundEntry::Action(action)) => Some(action),
            _ => None,
        }
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        match self.entries.get(name) {
            Some(BoundEntry::Constant(value)) => Some(value),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Dispatch-side properties of one binding.
#[derive(Debug, Clone)]
pub struct DispatchProps {
    binding: BindingId,
    groups: BTreeMap<String, BoundGroup>,
}

impl DispatchProps {
    pub fn binding(&self) -> BindingId {
        self.binding
    }

    pub fn group(&self, key: &str) -> Option<&BoundGroup> {
        self.groups.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Call `group.name`, failing with [`Error::UnknownBoundAction`] if absent.
    pub fn call(&self, group: &str, name: &str, args: Args) -> Result<Envelope> {
        let action = self
            .group(group)
            .and_then(|g| g.action(name))
            .ok_or_else(|| Error::UnknownBoundAction {
                group: group.to_string(),
                name: name.to_string(),
            })?;
        Ok(action.call(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{create_actions_with_simple, ActionContext, ActionDefs};
    use serde_json::json;
    use std::sync::Mutex;

    fn todos() -> ActionSet {
        create_actions_with_simple(
            "todos",
            &["loading"],
            ActionDefs::new().action("add", |ctx: &ActionContext, args: Args| {
                ctx.delegate("loading", Args::new());
                args.value(0).cloned().unwrap_or(Value::Null)
            }),
        )
        .unwrap()
    }

    fn recording() -> (Dispatch, Arc<Mutex<Vec<Envelope>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (
            Dispatch::new(move |envelope| sink.lock().unwrap().push(envelope)),
            seen,
        )
    }

    fn keys(seen: &Arc<Mutex<Vec<Envelope>>>) -> Vec<String> {
        seen.lock()
            .unwrap()
            .iter()
            .map(|e| e.type_key.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_bare_path_projects_leaf() {
        let state = json!({ "a": { "b": { "c": 42 } } });
        let props = connect(["a.b.c".into()]).unwrap().projection().map_state(&state).unwrap();
        assert_eq!(Value::Object(props), json!({ "c": 42 }));
    }

    #[test]
    fn test_alias_map_projects_alias() {
        let state = json!({ "a": { "b": { "c": 42 } } });
        let props = connect([ConnectArg::aliases([("x", "a.b.c")])])
            .unwrap()
            .projection()
            .map_state(&state)
            .unwrap();
        assert_eq!(Value::Object(props), json!({ "x": 42 }));
    }

    #[test]
    fn test_missing_path_errors_with_full_path() {
        let state = json!({ "a": {} });
        let err = connect(["a.missing.c".into()])
            .unwrap()
            .projection()
            .map_state(&state)
            .unwrap_err();
        assert!(err.to_string().contains("\"a.missing.c\""));
    }

    #[test]
    fn test_trailing_alias_map_is_state() {
        let connector = connect([
            "projects.data".into(),
            ConnectArg::aliases([("other", "projects.other")]),
        ])
        .unwrap();
        assert_eq!(connector.specs().len(), 2);
        assert!(connector.group("other").is_none());
    }

    #[test]
    fn test_trailing_action_map_is_actions() {
        let set = todos();
        let connector = connect([
            "todos.items".into(),
            ConnectArg::actions([("todos", ActionGroup::from(&set))]),
        ])
        .unwrap();
        assert_eq!(connector.specs().len(), 1);
        assert_eq!(connector.group("todos").map(ActionGroup::len), Some(2));
    }

    #[test]
    fn test_empty_trailing_map_is_empty_actions() {
        let connector = connect(["a".into(), ConnectArg::Map(Vec::new())]).unwrap();
        assert_eq!(connector.specs().len(), 1);
    }

    #[test]
    fn test_mixed_maps_rejected() {
        let mixed = ConnectArg::Map(vec![
            ("todos".to_string(), MapValue::Group(ActionGroup::new())),
            ("x".to_string(), MapValue::Path("a.b".to_string())),
        ]);
        assert!(matches!(
            connect([mixed]),
            Err(Error::InvalidConnectArg { .. })
        ));

        let alias_then_group = ConnectArg::Map(vec![
            ("x".to_string(), MapValue::Path("a.b".to_string())),
            ("todos".to_string(), MapValue::Group(ActionGroup::new())),
        ]);
        assert!(matches!(
            connect([alias_then_group]),
            Err(Error::InvalidConnectArg { .. })
        ));
    }

    #[test]
    fn test_builder_matches_positional_form() {
        let state = json!({ "p": { "list": [1, 2], "count": 2 } });
        let built = Connector::new()
            .path("p.count")
            .unwrap()
            .alias("items", "p.list")
            .unwrap();
        let positional = connect([
            "p.count".into(),
            ConnectArg::aliases([("items", "p.list")]),
        ])
        .unwrap();
        assert_eq!(
            built.projection().map_state(&state).unwrap(),
            positional.projection().map_state(&state).unwrap()
        );
    }

    #[tokio::test]
    async fn test_bound_action_dispatches_envelope() {
        let set = todos();
        let connector = Connector::new().actions("todos", &set);
        let (dispatch, seen) = recording();

        let props = connector.projection().map_dispatch(dispatch);
        let envelope = props.call("todos", "add", crate::args!["milk"]).unwrap();

        assert_eq!(envelope.payload.settle().await.unwrap(), json!("milk"));
        assert_eq!(keys(&seen), vec!["todos.loading", "todos.add"]);
    }

    #[test]
    fn test_constants_pass_through() {
        let group = ActionGroup::new().with_constant("home", json!("/"));
        let (dispatch, seen) = recording();
        let props = Connector::new()
            .actions("routes", group)
            .projection()
            .map_dispatch(dispatch);

        let routes = props.group("routes").unwrap();
        assert_eq!(routes.constant("home"), Some(&json!("/")));
        assert!(routes.action("home").is_none());
        assert!(keys(&seen).is_empty());
    }

    #[test]
    fn test_unknown_bound_action_names_group() {
        let (dispatch, seen) = recording();
        let props = Connector::new()
            .actions("list", &todos())
            .projection()
            .map_dispatch(dispatch);

        let err = props.call("list", "nope", crate::args![]).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownBoundAction {
                group: "list".to_string(),
                name: "nope".to_string(),
            }
        );
        assert_eq!(err.to_string(), r#"no action "nope" in action group "list""#);
        assert!(props.call("todos", "add", crate::args![]).is_err());
        assert!(keys(&seen).is_empty());
    }

    #[test]
    fn test_each_binding_gets_own_id() {
        let projection = Connector::new().actions("todos", &todos()).projection();
        let (dispatch, _) = recording();
        let first = projection.map_dispatch(dispatch.clone());
        let second = projection.map_dispatch(dispatch);
        assert_ne!(first.binding(), second.binding());
    }

    #[test]
    fn test_wrap_delegates_to_binder() {
        struct Named;
        impl ComponentBinder for Named {
            type Component = &'static str;
            type Connected = (String, Props);

            fn bind(&self, projection: Projection, component: &'static str) -> Self::Connected {
                let props = projection
                    .map_state(&json!({ "user": { "name": "ada" } }))
                    .unwrap_or_default();
                (component.to_string(), props)
            }
        }

        let (name, props) = connect(["user.name".into()]).unwrap().wrap(&Named, "Profile");
        assert_eq!(name, "Profile");
        assert_eq!(props.get("name"), Some(&json!("ada")));
    }
}
