//! The command tree.
//!
//! Actions are declared with the [`Action`] builder and frozen into an
//! immutable [`CommandTree`]. Nodes live in an arena and refer to their
//! parent and children by [`ActionId`]; [`ActionRef`] is a cheap, copyable
//! view of one node that can walk up and down the tree.
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{Action, OptionSpec};
//!
//! let tree = Action::new("app")
//!     .option(OptionSpec::boolean("verbose").short('v'))
//!     .action(
//!         Action::new("db").action(
//!             Action::new("migrate")
//!                 .option(OptionSpec::numeric("steps").with_default(1))
//!                 .handler(|ctx| {
//!                     ctx.writeln(format!("migrating {} steps", ctx.int("steps").unwrap_or(0)))?;
//!                     Ok(())
//!                 }),
//!         ),
//!     )
//!     .build()?;
//!
//! let migrate = tree.root().child("db").and_then(|db| db.child("migrate")).unwrap();
//! assert_eq!(migrate.path(), "app db migrate");
//! assert_eq!(migrate.root().name(), "app");
//! # Ok::<(), cmdtree::DefinitionError>(())
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::context::Context;
use crate::event::EventContext;
use crate::handler::{Command, EventHandler, EventListener, Handler, HandlerResult};
use crate::option::OptionSpec;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("name pattern is valid"));

/// Errors found while freezing a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("invalid action name '{0}'")]
    InvalidActionName(String),

    #[error("invalid option name '{option}' on '{action}'")]
    InvalidOptionName { action: String, option: String },

    #[error("duplicate option '{option}' on '{action}'")]
    DuplicateOption { action: String, option: String },

    #[error("duplicate short option '-{short}' on '{action}'")]
    DuplicateShortOption { action: String, short: char },

    #[error("duplicate action '{child}' under '{action}'")]
    DuplicateAction { action: String, child: String },

    #[error("duplicate event '{event}' on '{action}'")]
    DuplicateEvent { action: String, event: String },

    #[error("action '{0}' has neither a handler nor sub-actions")]
    EmptyAction(String),
}

/// Index of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

impl ActionId {
    pub const ROOT: ActionId = ActionId(0);
}

struct ActionNode {
    name: String,
    path: String,
    description: Option<String>,
    handler: Option<Handler>,
    arguments_enabled: bool,
    options: Vec<OptionSpec>,
    children: Vec<ActionId>,
    events: HashMap<String, EventHandler>,
    parent: Option<ActionId>,
}

/// An immutable tree of actions.
pub struct CommandTree {
    nodes: Vec<ActionNode>,
}

impl CommandTree {
    pub fn root(&self) -> ActionRef<'_> {
        self.at(ActionId::ROOT)
    }

    /// Returns a view of the node with the given id, if this tree has one.
    pub fn get(&self, id: ActionId) -> Option<ActionRef<'_>> {
        (id.0 < self.nodes.len()).then(|| self.at(id))
    }

    /// View of a node whose id came from this tree.
    pub(crate) fn at(&self, id: ActionId) -> ActionRef<'_> {
        ActionRef { tree: self, id }
    }

    /// Number of actions, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds an action by its space-separated path below the root.
    ///
    /// An empty path is the root itself.
    pub fn find(&self, path: &str) -> Option<ActionRef<'_>> {
        path.split_whitespace()
            .try_fold(self.root(), |action, name| action.child(name))
    }

    fn node(&self, id: ActionId) -> &ActionNode {
        &self.nodes[id.0]
    }
}

impl fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.nodes.iter().map(|node| &node.path))
            .finish()
    }
}

/// A borrowed view of one action.
#[derive(Clone, Copy)]
pub struct ActionRef<'a> {
    tree: &'a CommandTree,
    id: ActionId,
}

impl<'a> ActionRef<'a> {
    fn node(&self) -> &'a ActionNode {
        self.tree.node(self.id)
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    /// Fully-qualified command path, e.g. `app db migrate`.
    pub fn path(&self) -> &'a str {
        &self.node().path
    }

    pub fn description(&self) -> Option<&'a str> {
        self.node().description.as_deref()
    }

    pub fn handler(&self) -> Option<&'a Handler> {
        self.node().handler.as_ref()
    }

    pub fn arguments_enabled(&self) -> bool {
        self.node().arguments_enabled
    }

    /// Declared options in declaration order.
    pub fn options(&self) -> &'a [OptionSpec] {
        &self.node().options
    }

    /// Looks an option up by long name.
    pub fn option(&self, name: &str) -> Option<&'a OptionSpec> {
        self.options().iter().find(|spec| spec.name() == name)
    }

    /// Looks an option up by its single-character alias.
    pub fn option_by_short(&self, short: char) -> Option<&'a OptionSpec> {
        self.options()
            .iter()
            .find(|spec| spec.short_name() == Some(short))
    }

    pub fn children(&self) -> impl Iterator<Item = ActionRef<'a>> + 'a {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |id| ActionRef { tree, id: *id })
    }

    pub fn child(&self, name: &str) -> Option<ActionRef<'a>> {
        self.children().find(|child| child.name() == name)
    }

    pub fn has_children(&self) -> bool {
        !self.node().children.is_empty()
    }

    pub fn parent(&self) -> Option<ActionRef<'a>> {
        self.node().parent.map(|id| self.tree.at(id))
    }

    pub fn root(&self) -> ActionRef<'a> {
        self.tree.root()
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    pub fn event_handler(&self, event: &str) -> Option<&'a EventHandler> {
        self.node().events.get(event)
    }
}

impl fmt::Debug for ActionRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionRef").field(&self.path()).finish()
    }
}

/// Builder for one action and its subtree.
pub struct Action {
    name: String,
    description: Option<String>,
    handler: Option<Handler>,
    arguments_enabled: bool,
    options: Vec<OptionSpec>,
    children: Vec<Action>,
    events: Vec<(String, EventHandler)>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            handler: None,
            arguments_enabled: false,
            options: Vec::new(),
            children: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a closure handler.
    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> HandlerResult + 'static,
    {
        self.handler = Some(Handler::callback(f));
        self
    }

    /// Sets an object handler.
    pub fn command<C>(mut self, command: C) -> Self
    where
        C: Command + 'static,
    {
        self.handler = Some(Handler::instance(command));
        self
    }

    /// Sets an already-built handler.
    pub fn handler_value(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Allows positional arguments.
    pub fn arguments(mut self, enabled: bool) -> Self {
        self.arguments_enabled = enabled;
        self
    }

    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.options.push(spec);
        self
    }

    /// Adds a sub-action.
    pub fn action(mut self, child: Action) -> Self {
        self.children.push(child);
        self
    }

    /// Declares a closure handler for an event.
    pub fn event<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&EventContext<'_>, &[Value]) -> HandlerResult + 'static,
    {
        self.events.push((name.into(), EventHandler::callback(f)));
        self
    }

    /// Declares an object handler for an event.
    pub fn listener<L>(mut self, name: impl Into<String>, listener: L) -> Self
    where
        L: EventListener + 'static,
    {
        self.events.push((name.into(), EventHandler::instance(listener)));
        self
    }

    /// Adds a `help` sub-action and the `--help`/`-h` flag that routes to it.
    pub fn help<F>(self, f: F) -> Self
    where
        F: Fn(&Context) -> HandlerResult + 'static,
    {
        self.option(
            OptionSpec::boolean("help")
                .short('h')
                .with_description("Show help"),
        )
        .action(
            Action::new("help")
                .about("Show help")
                .arguments(true)
                .handler(f),
        )
    }

    /// Adds a `version` sub-action and the `--version` flag that routes to it.
    pub fn version<F>(self, f: F) -> Self
    where
        F: Fn(&Context) -> HandlerResult + 'static,
    {
        self.option(OptionSpec::boolean("version").with_description("Show version"))
            .action(Action::new("version").about("Show version").handler(f))
    }

    /// Checks the declarations and freezes the tree.
    pub fn build(self) -> Result<CommandTree, DefinitionError> {
        let mut nodes = Vec::new();
        insert(&mut nodes, self, None)?;
        Ok(CommandTree { nodes })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("options", &self.options.len())
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

fn insert(
    nodes: &mut Vec<ActionNode>,
    action: Action,
    parent: Option<ActionId>,
) -> Result<ActionId, DefinitionError> {
    if !NAME_PATTERN.is_match(&action.name) {
        return Err(DefinitionError::InvalidActionName(action.name));
    }

    let path = match parent {
        Some(parent) => format!("{} {}", nodes[parent.0].path, action.name),
        None => action.name.clone(),
    };

    check_options(&path, &action.options)?;

    if action.handler.is_none() && action.children.is_empty() {
        return Err(DefinitionError::EmptyAction(path));
    }

    let mut seen = HashSet::new();
    for child in &action.children {
        if !seen.insert(child.name.as_str()) {
            return Err(DefinitionError::DuplicateAction {
                action: path,
                child: child.name.clone(),
            });
        }
    }

    let mut events = HashMap::with_capacity(action.events.len());
    for (event, handler) in action.events {
        if events.contains_key(&event) {
            return Err(DefinitionError::DuplicateEvent {
                action: path,
                event,
            });
        }
        events.insert(event, handler);
    }

    let id = ActionId(nodes.len());
    nodes.push(ActionNode {
        name: action.name,
        path,
        description: action.description,
        handler: action.handler,
        arguments_enabled: action.arguments_enabled,
        options: action.options,
        children: Vec::new(),
        events,
        parent,
    });

    for child in action.children {
        let child_id = insert(nodes, child, Some(id))?;
        nodes[id.0].children.push(child_id);
    }

    Ok(id)
}

fn check_options(path: &str, options: &[OptionSpec]) -> Result<(), DefinitionError> {
    let mut long = HashSet::new();
    let mut short = HashSet::new();

    for spec in options {
        let leading = spec.name().chars().next();
        if !NAME_PATTERN.is_match(spec.name()) || !leading.is_some_and(|c| c.is_ascii_alphanumeric()) {
            return Err(DefinitionError::InvalidOptionName {
                action: path.to_string(),
                option: spec.name().to_string(),
            });
        }
        if !long.insert(spec.name()) {
            return Err(DefinitionError::DuplicateOption {
                action: path.to_string(),
                option: spec.name().to_string(),
            });
        }
        if let Some(c) = spec.short_name() {
            if !c.is_ascii_alphanumeric() {
                return Err(DefinitionError::InvalidOptionName {
                    action: path.to_string(),
                    option: c.to_string(),
                });
            }
            if !short.insert(c) {
                return Err(DefinitionError::DuplicateShortOption {
                    action: path.to_string(),
                    short: c,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Context) -> HandlerResult {
        Ok(())
    }

    fn sample() -> CommandTree {
        Action::new("app")
            .option(OptionSpec::numeric("count").short('c'))
            .action(
                Action::new("db")
                    .action(Action::new("migrate").handler(noop))
                    .action(Action::new("seed").handler(noop)),
            )
            .action(Action::new("list").handler(noop))
            .handler(noop)
            .build()
            .unwrap()
    }

    #[test]
    fn test_paths_and_parents() {
        let tree = sample();
        assert_eq!(tree.len(), 5);

        let migrate = tree.find("db migrate").unwrap();
        assert_eq!(migrate.path(), "app db migrate");
        assert_eq!(migrate.parent().unwrap().name(), "db");
        assert!(migrate.parent().unwrap().parent().unwrap().is_root());
        assert_eq!(migrate.root().name(), "app");
        assert!(tree.find("db nope").is_none());
        assert!(tree.find("").unwrap().is_root());
    }

    #[test]
    fn test_children_keep_declaration_order() {
        let tree = sample();
        let names: Vec<_> = tree.root().children().map(|c| c.name()).collect();
        assert_eq!(names, vec!["db", "list"]);
    }

    #[test]
    fn test_option_lookup_by_long_and_short() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(root.option("count").unwrap().name(), "count");
        assert_eq!(root.option_by_short('c').unwrap().name(), "count");
        assert!(root.option_by_short('x').is_none());
    }

    #[test]
    fn test_rejects_invalid_action_name() {
        let err = Action::new("bad name").handler(noop).build().unwrap_err();
        assert_eq!(err, DefinitionError::InvalidActionName("bad name".into()));
    }

    #[test]
    fn test_rejects_duplicate_options() {
        let err = Action::new("app")
            .option(OptionSpec::any("name"))
            .option(OptionSpec::numeric("name"))
            .handler(noop)
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateOption { .. }));

        let err = Action::new("app")
            .option(OptionSpec::any("name").short('n'))
            .option(OptionSpec::any("number").short('n'))
            .handler(noop)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateShortOption {
                action: "app".into(),
                short: 'n'
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_siblings() {
        let err = Action::new("app")
            .action(Action::new("list").handler(noop))
            .action(Action::new("list").handler(noop))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateAction { child, .. } if child == "list"));
    }

    #[test]
    fn test_rejects_duplicate_event() {
        let err = Action::new("app")
            .event("saved", |_, _| Ok(()))
            .event("saved", |_, _| Ok(()))
            .handler(noop)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateEvent {
                action: "app".into(),
                event: "saved".into()
            }
        );
    }

    #[test]
    fn test_same_event_on_different_actions() {
        let tree = Action::new("app")
            .event("saved", |_, _| Ok(()))
            .action(Action::new("edit").event("saved", |_, _| Ok(())).handler(noop))
            .build()
            .unwrap();
        assert!(tree.find("edit").unwrap().event_handler("saved").is_some());
        assert!(tree.root().event_handler("saved").is_some());
    }

    #[test]
    fn test_option_names_start_like_long_tokens() {
        for name in ["_x", "-x", ""] {
            let err = Action::new("app")
                .option(OptionSpec::boolean(name))
                .handler(noop)
                .build()
                .unwrap_err();
            assert!(
                matches!(err, DefinitionError::InvalidOptionName { ref option, .. } if option == name),
                "{name:?} gave {err:?}"
            );
        }

        let tree = Action::new("app")
            .option(OptionSpec::boolean("x_y"))
            .option(OptionSpec::boolean("2fa"))
            .handler(noop)
            .build()
            .unwrap();
        assert_eq!(tree.root().options().len(), 2);
    }

    #[test]
    fn test_get_ignores_foreign_ids() {
        let big = sample();
        let small = Action::new("tiny").handler(noop).build().unwrap();
        let seed = big.find("db seed").unwrap().id();

        assert_eq!(big.get(seed).unwrap().path(), "app db seed");
        assert!(small.get(seed).is_none());
        assert!(small.get(ActionId::ROOT).unwrap().is_root());
    }

    #[test]
    fn test_rejects_empty_action() {
        let err = Action::new("app")
            .action(Action::new("idle"))
            .build()
            .unwrap_err();
        assert_eq!(err, DefinitionError::EmptyAction("app idle".into()));
    }

    #[test]
    fn test_pure_dispatcher_is_allowed() {
        let tree = Action::new("app")
            .action(Action::new("run").handler(noop))
            .build()
            .unwrap();
        assert!(tree.root().handler().is_none());
        assert!(tree.root().has_children());
    }

    #[test]
    fn test_help_and_version_declare_flag_and_action() {
        let tree = Action::new("app")
            .help(noop)
            .version(noop)
            .handler(noop)
            .build()
            .unwrap();
        let root = tree.root();
        assert!(root.option("help").unwrap().is_boolean());
        assert_eq!(root.option_by_short('h').unwrap().name(), "help");
        assert!(root.option("version").unwrap().is_boolean());
        assert!(root.child("help").unwrap().arguments_enabled());
        assert!(root.child("version").is_some());
    }

    #[test]
    fn test_event_handlers_are_per_action() {
        let tree = Action::new("app")
            .event("saved", |_, _| Ok(()))
            .action(Action::new("child").handler(noop))
            .build()
            .unwrap();
        assert!(tree.root().event_handler("saved").is_some());
        assert!(tree.find("child").unwrap().event_handler("saved").is_none());
    }
}
