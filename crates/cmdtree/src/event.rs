//! Named events that bubble from an action toward the root.
//!
//! [`Context::invoke`] creates an [`Event`] and offers it to the resolved
//! action, then to each ancestor in turn. Every action that declares a
//! handler for the event name runs it. A handler can call
//! [`EventContext::stop_propagation`] to keep the event from reaching the
//! remaining ancestors.
//!
//! Handlers may invoke further events through [`EventContext::invoke`]; the
//! nested event records the current one as its parent.
//!
//! ```rust
//! use cmdtree::{Action, ExecuteOptions, OutputMode, Router};
//!
//! let tree = Action::new("app")
//!     .event("saved", |ev, args| {
//!         ev.writeln(format!("saved {} from {}", args[0], ev.event().command()))?;
//!         Ok(())
//!     })
//!     .action(Action::new("edit").handler(|ctx| {
//!         ctx.invoke("saved", &[serde_json::json!("notes.txt")])?;
//!         Ok(())
//!     }))
//!     .build()?;
//!
//! let captured = Router::new(tree)
//!     .execute(["edit"], ExecuteOptions::output(OutputMode::Buffer))
//!     .into_captured()
//!     .unwrap();
//! assert_eq!(captured.stdout, "saved \"notes.txt\" from app edit\n");
//! # Ok::<(), cmdtree::DefinitionError>(())
//! ```

use serde_json::Value;
use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use std::time::SystemTime;
use tracing::debug;

use crate::context::Context;
use crate::error::Error;
use crate::tree::ActionRef;

/// One invocation of a named event.
pub struct Event {
    name: String,
    command: String,
    parent: Option<Rc<Event>>,
    created_at: SystemTime,
    propagate: Cell<bool>,
}

impl Event {
    fn new(name: &str, command: &str, parent: Option<Rc<Event>>) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            parent,
            created_at: SystemTime::now(),
            propagate: Cell::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the command whose context invoked the event.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The event whose handler invoked this one, if any.
    pub fn parent(&self) -> Option<&Event> {
        self.parent.as_deref()
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// True until a handler stops propagation.
    pub fn propagates(&self) -> bool {
        self.propagate.get()
    }

    /// Number of enclosing events.
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), |event| event.parent()).count()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("parent", &self.parent().map(Event::name))
            .field("propagates", &self.propagates())
            .finish()
    }
}

/// What an event handler receives: the invoking context plus the event.
///
/// Dereferences to the [`Context`], so output helpers and option accessors
/// are available directly.
pub struct EventContext<'a> {
    context: &'a Context,
    event: Rc<Event>,
    action: ActionRef<'a>,
}

impl<'a> EventContext<'a> {
    pub fn context(&self) -> &'a Context {
        self.context
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The action whose handler is currently running.
    pub fn action(&self) -> ActionRef<'a> {
        self.action
    }

    /// Keeps the event from reaching the remaining ancestors.
    pub fn stop_propagation(&self) {
        debug!(event = self.event.name(), at = self.action.path(), "propagation stopped");
        self.event.propagate.set(false);
    }

    /// Invokes a nested event whose parent is the current one.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<bool, Error> {
        invoke(self.context, name, Some(self.event.clone()), args)
    }
}

impl Deref for EventContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.context
    }
}

impl fmt::Debug for EventContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("event", &self.event)
            .field("action", &self.action)
            .finish()
    }
}

/// Offers a new event to the context's action and its ancestors.
pub(crate) fn invoke(
    ctx: &Context,
    name: &str,
    parent: Option<Rc<Event>>,
    args: &[Value],
) -> Result<bool, Error> {
    let event = Rc::new(Event::new(name, ctx.path(), parent));
    debug!(event = name, command = ctx.path(), depth = event.depth(), "invoking event");

    let mut handled = false;
    let mut current = Some(ctx.action());
    while let Some(action) = current {
        if let Some(handler) = action.event_handler(name) {
            let event_ctx = EventContext {
                context: ctx,
                event: event.clone(),
                action,
            };
            handler
                .call(&event_ctx, args)
                .map_err(|err| Error::from_event(name, err))?;
            handled = true;
            if !event.propagates() {
                break;
            }
        }
        current = action.parent();
    }

    Ok(handled)
}
