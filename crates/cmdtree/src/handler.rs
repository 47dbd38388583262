//! Command and event handler types.
//!
//! An action's handler is business logic only: it receives a [`Context`]
//! with resolved options and arguments, writes through the context's output
//! channels, and returns a [`HandlerResult`]. Handlers come in two shapes,
//! dispatched by variant rather than by inspecting types at runtime:
//!
//! - [`Handler::Callback`]: a closure taking the context
//! - [`Handler::Instance`]: an object implementing [`Command`]
//!
//! Event handlers mirror this with [`EventHandler`] and [`EventListener`].
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{Command, Context, Handler, HandlerResult};
//!
//! struct Greet;
//!
//! impl Command for Greet {
//!     fn execute(&self, ctx: &Context) -> HandlerResult {
//!         ctx.writeln("hello")?;
//!         Ok(())
//!     }
//! }
//!
//! let by_object = Handler::instance(Greet);
//! let by_closure = Handler::callback(|ctx| {
//!     ctx.writeln("hello")?;
//!     Ok(())
//! });
//! # let _ = (by_object, by_closure);
//! ```

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::Error;
use crate::event::EventContext;

/// The result type for command and event handlers.
///
/// Enables use of the `?` operator with any error type. Errors that are
/// already a [`cmdtree::Error`](crate::Error) propagate unchanged; anything
/// else is reported as a runtime failure of the command.
pub type HandlerResult = Result<(), anyhow::Error>;

/// Closure form of a command handler.
pub type CallbackFn = Rc<dyn Fn(&Context) -> HandlerResult>;

/// Closure form of an event handler.
pub type EventFn = Rc<dyn Fn(&EventContext<'_>, &[Value]) -> HandlerResult>;

/// Trait for object command handlers.
///
/// Handlers take `&self` because forwarding may re-enter the same action
/// while it is still running. Keep mutable state behind `Cell`/`RefCell`.
pub trait Command {
    /// Runs the command with the resolved context.
    fn execute(&self, ctx: &Context) -> HandlerResult;
}

/// A command handler attached to an action.
#[derive(Clone)]
pub enum Handler {
    Callback(CallbackFn),
    Instance(Rc<dyn Command>),
}

impl Handler {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Context) -> HandlerResult + 'static,
    {
        Handler::Callback(Rc::new(f))
    }

    pub fn instance<C>(command: C) -> Self
    where
        C: Command + 'static,
    {
        Handler::Instance(Rc::new(command))
    }

    /// Runs the handler.
    pub fn call(&self, ctx: &Context) -> HandlerResult {
        match self {
            Handler::Callback(f) => f(ctx),
            Handler::Instance(command) => command.execute(ctx),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Callback(_) => write!(f, "Handler::Callback"),
            Handler::Instance(_) => write!(f, "Handler::Instance"),
        }
    }
}

/// Trait for object event handlers.
///
/// The default `handle` raises the "not implemented" invocation error, so a
/// listener registered without overriding it fails loudly when invoked.
pub trait EventListener {
    fn handle(&self, event: &EventContext<'_>, args: &[Value]) -> HandlerResult {
        let _ = args;
        Err(Error::not_implemented(event.event().name()).into())
    }
}

/// An event handler declared on an action.
#[derive(Clone)]
pub enum EventHandler {
    Callback(EventFn),
    Instance(Rc<dyn EventListener>),
}

impl EventHandler {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&EventContext<'_>, &[Value]) -> HandlerResult + 'static,
    {
        EventHandler::Callback(Rc::new(f))
    }

    pub fn instance<L>(listener: L) -> Self
    where
        L: EventListener + 'static,
    {
        EventHandler::Instance(Rc::new(listener))
    }

    pub fn call(&self, event: &EventContext<'_>, args: &[Value]) -> HandlerResult {
        match self {
            EventHandler::Callback(f) => f(event, args),
            EventHandler::Instance(listener) => listener.handle(event, args),
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventHandler::Callback(_) => write!(f, "EventHandler::Callback"),
            EventHandler::Instance(_) => write!(f, "EventHandler::Instance"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, ExecuteOptions, OutputMode, Router};
    use std::cell::Cell;

    fn run(handler: Handler) -> crate::Captured {
        let tree = Action::new("app").handler_value(handler).build().unwrap();
        Router::new(tree)
            .execute(Vec::<String>::new(), ExecuteOptions::output(OutputMode::Buffer))
            .into_captured()
            .unwrap()
    }

    #[test]
    fn test_callback_handler_receives_context() {
        let captured = run(Handler::callback(|ctx| {
            ctx.writeln(format!("root={}", ctx.is_root()))?;
            Ok(())
        }));
        assert_eq!(captured.stdout, "root=true\n");
        assert!(captured.status.is_success());
    }

    #[test]
    fn test_instance_handler_keeps_state() {
        struct Counter {
            calls: Cell<u32>,
        }

        impl Command for Counter {
            fn execute(&self, ctx: &Context) -> HandlerResult {
                self.calls.set(self.calls.get() + 1);
                ctx.write(self.calls.get().to_string())?;
                Ok(())
            }
        }

        let handler = Handler::instance(Counter { calls: Cell::new(0) });
        let tree = Action::new("app").handler_value(handler).build().unwrap();
        let router = Router::new(tree);
        let buffered = ExecuteOptions::output(OutputMode::Buffer);

        router.execute(Vec::<String>::new(), buffered);
        let second = router
            .execute(Vec::<String>::new(), buffered)
            .into_captured()
            .unwrap();
        assert_eq!(second.stdout, "2");
    }

    #[test]
    fn test_handler_debug_names_variant() {
        let callback = Handler::callback(|_| Ok(()));
        assert_eq!(format!("{:?}", callback), "Handler::Callback");

        let listener = EventHandler::callback(|_, _| Ok(()));
        assert_eq!(format!("{:?}", listener), "EventHandler::Callback");
    }

    #[test]
    fn test_listener_without_handle_is_not_implemented() {
        struct Silent;
        impl EventListener for Silent {}

        let tree = Action::new("app")
            .listener("saved", Silent)
            .handler(|ctx| {
                ctx.invoke("saved", &[])?;
                Ok(())
            })
            .build()
            .unwrap();

        let err = Router::new(tree)
            .dispatch(Vec::<String>::new(), ExecuteOptions::output(OutputMode::Buffer))
            .unwrap_err();
        assert!(matches!(err, Error::Invocation { ref event, .. } if event == "saved"));
        assert!(err.to_string().contains("does not implement"));
    }
}
