//! Argument parsing, validation and dispatch for tree-structured CLIs.
//!
//! `cmdtree` turns a flat list of command-line tokens into a call to the
//! handler of one action in a declared tree of actions. It owns the whole
//! path from raw tokens to handler, and leaves process concerns (exit codes,
//! logging setup, outer flags) to the binary.
//!
//! # Features
//!
//! - **Command tree**: nested actions with typed options, short aliases,
//!   defaults, value operators and positional arguments
//! - **Walker**: action names may appear anywhere in the input; options are
//!   resolved against the action finally selected
//! - **Validation**: every type violation is reported together
//! - **Forwarding**: a handler can run another command's full pipeline
//! - **Events**: named events bubble from an action toward the root
//! - **Output modes**: write to the process, or capture into buffers
//! - **Shell**: a line-driven loop built on forwarding
//!
//! # Pipeline
//!
//! ```text
//! raw tokens
//!     │  input::sanitize      split joined lines, strip program name
//!     ▼
//! walk                        resolve action, classify options/arguments
//!     │
//!     ▼
//! validate                    type-check option values
//!     │
//!     ▼
//! Context                     operators, defaults, sinks, forwarder
//!     │
//!     ▼
//! handler                     Handler::Callback or Handler::Instance
//! ```
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{Action, ExecuteOptions, OptionSpec, OutputMode, Router, Status};
//!
//! let tree = Action::new("todo")
//!     .action(
//!         Action::new("add")
//!             .arguments(true)
//!             .option(OptionSpec::numeric("priority").short('p').with_default(1))
//!             .handler(|ctx| {
//!                 let title = ctx.arguments().join(" ");
//!                 ctx.writeln(format!("[{}] {}", ctx.int("priority").unwrap_or(1), title))?;
//!                 Ok(())
//!             }),
//!     )
//!     .build()?;
//!
//! let router = Router::new(tree);
//! let captured = router
//!     .execute(["todo", "add", "-p", "3", "water", "plants"], ExecuteOptions::output(OutputMode::Buffer))
//!     .into_captured()
//!     .unwrap();
//! assert_eq!(captured.stdout, "[3] water plants\n");
//!
//! let failed = router.execute(["add", "-p", "high"], ExecuteOptions::output(OutputMode::Buffer));
//! assert_eq!(failed.status(), Status::Usage);
//! # Ok::<(), cmdtree::DefinitionError>(())
//! ```

// Core modules
mod context;
mod error;
mod event;
mod handler;
mod option;
mod output;
mod router;
mod shell;
mod token;
mod tree;
mod validate;
mod walker;

pub mod input;

// Re-export core types
pub use context::{Context, Environment, ExecuteOptions, Forwarder, UnknownEnvironment};

pub use error::{BoxError, Error, Status, Violation, Violations};

pub use event::{Event, EventContext};

pub use handler::{
    CallbackFn, Command, EventFn, EventHandler, EventListener, Handler, HandlerResult,
};

pub use option::{CommandOption, OptionSpec, OptionType, OptionValue, RawValue, ValueOperator};

pub use output::{
    BufferSink, Capture, OutputMode, OutputSink, Sinks, StderrSink, StdoutSink, UnknownOutputMode,
};

pub use router::{Captured, Outcome, Router};

pub use shell::{Shell, ShellSummary};

pub use token::{classify, OptionToken, Token};

pub use tree::{Action, ActionId, ActionRef, CommandTree, DefinitionError};

pub use validate::{validate, violations};

pub use walker::{walk, ParsedInput};
