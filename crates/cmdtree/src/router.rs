//! Router/executor: runs one invocation through the whole pipeline.
//!
//! ```text
//! tokens ─▶ sanitize ─▶ walk ─▶ validate ─▶ Context ─▶ handler
//! ```
//!
//! The output mode picks the sinks for the invocation. In
//! [`OutputMode::Standard`] writes go to the process streams; in
//! [`OutputMode::Buffer`] they go to fresh in-memory buffers that are
//! returned in the [`Outcome`]. Sinks are owned by the invocation, so
//! nothing process-wide needs restoring when a handler fails.
//!
//! [`Router::dispatch`] returns errors to the caller; [`Router::execute`]
//! reports them on the error channel and folds them into a [`Status`].

use std::rc::Rc;
use tracing::{debug, warn};

use crate::context::{Context, ExecuteOptions, Forwarder};
use crate::error::{Error, Status};
use crate::input::{sanitize, strip_program};
use crate::output::{Capture, OutputMode, Sinks};
use crate::tree::{ActionRef, CommandTree};
use crate::validate::validate;
use crate::walker::walk;

/// Output captured by a buffered invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub status: Status,
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Output went to the process streams, or into a caller's sinks.
    Status(Status),
    /// Output was buffered.
    Captured(Captured),
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Status(status) => *status,
            Outcome::Captured(captured) => captured.status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    pub fn captured(&self) -> Option<&Captured> {
        match self {
            Outcome::Captured(captured) => Some(captured),
            Outcome::Status(_) => None,
        }
    }

    pub fn into_captured(self) -> Option<Captured> {
        match self {
            Outcome::Captured(captured) => Some(captured),
            Outcome::Status(_) => None,
        }
    }
}

/// Executes invocations against a command tree.
///
/// Cloning is cheap; clones share the tree.
#[derive(Debug, Clone)]
pub struct Router {
    tree: Rc<CommandTree>,
}

impl Router {
    pub fn new(tree: CommandTree) -> Self {
        Self::shared(Rc::new(tree))
    }

    pub fn shared(tree: Rc<CommandTree>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Runs an invocation, reporting any error as `error: <message>` on the
    /// error channel.
    pub fn execute<I, S>(&self, tokens: I, options: ExecuteOptions) -> Outcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let (sinks, capture) = open(options.mode());

        let status = match self.run_raw(&tokens, options, &sinks) {
            Ok(()) => Status::Success,
            Err(err) => {
                warn!(error = %err, status = %err.status(), "invocation failed");
                if let Err(io) = sinks.err.write(&format!("error: {err}\n")) {
                    warn!(error = %io, "could not report error");
                }
                err.status()
            }
        };

        finish(capture, status)
    }

    /// Runs an invocation, returning errors to the caller.
    pub fn dispatch<I, S>(&self, tokens: I, options: ExecuteOptions) -> Result<Outcome, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let (sinks, capture) = open(options.mode());
        self.run_raw(&tokens, options, &sinks)?;
        Ok(finish(capture, Status::Success))
    }

    /// Runs an invocation writing into the given sinks.
    ///
    /// The output mode in `options` is only reported to handlers.
    pub fn dispatch_to<I, S>(&self, tokens: I, options: ExecuteOptions, sinks: &Sinks) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        self.run_raw(&tokens, options, sinks)
    }

    fn run_raw(&self, tokens: &[String], options: ExecuteOptions, sinks: &Sinks) -> Result<(), Error> {
        let words = sanitize(self.tree.root().name(), tokens)?;
        self.run(&words, options, sinks)
    }

    fn run(&self, words: &[String], options: ExecuteOptions, sinks: &Sinks) -> Result<(), Error> {
        let (action, input) = walk(self.tree.root(), words)?;
        let input = validate(input, action)?;
        let action = target(action)?;

        let context = Context::new(
            self.tree.clone(),
            action.id(),
            &input,
            options,
            sinks.clone(),
            Rc::new(self.clone()),
        );

        debug!(
            command = action.path(),
            output = %options.mode(),
            environment = %options.env(),
            "running handler"
        );
        let Some(handler) = action.handler() else {
            return Err(Error::IllegalCommand(format!("'{}' has no handler", action.path())));
        };
        handler
            .call(&context)
            .map_err(|err| Error::from_handler(action.path(), err))
    }
}

impl Forwarder for Router {
    fn forward(
        &self,
        tokens: Vec<String>,
        options: ExecuteOptions,
        sinks: Option<Sinks>,
    ) -> Result<Outcome, Error> {
        let words = strip_program(self.tree.root().name(), &tokens);
        debug!(tokens = ?words, inherited = sinks.is_some(), "forwarding");
        match sinks {
            Some(sinks) => {
                self.run(words, options, &sinks)?;
                Ok(Outcome::Status(Status::Success))
            }
            None => {
                let (sinks, capture) = open(options.mode());
                self.run(words, options, &sinks)?;
                Ok(finish(capture, Status::Success))
            }
        }
    }
}

/// Picks the action that actually runs.
///
/// A dispatcher without a handler of its own falls through to its `help`
/// sub-action when it has one.
fn target(action: ActionRef<'_>) -> Result<ActionRef<'_>, Error> {
    if action.handler().is_some() {
        return Ok(action);
    }
    match action.child("help").filter(|help| help.handler().is_some()) {
        Some(help) => {
            debug!(from = action.path(), "dispatcher invoked directly, showing help");
            Ok(help)
        }
        None => Err(Error::IllegalCommand(format!(
            "'{}' requires a sub-command",
            action.path()
        ))),
    }
}

fn open(mode: OutputMode) -> (Sinks, Option<Capture>) {
    match mode {
        OutputMode::Standard => (Sinks::standard(), None),
        OutputMode::Buffer => {
            let capture = Capture::new();
            (capture.sinks(), Some(capture))
        }
    }
}

fn finish(capture: Option<Capture>, status: Status) -> Outcome {
    match capture {
        Some(capture) => Outcome::Captured(Captured {
            stdout: capture.stdout(),
            stderr: capture.stderr(),
            status,
        }),
        None => Outcome::Status(status),
    }
}
