//! Line-driven shell on top of forwarding.
//!
//! A [`Shell`] reads command lines from any [`BufRead`] and forwards each one
//! through [`Context::forward`] with the environment set to
//! [`Environment::Shell`]. A failing line is reported on the error channel
//! and the loop continues. `exit`, `quit` or end of input stop it.
//!
//! ```rust
//! use cmdtree::{Action, ExecuteOptions, OutputMode, Router, Shell};
//!
//! let tree = Action::new("app")
//!     .action(Action::new("hello").handler(|ctx| {
//!         ctx.writeln("hi")?;
//!         Ok(())
//!     }))
//!     .action(Action::new("shell").handler(|ctx| {
//!         Shell::new("hello\nhello\n".as_bytes()).prompt("").run(ctx)?;
//!         Ok(())
//!     }))
//!     .build()?;
//!
//! let captured = Router::new(tree)
//!     .execute(["shell"], ExecuteOptions::output(OutputMode::Buffer))
//!     .into_captured()
//!     .unwrap();
//! assert_eq!(captured.stdout, "hi\nhi\n");
//! # Ok::<(), cmdtree::DefinitionError>(())
//! ```

use std::io::BufRead;
use tracing::{debug, info};

use crate::context::{Context, Environment, ExecuteOptions};
use crate::error::Error;

const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

/// Counts of what a shell session ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShellSummary {
    /// Non-empty lines forwarded.
    pub executed: usize,
    /// Forwarded lines that failed.
    pub failed: usize,
}

/// An interactive loop that forwards each input line.
pub struct Shell<R> {
    input: R,
    prompt: String,
}

impl<R: BufRead> Shell<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            prompt: "> ".to_string(),
        }
    }

    /// Text written before each line is read. Empty disables it.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Runs until `exit`, `quit` or end of input.
    ///
    /// Fails with [`Error::IllegalCommand`] when `ctx` already belongs to a
    /// shell invocation.
    pub fn run(mut self, ctx: &Context) -> anyhow::Result<ShellSummary> {
        if ctx.environment() == Environment::Shell {
            return Err(Error::IllegalCommand("a shell is already running".into()).into());
        }
        info!(command = ctx.path(), "shell started");

        let mut summary = ShellSummary::default();
        let mut line = String::new();
        loop {
            if !self.prompt.is_empty() {
                ctx.write(&self.prompt)?;
            }
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            if EXIT_WORDS.contains(&command) {
                break;
            }

            summary.executed += 1;
            debug!(line = command, "shell line");
            match ctx.forward(command, ExecuteOptions::environment(Environment::Shell)) {
                Ok(outcome) if outcome.is_success() => {}
                Ok(_) => summary.failed += 1,
                Err(err) => {
                    summary.failed += 1;
                    ctx.ewriteln(format!("error: {err}"))?;
                }
            }
        }

        info!(executed = summary.executed, failed = summary.failed, "shell finished");
        Ok(summary)
    }
}
