//! Error taxonomy for parsing, validation, and dispatch.
//!
//! Every failure the engine reports is an [`Error`]. Parsing and validation
//! errors come straight from the walker and validator; anything a handler
//! raises is folded into [`Error::CommandRuntime`] unless it already is one of
//! these kinds. [`Error::status`] maps each kind to the [`Status`] the
//! embedding binary exits with.

use std::fmt;
use thiserror::Error;

use crate::option::OptionType;

/// Boxed cause carried by wrapping error kinds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Exit status of one finished invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// The handler ran and returned normally.
    #[default]
    Success,
    /// A handler or event handler failed.
    Runtime,
    /// The input could not be parsed or validated, or the command was misused.
    Usage,
}

impl Status {
    /// Numeric process exit code for this status.
    pub fn code(self) -> u8 {
        match self {
            Status::Success => 0,
            Status::Runtime => 1,
            Status::Usage => 2,
        }
    }

    /// Returns true for [`Status::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Runtime => write!(f, "runtime error"),
            Status::Usage => write!(f, "usage error"),
        }
    }
}

impl From<Status> for std::process::ExitCode {
    fn from(status: Status) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// One option value that failed its type check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Long name of the offending option.
    pub option: String,
    /// The type the option declares.
    pub expected: OptionType,
    /// The value as it was supplied.
    pub value: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "option '{}' must be {}, got '{}'",
            self.option, self.expected, self.value
        )
    }
}

/// Every type-check failure found in one parsed input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// Returns true if any violation names the given option.
    pub fn mentions(&self, option: &str) -> bool {
        self.0.iter().any(|v| v.option == option)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

/// Errors raised while resolving, validating, or running a command.
#[derive(Debug, Error)]
pub enum Error {
    /// A token looked like an option but the action declares no such option.
    #[error("unknown option '{option}' for '{command}'")]
    UnknownCommandOption { command: String, option: String },

    /// A plain argument where the action does not accept arguments.
    #[error("unexpected argument '{argument}' for '{command}'")]
    InvalidArgument { command: String, argument: String },

    /// An option that takes a value reached the end of input without one.
    #[error("option '{option}' requires a value")]
    OptionValueMissing { option: String },

    /// A single-valued option appeared more than once.
    #[error("option '{option}' was given more than once")]
    MultipleOptionValues { option: String },

    /// One or more option values failed their type check.
    #[error("illegal arguments: {0}")]
    IllegalArgument(Violations),

    /// An event handler failed or did not implement its behavior.
    #[error("event '{event}' failed: {source}")]
    Invocation {
        event: String,
        #[source]
        source: BoxError,
    },

    /// A command handler failed with an error outside this taxonomy.
    #[error("command '{path}' failed: {source}")]
    CommandRuntime {
        path: String,
        #[source]
        source: BoxError,
    },

    /// Structural misuse, such as starting a shell from inside a shell.
    #[error("illegal command: {0}")]
    IllegalCommand(String),
}

impl Error {
    /// Maps this error to the exit status of the invocation.
    pub fn status(&self) -> Status {
        match self {
            Error::Invocation { .. } | Error::CommandRuntime { .. } => Status::Runtime,
            _ => Status::Usage,
        }
    }

    /// Returns true if the error came from parsing or validating input.
    pub fn is_usage(&self) -> bool {
        self.status() == Status::Usage
    }

    /// The "not implemented" error raised by event listeners without a `handle` body.
    pub fn not_implemented(event: impl Into<String>) -> Self {
        Error::Invocation {
            event: event.into(),
            source: "event listener does not implement `handle`".into(),
        }
    }

    /// Folds a handler error into the taxonomy.
    ///
    /// Errors that already are an [`Error`] pass through untouched.
    pub(crate) fn from_handler(path: &str, err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(known) => known,
            Err(other) => Error::CommandRuntime {
                path: path.to_string(),
                source: other.into(),
            },
        }
    }

    /// Folds an event handler error into [`Error::Invocation`].
    ///
    /// An invocation error from a nested event keeps the innermost event name.
    pub(crate) fn from_event(event: &str, err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner @ Error::Invocation { .. }) => inner,
            Ok(other) => Error::Invocation {
                event: event.to_string(),
                source: Box::new(other),
            },
            Err(other) => Error::Invocation {
                event: event.to_string(),
                source: other.into(),
            },
        }
    }
}
