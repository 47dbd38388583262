//! Output modes and sinks.
//!
//! Handlers never touch process streams directly. Each [`Context`](crate::Context)
//! carries a [`Sinks`] pair (output and error channel) chosen from the
//! [`OutputMode`] of the invocation:
//!
//! - `Standard`: [`StdoutSink`] and [`StderrSink`] write straight to the process
//! - `Buffer`: a [`Capture`] of two [`BufferSink`]s collects the text instead
//!
//! Because the sinks are injected per invocation, nothing process-wide is
//! swapped and nothing has to be restored when a handler fails.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use std::str::FromStr;

/// Where an invocation's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Write to the process stdout/stderr.
    #[default]
    #[serde(alias = "default")]
    Standard,
    /// Capture into memory and return the text with the status.
    Buffer,
}

impl OutputMode {
    pub fn is_buffered(&self) -> bool {
        matches!(self, OutputMode::Buffer)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Standard => write!(f, "standard"),
            OutputMode::Buffer => write!(f, "buffer"),
        }
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output mode '{0}' (expected 'standard' or 'buffer')")]
pub struct UnknownOutputMode(pub String);

impl FromStr for OutputMode {
    type Err = UnknownOutputMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(OutputMode::Standard),
            "buffer" | "buffered" => Ok(OutputMode::Buffer),
            _ => Err(UnknownOutputMode(s.to_string())),
        }
    }
}

/// A destination for text written through a context.
pub trait OutputSink {
    fn write(&self, text: &str) -> io::Result<()>;
}

/// Writes to the process stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write(&self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(text.as_bytes())?;
        handle.flush()
    }
}

/// Writes to the process stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl OutputSink for StderrSink {
    fn write(&self, text: &str) -> io::Result<()> {
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        handle.write_all(text.as_bytes())
    }
}

/// Collects written text in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: RefCell<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything written so far.
    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }

    /// Returns everything written so far and empties the buffer.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.borrow_mut())
    }
}

impl OutputSink for BufferSink {
    fn write(&self, text: &str) -> io::Result<()> {
        self.buffer.borrow_mut().push_str(text);
        Ok(())
    }
}

/// The output and error channel handed to one context.
#[derive(Clone)]
pub struct Sinks {
    pub out: Rc<dyn OutputSink>,
    pub err: Rc<dyn OutputSink>,
}

impl Sinks {
    pub fn new(out: Rc<dyn OutputSink>, err: Rc<dyn OutputSink>) -> Self {
        Self { out, err }
    }

    /// The process streams.
    pub fn standard() -> Self {
        Self::new(Rc::new(StdoutSink), Rc::new(StderrSink))
    }
}

impl fmt::Debug for Sinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sinks").finish_non_exhaustive()
    }
}

/// A pair of in-memory buffers backing buffered output.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    out: Rc<BufferSink>,
    err: Rc<BufferSink>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sinks writing into this capture.
    pub fn sinks(&self) -> Sinks {
        Sinks::new(self.out.clone(), self.err.clone())
    }

    pub fn stdout(&self) -> String {
        self.out.contents()
    }

    pub fn stderr(&self) -> String {
        self.err.contents()
    }
}
