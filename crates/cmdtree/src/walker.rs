//! Argument tree walker.
//!
//! [`walk`] resolves which action a token list invokes and classifies the
//! rest of the words into a [`ParsedInput`]:
//!
//! 1. Scan every word once. A word naming a child of the *current* action
//!    descends into it and is dropped; anything else is kept as residual.
//!    Action names may therefore appear anywhere, not only as a prefix.
//! 2. Classify the residual words against the resolved action's options
//!    (see [`classify`]). An active option token takes the next word as its
//!    value without that word being classified.
//! 3. An option still waiting for a value at the end is an error.
//! 4. `--help`/`--version` switch to the `help`/`version` sub-action when
//!    the resolved action has one.

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Error;
use crate::option::{OptionSpec, RawValue};
use crate::token::{classify, Token};
use crate::tree::ActionRef;

/// Boolean options that double as sub-actions.
const DEFAULT_ACTIONS: [&str; 2] = ["help", "version"];

/// Options and arguments collected for one resolved action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedInput {
    command: String,
    options: BTreeMap<String, Vec<RawValue>>,
    arguments: Vec<String>,
}

impl ParsedInput {
    /// Fully-qualified path of the resolved action.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Supplied options keyed by long name, values in input order.
    pub fn options(&self) -> &BTreeMap<String, Vec<RawValue>> {
        &self.options
    }

    pub fn values(&self, option: &str) -> Option<&[RawValue]> {
        self.options.get(option).map(Vec::as_slice)
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.contains_key(option)
    }

    /// Positional arguments in input order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    fn flag(&self, option: &str) -> bool {
        matches!(self.values(option), Some([RawValue::Flag(true), ..]))
    }
}

/// Accumulates token contributions while walking.
#[derive(Debug, Default)]
pub(crate) struct ParsedInputBuilder {
    options: BTreeMap<String, Vec<RawValue>>,
    arguments: Vec<String>,
}

impl ParsedInputBuilder {
    /// Records one option value, rejecting repeats of single-valued options.
    pub(crate) fn add_option(&mut self, spec: &OptionSpec, value: RawValue) -> Result<(), Error> {
        let values = self.options.entry(spec.name().to_string()).or_default();
        if !values.is_empty() && !spec.multi_valued() {
            return Err(Error::MultipleOptionValues {
                option: spec.name().to_string(),
            });
        }
        values.push(value);
        Ok(())
    }

    pub(crate) fn add_argument(&mut self, argument: String) {
        self.arguments.push(argument);
    }

    fn build(self, command: &str) -> ParsedInput {
        ParsedInput {
            command: command.to_string(),
            options: self.options,
            arguments: self.arguments,
        }
    }
}

/// Resolves the invoked action below `root` and parses the remaining words.
pub fn walk<'a, S>(root: ActionRef<'a>, tokens: &[S]) -> Result<(ActionRef<'a>, ParsedInput), Error>
where
    S: AsRef<str>,
{
    let mut action = root;
    let mut residual = Vec::with_capacity(tokens.len());
    for token in tokens {
        let token = token.as_ref();
        match action.child(token) {
            Some(child) => action = child,
            None => residual.push(token),
        }
    }
    debug!(command = action.path(), residual = residual.len(), "resolved action");

    let mut builder = ParsedInputBuilder::default();
    let mut current = Token::NoOp;
    for raw in residual {
        if current.is_active() {
            current.append(raw);
        } else {
            current = classify(action, raw)?;
        }
        if !current.is_active() {
            std::mem::take(&mut current).collect(action, &mut builder)?;
        }
    }
    // Only an option still waiting for its value can be left over.
    current.collect(action, &mut builder)?;

    let mut input = builder.build(action.path());

    for name in DEFAULT_ACTIONS {
        if !input.flag(name) {
            continue;
        }
        if let Some(child) = action.child(name) {
            debug!(from = action.path(), to = child.path(), "switching to default action");
            input.options.remove(name);
            input.command = child.path().to_string();
            action = child;
            break;
        }
    }

    Ok((action, input))
}
