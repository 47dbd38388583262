//! Tokenizer/classifier for residual input words.
//!
//! [`classify`] turns one raw word into a [`Token`] using the option
//! declarations of the resolved action:
//!
//! ```text
//! --name / -n   value-taking option  -> Token::Option (active, waits for a value)
//! --flag / -f   boolean option       -> Token::Flag(true)
//! --no-flag     boolean option       -> Token::Flag(false)
//! anything else                      -> Token::Argument (if arguments are enabled)
//! ""                                 -> Token::NoOp
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::error::Error;
use crate::option::{OptionSpec, RawValue};
use crate::tree::ActionRef;
use crate::walker::ParsedInputBuilder;

static OPTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:--(?P<long>[A-Za-z0-9][A-Za-z0-9_-]*)|-(?P<short>[A-Za-z0-9]))$")
        .expect("option pattern is valid")
});

/// A value-taking option waiting for, or holding, its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionToken {
    name: String,
    value: Option<String>,
}

impl OptionToken {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Long name of the option.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.value.is_none()
    }
}

/// One classified input word.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Token {
    /// Placeholder before the first word; contributes nothing.
    #[default]
    NoOp,
    /// A value-taking option.
    Option(OptionToken),
    /// A boolean option with its resolved value.
    Flag { name: String, value: bool },
    /// A positional argument.
    Argument(String),
}

impl Token {
    /// True while an option token is waiting for its value.
    pub fn is_active(&self) -> bool {
        match self {
            Token::Option(option) => option.is_active(),
            _ => false,
        }
    }

    /// Hands the next input word to an active option token.
    ///
    /// Returns false, leaving the token unchanged, if it was not active.
    pub fn append(&mut self, raw: &str) -> bool {
        match self {
            Token::Option(option) if option.is_active() => {
                option.value = Some(raw.to_string());
                true
            }
            _ => false,
        }
    }

    /// Adds this token's contribution to the parsed input.
    pub(crate) fn collect(
        self,
        action: ActionRef<'_>,
        builder: &mut ParsedInputBuilder,
    ) -> Result<(), Error> {
        match self {
            Token::NoOp => Ok(()),
            Token::Option(OptionToken { name, value }) => match value {
                Some(value) => builder.add_option(spec(action, &name)?, RawValue::Text(value)),
                None => Err(Error::OptionValueMissing { option: name }),
            },
            Token::Flag { name, value } => {
                builder.add_option(spec(action, &name)?, RawValue::Flag(value))
            }
            Token::Argument(argument) => {
                builder.add_argument(argument);
                Ok(())
            }
        }
    }
}

fn spec<'a>(action: ActionRef<'a>, name: &str) -> Result<&'a OptionSpec, Error> {
    action
        .option(name)
        .ok_or_else(|| Error::UnknownCommandOption {
            command: action.path().to_string(),
            option: name.to_string(),
        })
}

/// Classifies one raw word against the options of `action`.
pub fn classify(action: ActionRef<'_>, raw: &str) -> Result<Token, Error> {
    if raw.is_empty() {
        return Ok(Token::NoOp);
    }

    let Some(captures) = OPTION_PATTERN.captures(raw) else {
        if !action.arguments_enabled() {
            return Err(Error::InvalidArgument {
                command: action.path().to_string(),
                argument: raw.to_string(),
            });
        }
        trace!(argument = raw, "classified argument");
        return Ok(Token::Argument(raw.to_string()));
    };

    let (spec, negated) = if let Some(long) = captures.name("long") {
        resolve_long(action, long.as_str())
    } else {
        let short = captures
            .name("short")
            .and_then(|m| m.as_str().chars().next());
        (short.and_then(|c| action.option_by_short(c)), false)
    };

    let Some(spec) = spec else {
        return Err(Error::UnknownCommandOption {
            command: action.path().to_string(),
            option: raw.to_string(),
        });
    };

    trace!(option = spec.name(), negated, "classified option");
    if spec.is_boolean() {
        Ok(Token::Flag {
            name: spec.name().to_string(),
            value: !negated,
        })
    } else {
        Ok(Token::Option(OptionToken::new(spec.name())))
    }
}

/// Resolves `--name` or `--no-name`.
///
/// A declared option literally named `no-...` wins over the negated form;
/// the `no-` prefix only negates boolean options.
fn resolve_long<'a>(action: ActionRef<'a>, name: &str) -> (Option<&'a OptionSpec>, bool) {
    if let Some(spec) = action.option(name) {
        return (Some(spec), false);
    }
    match name.strip_prefix("no-") {
        Some(base) => (action.option(base).filter(|spec| spec.is_boolean()), true),
        None => (None, false),
    }
}
