//! Per-invocation execution context.
//!
//! A [`Context`] is built by the router for every handler call and dropped
//! when the handler returns. It carries:
//!
//! | Field        | Purpose                                                   |
//! |--------------|-----------------------------------------------------------|
//! | action       | The resolved action (and through it, the whole tree)      |
//! | options      | One [`CommandOption`] per declared option, supplied or not |
//! | arguments    | Positional arguments in input order                       |
//! | sinks        | Output and error channel for this invocation              |
//! | forwarder    | Re-entry point used by [`Context::forward`]               |
//!
//! # Forwarding
//!
//! ```rust
//! use cmdtree::{Action, ExecuteOptions, OutputMode, Router};
//!
//! let tree = Action::new("app")
//!     .action(Action::new("greet").handler(|ctx| {
//!         ctx.writeln("hello")?;
//!         Ok(())
//!     }))
//!     .action(Action::new("welcome").handler(|ctx| {
//!         ctx.forward("greet", ExecuteOptions::default())?;
//!         ctx.writeln("welcome")?;
//!         Ok(())
//!     }))
//!     .build()?;
//!
//! let captured = Router::new(tree)
//!     .execute(["welcome"], ExecuteOptions::output(OutputMode::Buffer))
//!     .into_captured()
//!     .unwrap();
//! assert_eq!(captured.stdout, "hello\nwelcome\n");
//! # Ok::<(), cmdtree::DefinitionError>(())
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::Error;
use crate::event;
use crate::input::split_command;
use crate::option::{CommandOption, OptionValue};
use crate::output::{OutputMode, Sinks};
use crate::router::Outcome;
use crate::tree::{ActionId, ActionRef, CommandTree};
use crate::walker::ParsedInput;

/// Where an invocation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// A single process invocation.
    #[default]
    Cli,
    /// A line typed into a running shell.
    Shell,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Cli => write!(f, "cli"),
            Environment::Shell => write!(f, "shell"),
        }
    }
}

/// Error returned when parsing an unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}' (expected 'cli' or 'shell')")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cli" => Ok(Environment::Cli),
            "shell" => Ok(Environment::Shell),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

/// Options of one `execute` call.
///
/// Both fields are optional so a forward can override only what it names;
/// see [`ExecuteOptions::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteOptions {
    pub output: Option<OutputMode>,
    pub environment: Option<Environment>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options selecting only an output mode.
    pub fn output(mode: OutputMode) -> Self {
        Self::new().with_output(mode)
    }

    /// Options selecting only an environment.
    pub fn environment(environment: Environment) -> Self {
        Self::new().with_environment(environment)
    }

    pub fn with_output(mut self, mode: OutputMode) -> Self {
        self.output = Some(mode);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Returns `self` with every field `overrides` sets replaced.
    pub fn merge(self, overrides: ExecuteOptions) -> Self {
        Self {
            output: overrides.output.or(self.output),
            environment: overrides.environment.or(self.environment),
        }
    }

    /// The effective output mode.
    pub fn mode(&self) -> OutputMode {
        self.output.unwrap_or_default()
    }

    /// The effective environment.
    pub fn env(&self) -> Environment {
        self.environment.unwrap_or_default()
    }
}

/// Re-entry point a context uses to forward to another command.
///
/// `sinks` is the caller's channel pair when the forwarded call should write
/// into it, or `None` to pick fresh sinks from the options.
pub trait Forwarder {
    fn forward(
        &self,
        tokens: Vec<String>,
        options: ExecuteOptions,
        sinks: Option<Sinks>,
    ) -> Result<Outcome, Error>;
}

/// Context passed to command handlers.
pub struct Context {
    tree: Rc<CommandTree>,
    action: ActionId,
    options: BTreeMap<String, CommandOption>,
    arguments: Vec<String>,
    execute_options: ExecuteOptions,
    sinks: Sinks,
    forwarder: Rc<dyn Forwarder>,
}

impl Context {
    /// Builds the context for `action` from validated input.
    ///
    /// Supplied options run through their operator; every other declared
    /// option gets its default.
    pub(crate) fn new(
        tree: Rc<CommandTree>,
        action: ActionId,
        input: &ParsedInput,
        execute_options: ExecuteOptions,
        sinks: Sinks,
        forwarder: Rc<dyn Forwarder>,
    ) -> Self {
        let options = tree
            .at(action)
            .options()
            .iter()
            .map(|spec| {
                let option = match input.values(spec.name()) {
                    Some(raw) => CommandOption {
                        name: spec.name().to_string(),
                        values: raw.iter().map(|value| spec.apply(value)).collect(),
                        supplied: true,
                    },
                    None => CommandOption {
                        name: spec.name().to_string(),
                        values: vec![spec.default_value().clone()],
                        supplied: false,
                    },
                };
                (option.name.clone(), option)
            })
            .collect();

        Self {
            arguments: input.arguments().to_vec(),
            tree,
            action,
            options,
            execute_options,
            sinks,
            forwarder,
        }
    }

    /// The resolved action.
    pub fn action(&self) -> ActionRef<'_> {
        self.tree.at(self.action)
    }

    /// Fully-qualified command path of the resolved action.
    pub fn path(&self) -> &str {
        self.action().path()
    }

    /// True when the root action itself was invoked.
    pub fn is_root(&self) -> bool {
        self.action().is_root()
    }

    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options.get(name)
    }

    /// All declared options, ordered by name.
    pub fn options(&self) -> impl Iterator<Item = &CommandOption> {
        self.options.values()
    }

    pub fn value(&self, name: &str) -> Option<&OptionValue> {
        self.option(name).and_then(CommandOption::value)
    }

    /// Every value of an option; a single default when it was not supplied.
    pub fn values(&self, name: &str) -> &[OptionValue] {
        self.option(name)
            .map(|option| option.values.as_slice())
            .unwrap_or_default()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(OptionValue::as_i64)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(OptionValue::as_str)
    }

    /// A boolean option's value; false when undeclared.
    pub fn flag(&self, name: &str) -> bool {
        self.value(name)
            .and_then(OptionValue::as_bool)
            .unwrap_or(false)
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }

    pub fn execute_options(&self) -> ExecuteOptions {
        self.execute_options
    }

    pub fn environment(&self) -> Environment {
        self.execute_options.env()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.execute_options.mode()
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }

    /// Writes to the output channel.
    pub fn write(&self, text: impl AsRef<str>) -> io::Result<()> {
        self.sinks.out.write(text.as_ref())
    }

    pub fn writeln(&self, text: impl AsRef<str>) -> io::Result<()> {
        self.write(format!("{}\n", text.as_ref()))
    }

    /// Writes to the error channel.
    pub fn ewrite(&self, text: impl AsRef<str>) -> io::Result<()> {
        self.sinks.err.write(text.as_ref())
    }

    pub fn ewriteln(&self, text: impl AsRef<str>) -> io::Result<()> {
        self.ewrite(format!("{}\n", text.as_ref()))
    }

    /// Runs another command through the full pipeline.
    ///
    /// `command` is split shell-style. `overrides` is merged onto this
    /// invocation's options. When the resulting output mode matches the
    /// current one, the forwarded command writes into this context's sinks.
    pub fn forward(&self, command: &str, overrides: ExecuteOptions) -> Result<Outcome, Error> {
        let tokens = split_command(self.path(), command)?;
        self.forward_args(tokens, overrides)
    }

    /// Like [`Context::forward`] with already-split tokens.
    pub fn forward_args<I, S>(&self, tokens: I, overrides: ExecuteOptions) -> Result<Outcome, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = self.execute_options.merge(overrides);
        let inherited = (options.mode() == self.output_mode()).then(|| self.sinks.clone());
        let tokens = tokens.into_iter().map(Into::into).collect();
        self.forwarder.forward(tokens, options, inherited)
    }

    /// Invokes an event, bubbling from this action to the root.
    ///
    /// Returns true if at least one handler ran.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<bool, Error> {
        event::invoke(self, name, None, args)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.path())
            .field("options", &self.options)
            .field("arguments", &self.arguments)
            .field("execute_options", &self.execute_options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, OptionSpec, Router};
    use std::cell::RefCell;

    #[test]
    fn test_merge_prefers_overrides() {
        let base = ExecuteOptions::output(OutputMode::Buffer).with_environment(Environment::Cli);
        let merged = base.merge(ExecuteOptions::environment(Environment::Shell));
        assert_eq!(merged.mode(), OutputMode::Buffer);
        assert_eq!(merged.env(), Environment::Shell);

        assert_eq!(base.merge(ExecuteOptions::new()), base);
    }

    #[test]
    fn test_effective_defaults() {
        let options = ExecuteOptions::new();
        assert_eq!(options.mode(), OutputMode::Standard);
        assert_eq!(options.env(), Environment::Cli);
    }

    #[test]
    fn test_execute_options_deserialize() {
        let options: ExecuteOptions =
            serde_json::from_str(r#"{"output": "buffer", "environment": "shell"}"#).unwrap();
        assert_eq!(options.mode(), OutputMode::Buffer);
        assert_eq!(options.env(), Environment::Shell);

        let empty: ExecuteOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ExecuteOptions::new());
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("SHELL".parse::<Environment>(), Ok(Environment::Shell));
        assert!("repl".parse::<Environment>().is_err());
    }

    #[test]
    fn test_context_resolves_values_and_defaults() {
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();

        let tree = Action::new("app")
            .option(OptionSpec::numeric("count").with_default(3))
            .option(OptionSpec::numeric("size"))
            .option(OptionSpec::any("tag").multiple())
            .option(OptionSpec::boolean("force"))
            .arguments(true)
            .handler(move |ctx| {
                *seen_clone.borrow_mut() = Some((
                    ctx.int("count"),
                    ctx.option("count").map(|o| o.supplied),
                    ctx.int("size"),
                    ctx.values("tag").to_vec(),
                    ctx.flag("force"),
                    ctx.arguments().to_vec(),
                ));
                Ok(())
            })
            .build()
            .unwrap();

        let outcome = Router::new(tree).execute(
            ["--size", "7", "--tag", "a", "x", "--tag", "b", "--force"],
            ExecuteOptions::output(OutputMode::Buffer),
        );
        assert!(outcome.is_success());

        let (count, count_supplied, size, tags, force, arguments) =
            seen.borrow_mut().take().unwrap();
        assert_eq!(count, Some(3));
        assert_eq!(count_supplied, Some(false));
        assert_eq!(size, Some(7));
        assert_eq!(tags, vec![OptionValue::from("a"), OptionValue::from("b")]);
        assert!(force);
        assert_eq!(arguments, vec!["x".to_string()]);
    }

    #[test]
    fn test_undeclared_lookups_are_empty() {
        let tree = Action::new("app")
            .handler(|ctx| {
                assert!(ctx.option("missing").is_none());
                assert!(ctx.values("missing").is_empty());
                assert!(!ctx.flag("missing"));
                assert_eq!(ctx.argument(0), None);
                Ok(())
            })
            .build()
            .unwrap();
        let outcome =
            Router::new(tree).execute(Vec::<String>::new(), ExecuteOptions::output(OutputMode::Buffer));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_error_channel_is_separate() {
        let tree = Action::new("app")
            .handler(|ctx| {
                ctx.write("out")?;
                ctx.ewriteln("warn")?;
                Ok(())
            })
            .build()
            .unwrap();
        let captured = Router::new(tree)
            .execute(Vec::<String>::new(), ExecuteOptions::output(OutputMode::Buffer))
            .into_captured()
            .unwrap();
        assert_eq!(captured.stdout, "out");
        assert_eq!(captured.stderr, "warn\n");
    }
}
