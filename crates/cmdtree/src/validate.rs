//! Type validation of parsed option values.
//!
//! Every supplied value is checked against its option's declared type and
//! all failures are reported together as one [`Error::IllegalArgument`].
//! Validation never modifies the input.

use tracing::debug;

use crate::error::{Error, Violation, Violations};
use crate::option::OptionType;
use crate::tree::ActionRef;
use crate::walker::ParsedInput;

/// Collects every type violation in `input`.
///
/// Options the action does not declare are skipped, and `any` options are
/// never checked.
pub fn violations(input: &ParsedInput, action: ActionRef<'_>) -> Violations {
    let mut found = Violations::new();
    for (name, values) in input.options() {
        let Some(spec) = action.option(name) else {
            continue;
        };
        if spec.kind() == OptionType::Any {
            continue;
        }
        for value in values {
            if !spec.kind().accepts(value) {
                found.push(Violation {
                    option: name.clone(),
                    expected: spec.kind(),
                    value: value.to_string(),
                });
            }
        }
    }
    found
}

/// Validates `input`, returning it unchanged when every value passes.
pub fn validate(input: ParsedInput, action: ActionRef<'_>) -> Result<ParsedInput, Error> {
    let found = violations(&input, action);
    if found.is_empty() {
        Ok(input)
    } else {
        debug!(command = action.path(), count = found.len(), "validation failed");
        Err(Error::IllegalArgument(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::walk;
    use crate::{Action, CommandTree, OptionSpec};

    fn tree() -> CommandTree {
        Action::new("app")
            .option(OptionSpec::numeric("count"))
            .option(OptionSpec::numeric("size").multiple())
            .option(OptionSpec::any("name"))
            .option(OptionSpec::boolean("force"))
            .handler(|_| Ok(()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_input_is_returned_unchanged() {
        let tree = tree();
        let (action, input) =
            walk(tree.root(), &["--count", "123", "--name", "x", "--force"]).unwrap();
        let validated = validate(input.clone(), action).unwrap();
        assert_eq!(validated, input);
    }

    #[test]
    fn test_numeric_failure_names_option_and_type() {
        let tree = tree();
        let (action, input) = walk(tree.root(), &["--count", "abc"]).unwrap();
        let err = validate(input, action).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("count"));
        assert!(message.contains("numeric"));
        assert!(message.contains("abc"));
    }

    #[test]
    fn test_collects_every_violation() {
        let tree = tree();
        let (action, input) = walk(
            tree.root(),
            &["--count", "x", "--size", "1", "--size", "y", "--size", "z"],
        )
        .unwrap();
        match validate(input, action).unwrap_err() {
            Error::IllegalArgument(found) => {
                assert_eq!(found.len(), 3);
                assert!(found.mentions("count"));
                assert!(found.mentions("size"));
                let values: Vec<_> = found.iter().map(|v| v.value.as_str()).collect();
                assert_eq!(values, vec!["x", "y", "z"]);
            }
            other => panic!("Expected IllegalArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_any_is_never_checked() {
        let tree = tree();
        let (action, input) = walk(tree.root(), &["--name", "123abc"]).unwrap();
        assert!(violations(&input, action).is_empty());
    }

    #[test]
    fn test_violations_are_idempotent() {
        let tree = tree();
        let (action, input) = walk(tree.root(), &["--count", "nope"]).unwrap();
        assert_eq!(violations(&input, action), violations(&input, action));
    }
}
