//! Property-based tests for the walker and validator using proptest.

use cmdtree::{validate, violations, walk, Action, CommandTree, Error, OptionSpec, RawValue};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

fn tree() -> CommandTree {
    Action::new("app")
        .option(OptionSpec::numeric("count"))
        .option(OptionSpec::boolean("flag"))
        .option(OptionSpec::any("tag").multiple())
        .arguments(true)
        .handler(|_| Ok(()))
        .action(
            Action::new("child")
                .option(OptionSpec::numeric("count"))
                .option(OptionSpec::boolean("flag"))
                .option(OptionSpec::any("tag").multiple())
                .arguments(true)
                .handler(|_| Ok(())),
        )
        .build()
        .expect("tree is valid")
}

/// Words that are never option syntax nor an action name.
fn plain_word() -> impl Strategy<Value = String> {
    "[a-z]{3,8}".prop_filter("not an action name", |w| w != "child")
}

/// One option group or positional word, already split into tokens.
fn segment() -> impl Strategy<Value = Vec<String>> {
    prop_oneof![
        (0i64..1000).prop_map(|n| vec!["--count".to_string(), n.to_string()]),
        plain_word().prop_map(|w| vec!["--tag".to_string(), w]),
        plain_word().prop_map(|w| vec![w]),
    ]
}

/// Segments where `--count` appears at most once.
fn segments() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(segment(), 0..6).prop_map(|segments| {
        let mut seen_count = false;
        segments
            .into_iter()
            .filter(|s| {
                if s[0] == "--count" {
                    !std::mem::replace(&mut seen_count, true)
                } else {
                    true
                }
            })
            .collect()
    })
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// The child name resolves the child wherever it is placed.
    #[test]
    fn action_name_resolves_at_any_position(
        segments in segments(),
        position in any::<prop::sample::Index>(),
    ) {
        let tree = tree();
        let at = position.index(segments.len() + 1);
        let mut tokens: Vec<String> = segments[..at].concat();
        tokens.push("child".to_string());
        tokens.extend(segments[at..].concat());

        let (action, _) = walk(tree.root(), &tokens).unwrap();
        prop_assert_eq!(action.path(), "app child");
    }

    /// Boolean flags never consume the following word.
    #[test]
    fn boolean_flag_consumes_nothing(negated in any::<bool>(), word in plain_word()) {
        let tree = tree();
        let flag = if negated { "--no-flag" } else { "--flag" };
        let (_, input) = walk(tree.root(), &[flag, word.as_str()]).unwrap();

        prop_assert_eq!(input.values("flag"), Some(&[RawValue::Flag(!negated)][..]));
        prop_assert_eq!(input.arguments(), &[word][..]);
    }

    /// A multi-valued option supplied N times keeps N values in order.
    #[test]
    fn multi_valued_keeps_every_value(tags in prop::collection::vec(plain_word(), 1..8)) {
        let tree = tree();
        let tokens: Vec<String> = tags
            .iter()
            .flat_map(|t| ["--tag".to_string(), t.clone()])
            .collect();
        let (_, input) = walk(tree.root(), &tokens).unwrap();

        let expected: Vec<RawValue> = tags.into_iter().map(RawValue::Text).collect();
        prop_assert_eq!(input.values("tag"), Some(expected.as_slice()));
    }

    /// A single-valued option supplied twice is always rejected.
    #[test]
    fn single_valued_repeat_is_rejected(a in 0i64..100, b in 0i64..100, word in plain_word()) {
        let tree = tree();
        let tokens = [
            "--count".to_string(),
            a.to_string(),
            word,
            "--count".to_string(),
            b.to_string(),
        ];
        let err = walk(tree.root(), &tokens).unwrap_err();
        let is_repeat = matches!(err, Error::MultipleOptionValues { .. });
        prop_assert!(is_repeat);
    }

    /// Integers always validate; validation leaves input untouched.
    #[test]
    fn numeric_values_validate(n in any::<i64>()) {
        let tree = tree();
        let value = n.to_string();
        let (action, input) = walk(tree.root(), &["--count", value.as_str()]).unwrap();
        let validated = validate(input.clone(), action).unwrap();
        prop_assert_eq!(validated, input);
    }

    /// Validation reports the same violations every time.
    #[test]
    fn validation_is_idempotent(value in "[a-z0-9]{1,6}".prop_filter("not an action name", |v| v != "child")) {
        let tree = tree();
        let (action, input) = walk(tree.root(), &["--count", value.as_str()]).unwrap();
        let first = violations(&input, action);
        let second = violations(&input, action);
        prop_assert_eq!(first.len(), usize::from(value.parse::<i64>().is_err()));
        prop_assert_eq!(first, second);
    }
}
