//! Option declarations and the values they produce.
//!
//! An [`OptionSpec`] declares a named, typed input on an action. Values move
//! through three shapes:
//!
//! - [`RawValue`]: what the walker collected (text, or a resolved flag)
//! - [`OptionValue`]: what the option's operator turned it into
//! - [`CommandOption`]: the per-option record a handler reads from the context

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// The declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Any text value, no check.
    Any,
    /// Must parse as an integer.
    Numeric,
    /// A flag: `--name` or `--no-name`, never followed by a value.
    Boolean,
}

impl OptionType {
    /// Returns true if `value` is acceptable for this type.
    pub fn accepts(self, value: &RawValue) -> bool {
        match (self, value) {
            (OptionType::Any, RawValue::Text(_)) => true,
            (OptionType::Numeric, RawValue::Text(text)) => text.parse::<i64>().is_ok(),
            (OptionType::Boolean, RawValue::Flag(_)) => true,
            _ => false,
        }
    }

    /// The value an undeclared default falls back to.
    pub fn default_value(self) -> OptionValue {
        match self {
            OptionType::Any => OptionValue::Null,
            OptionType::Numeric => OptionValue::Integer(0),
            OptionType::Boolean => OptionValue::Bool(false),
        }
    }

    /// The built-in conversion for this type.
    ///
    /// Numeric text becomes an integer; everything else keeps its shape.
    pub fn convert(self, value: &RawValue) -> OptionValue {
        match (self, value) {
            (OptionType::Numeric, RawValue::Text(text)) => match text.parse::<i64>() {
                Ok(n) => OptionValue::Integer(n),
                Err(_) => OptionValue::Text(text.clone()),
            },
            (_, RawValue::Text(text)) => OptionValue::Text(text.clone()),
            (_, RawValue::Flag(flag)) => OptionValue::Bool(*flag),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Any => write!(f, "any"),
            OptionType::Numeric => write!(f, "numeric"),
            OptionType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A value as collected from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// The token that followed a value-taking option.
    Text(String),
    /// A boolean option, already resolved from the `no-` prefix.
    Flag(bool),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(text) => write!(f, "{}", text),
            RawValue::Flag(flag) => write!(f, "{}", flag),
        }
    }
}

/// A converted option value, as handlers see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl OptionValue {
    pub fn is_null(&self) -> bool {
        matches!(self, OptionValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Integer(value.into())
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

/// Transform applied to each validated value.
pub type ValueOperator = Rc<dyn Fn(&RawValue) -> OptionValue>;

/// Declaration of one option on an action.
///
/// # Example
///
/// ```rust
/// use cmdtree::{OptionSpec, OptionType};
///
/// let count = OptionSpec::numeric("count").short('c').with_default(1);
/// assert_eq!(count.kind(), OptionType::Numeric);
/// assert_eq!(count.short_name(), Some('c'));
///
/// let tags = OptionSpec::any("tag").multiple();
/// assert!(tags.multi_valued());
/// ```
#[derive(Clone)]
pub struct OptionSpec {
    name: String,
    short: Option<char>,
    kind: OptionType,
    description: Option<String>,
    default: OptionValue,
    multi_valued: bool,
    operator: Option<ValueOperator>,
}

impl OptionSpec {
    /// Creates an option of the given type with that type's default value.
    pub fn new(name: impl Into<String>, kind: OptionType) -> Self {
        Self {
            name: name.into(),
            short: None,
            kind,
            description: None,
            default: kind.default_value(),
            multi_valued: false,
            operator: None,
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Any)
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Numeric)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Boolean)
    }

    /// Sets the single-character alias (`-x`).
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the value handlers see when the option is not supplied.
    pub fn with_default(mut self, default: impl Into<OptionValue>) -> Self {
        self.default = default.into();
        self
    }

    /// Allows the option to be supplied more than once.
    pub fn multiple(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Replaces the built-in conversion for this option's type.
    pub fn operator<F>(mut self, operator: F) -> Self
    where
        F: Fn(&RawValue) -> OptionValue + 'static,
    {
        self.operator = Some(Rc::new(operator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn kind(&self) -> OptionType {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    pub fn multi_valued(&self) -> bool {
        self.multi_valued
    }

    pub fn is_boolean(&self) -> bool {
        self.kind == OptionType::Boolean
    }

    /// Runs the option's operator over one raw value.
    pub fn apply(&self, value: &RawValue) -> OptionValue {
        match &self.operator {
            Some(operator) => operator(value),
            None => self.kind.convert(value),
        }
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("multi_valued", &self.multi_valued)
            .field("custom_operator", &self.operator.is_some())
            .finish()
    }
}

/// Resolved values of one option inside a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOption {
    /// Long name of the option.
    pub name: String,
    /// Operator-applied values in input order, or the default alone.
    pub values: Vec<OptionValue>,
    /// False when `values` holds the declared default.
    pub supplied: bool,
}

impl CommandOption {
    /// The first value.
    pub fn value(&self) -> Option<&OptionValue> {
        self.values.first()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value().and_then(OptionValue::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value().and_then(OptionValue::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(OptionValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_per_type() {
        assert_eq!(OptionSpec::any("name").default_value(), &OptionValue::Null);
        assert_eq!(
            OptionSpec::numeric("count").default_value(),
            &OptionValue::Integer(0)
        );
        assert_eq!(
            OptionSpec::boolean("force").default_value(),
            &OptionValue::Bool(false)
        );
    }

    #[test]
    fn test_numeric_accepts_integers_only() {
        let numeric = OptionType::Numeric;
        assert!(numeric.accepts(&RawValue::Text("123".into())));
        assert!(numeric.accepts(&RawValue::Text("-7".into())));
        assert!(!numeric.accepts(&RawValue::Text("abc".into())));
        assert!(!numeric.accepts(&RawValue::Text("1.5".into())));
        assert!(!numeric.accepts(&RawValue::Flag(true)));
    }

    #[test]
    fn test_boolean_accepts_flags_only() {
        assert!(OptionType::Boolean.accepts(&RawValue::Flag(false)));
        assert!(!OptionType::Boolean.accepts(&RawValue::Text("true".into())));
    }

    #[test]
    fn test_builtin_conversion() {
        let count = OptionSpec::numeric("count");
        assert_eq!(
            count.apply(&RawValue::Text("123".into())),
            OptionValue::Integer(123)
        );

        let name = OptionSpec::any("name");
        assert_eq!(
            name.apply(&RawValue::Text("123".into())),
            OptionValue::Text("123".into())
        );

        let force = OptionSpec::boolean("force");
        assert_eq!(force.apply(&RawValue::Flag(true)), OptionValue::Bool(true));
    }

    #[test]
    fn test_custom_operator() {
        let upper = OptionSpec::any("name").operator(|raw| match raw {
            RawValue::Text(text) => OptionValue::Text(text.to_uppercase()),
            RawValue::Flag(flag) => OptionValue::Bool(*flag),
        });
        assert_eq!(
            upper.apply(&RawValue::Text("ada".into())),
            OptionValue::Text("ADA".into())
        );
    }

    #[test]
    fn test_option_value_serializes_untagged() {
        let option = CommandOption {
            name: "count".into(),
            values: vec![OptionValue::Integer(5), OptionValue::Null],
            supplied: true,
        };
        let value = serde_json::to_value(&option).unwrap();
        assert_eq!(
            value,
            json!({"name": "count", "values": [5, null], "supplied": true})
        );
    }

    #[test]
    fn test_command_option_accessors() {
        let option = CommandOption {
            name: "count".into(),
            values: vec![OptionValue::Integer(5)],
            supplied: true,
        };
        assert_eq!(option.as_i64(), Some(5));
        assert_eq!(option.as_bool(), None);
        assert_eq!(option.as_str(), None);
    }
}
