//! metadata::descriptor
//!
//! Immutable descriptors produced from command declarations.
//!
//! # Invariants
//!
//! - Descriptors never change after extraction; a running pipeline only reads them
//! - The default of an option is decided once, here, by [`DefaultValue::resolve`]
//! - Completion hints are presentation-only and never constrain accepted values

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::core::naming::{option_name, Alias};
use crate::core::types::{CommandTypeId, FilterKey, PropertyId};
use crate::core::value::{OptionValue, ValueType};

/// A parsed value did not fit the property type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("value does not fit property type {expected}")]
pub struct ValueMismatch {
    /// Rust type name of the property.
    pub expected: &'static str,
}

/// Writes a typed value onto a property of `T`.
pub(crate) type Setter<T> =
    Arc<dyn Fn(&mut T, OptionValue) -> Result<(), ValueMismatch> + Send + Sync>;

/// How the default of an option is supplied.
///
/// # Example
///
/// ```
/// use cmdhost::core::value::OptionValue;
/// use cmdhost::metadata::DefaultValue;
///
/// let zero = OptionValue::Int(0);
///
/// // Explicit default always wins.
/// let d = DefaultValue::resolve(Some(OptionValue::Int(3)), true, zero.clone());
/// assert_eq!(d.supplied(), Some(&OptionValue::Int(3)));
///
/// // Optional without default: zero value.
/// let d = DefaultValue::resolve(None, false, zero.clone());
/// assert_eq!(d.supplied(), Some(&OptionValue::Int(0)));
///
/// // Required without default: nothing registered.
/// let d = DefaultValue::resolve(None, true, zero);
/// assert_eq!(d.supplied(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// No default; the parser engine must fail when the option is omitted.
    NoDefault,
    /// A default declared by the author.
    Explicit(OptionValue),
    /// The zero value of the property type (absent for nullable types).
    ZeroValue(OptionValue),
}

impl DefaultValue {
    /// Apply the default-value resolution rule.
    pub fn resolve(explicit: Option<OptionValue>, required: bool, zero: OptionValue) -> Self {
        match explicit {
            Some(value) => DefaultValue::Explicit(value),
            None if !required => DefaultValue::ZeroValue(zero),
            None => DefaultValue::NoDefault,
        }
    }

    /// The value the default supplier yields, if one is registered.
    pub fn supplied(&self) -> Option<&OptionValue> {
        match self {
            DefaultValue::NoDefault => None,
            DefaultValue::Explicit(value) | DefaultValue::ZeroValue(value) => Some(value),
        }
    }

    /// Whether a default supplier is registered.
    pub fn is_registered(&self) -> bool {
        !matches!(self, DefaultValue::NoDefault)
    }
}

/// One bindable option of a command type `T`.
pub struct OptionDescriptor<T> {
    pub(crate) property: PropertyId,
    pub(crate) value_type: ValueType,
    pub(crate) order: Option<i32>,
    pub(crate) rank: i32,
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) aliases: Vec<Alias>,
    pub(crate) description: Option<String>,
    pub(crate) required: bool,
    pub(crate) default: DefaultValue,
    pub(crate) completions: Vec<String>,
    pub(crate) setter: Setter<T>,
}

impl<T> OptionDescriptor<T> {
    /// Declaring property.
    pub fn property(&self) -> PropertyId {
        self.property
    }

    /// Declared value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Explicit order, if declared.
    pub fn order(&self) -> Option<i32> {
        self.order
    }

    /// Hierarchy rank: 0 for the command itself, -1 for its base group, and so on.
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Position among the options declared at the same level.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Display name (long flag without dashes).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared aliases.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// Help text.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the option was declared required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Resolved default.
    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    /// Completion hints.
    pub fn completions(&self) -> &[String] {
        &self.completions
    }

    /// All spellings of this option (`--name`, then aliases).
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(format!("--{}", self.name))
            .chain(self.aliases.iter().map(Alias::token))
            .collect()
    }

    /// Whether the parser engine must reject an omitted value.
    ///
    /// An explicit default wins over the required flag.
    pub fn requires_input(&self) -> bool {
        matches!(self.default, DefaultValue::NoDefault)
    }

    /// Write a value onto `target`.
    pub fn apply(&self, target: &mut T, value: OptionValue) -> Result<(), ValueMismatch> {
        (self.setter)(target, value)
    }

    /// Sort key: explicit orders first, then hierarchy rank (base first), then declaration order.
    pub(crate) fn sort_key(&self) -> (bool, i32, i32, usize) {
        (
            self.order.is_none(),
            self.order.unwrap_or(0),
            self.rank,
            self.index,
        )
    }
}

impl<T> Clone for OptionDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            property: self.property,
            value_type: self.value_type,
            order: self.order,
            rank: self.rank,
            index: self.index,
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            description: self.description.clone(),
            required: self.required,
            default: self.default.clone(),
            completions: self.completions.clone(),
            setter: Arc::clone(&self.setter),
        }
    }
}

impl<T> fmt::Debug for OptionDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("property", &self.property)
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("order", &self.order)
            .field("rank", &self.rank)
            .field("index", &self.index)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Display name for a property when none was declared.
pub(crate) fn display_name(property: &str, declared: Option<&str>) -> String {
    option_name(declared.unwrap_or(property))
}

/// One cross-cutting filter attached to a command or registered globally.
///
/// Lower orders run first and wrap everything after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDescriptor {
    /// Position in the pipeline; ascending.
    pub order: i32,
    /// Registry lookup key.
    pub key: FilterKey,
}

impl FilterDescriptor {
    /// Descriptor for filter key `F` at `order`.
    pub fn of<F: 'static>(order: i32) -> Self {
        Self {
            order,
            key: FilterKey::of::<F>(),
        }
    }
}

/// One node of the command tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Implementing type; `None` for a root without a handler.
    pub command_type: Option<CommandTypeId>,
    /// Display name.
    pub name: String,
    /// Help text.
    pub description: Option<String>,
    /// Sub-commands in registration order.
    pub children: Vec<CommandDescriptor>,
}

impl CommandDescriptor {
    /// Find a descendant by its name path.
    pub fn find(&self, path: &[&str]) -> Option<&CommandDescriptor> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .children
                .iter()
                .find(|child| child.name == *head)
                .and_then(|child| child.find(rest)),
        }
    }

    /// Number of nodes in this subtree, including self.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(CommandDescriptor::len).sum::<usize>()
    }

    /// Always false; a descriptor counts itself.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod default_value {
        use super::*;

        #[test]
        fn explicit_beats_required() {
            let d = DefaultValue::resolve(Some(OptionValue::Bool(true)), true, OptionValue::Bool(false));
            assert_eq!(d, DefaultValue::Explicit(OptionValue::Bool(true)));
            assert!(d.is_registered());
        }

        #[test]
        fn optional_gets_zero() {
            let d = DefaultValue::resolve(None, false, OptionValue::Text(String::new()));
            assert_eq!(d.supplied(), Some(&OptionValue::Text(String::new())));
        }

        #[test]
        fn required_without_default_registers_nothing() {
            let d = DefaultValue::resolve(None, true, OptionValue::Int(0));
            assert_eq!(d, DefaultValue::NoDefault);
            assert!(!d.is_registered());
        }
    }

    mod command_descriptor {
        use super::*;

        fn leaf(name: &str) -> CommandDescriptor {
            CommandDescriptor {
                command_type: None,
                name: name.to_string(),
                description: None,
                children: vec![],
            }
        }

        #[test]
        fn find_walks_path() {
            let mut remote = leaf("remote");
            remote.children.push(leaf("add"));
            let mut root = leaf("app");
            root.children.push(remote);
            root.children.push(leaf("greet"));

            assert_eq!(root.find(&["remote", "add"]).map(|d| d.name.as_str()), Some("add"));
            assert!(root.find(&["remote", "missing"]).is_none());
            assert_eq!(root.find(&[]).map(|d| d.name.as_str()), Some("app"));
            assert_eq!(root.len(), 4);
        }
    }

    #[test]
    fn filter_descriptor_of() {
        struct Audit;
        let d = FilterDescriptor::of::<Audit>(5);
        assert_eq!(d.order, 5);
        assert_eq!(d.key, FilterKey::of::<Audit>());
    }

    #[test]
    fn display_name_prefers_declared() {
        assert_eq!(display_name("dry_run", None), "dry-run");
        assert_eq!(display_name("dry_run", Some("--simulate")), "simulate");
    }
}
