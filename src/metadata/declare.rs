//! metadata::declare
//!
//! The declaration surface: how a type describes its options and filters.
//!
//! # Architecture
//!
//! A type implements [`Options`] and fills a [`Declaration`] from
//! `declare()`. The declaration is the explicit registration table for that
//! type: options with their setters, filters with their orders, and at most
//! one base group whose declaration is folded in one hierarchy level down.
//!
//! A base group is a plain struct embedded in the command and reached through
//! a lens (`fn(&mut Command) -> &mut Group`). Its options become options of
//! the command with rank -1 (its own base, -2, and so on).
//!
//! # Example
//!
//! ```
//! use cmdhost::metadata::{Declaration, Options};
//!
//! #[derive(Default)]
//! struct Verbosity {
//!     verbose: bool,
//! }
//!
//! impl Options for Verbosity {
//!     fn declare(decl: &mut Declaration<Self>) {
//!         decl.option("verbose", |v: &mut Verbosity, value: bool| v.verbose = value)
//!             .alias("-v")
//!             .description("Print more output");
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Greet {
//!     common: Verbosity,
//!     name: String,
//! }
//!
//! impl Options for Greet {
//!     fn declare(decl: &mut Declaration<Self>) {
//!         decl.extends(|g: &mut Greet| &mut g.common);
//!         decl.option("name", |g: &mut Greet, value: String| g.name = value)
//!             .default("world");
//!     }
//! }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use super::descriptor::{FilterDescriptor, Setter, ValueMismatch};
use super::Problem;
use crate::core::types::PropertyId;
use crate::core::value::{OptionType, OptionValue, ValueType};

/// A type whose properties can be bound from command-line options.
pub trait Options: Send + Sized + 'static {
    /// Describe options, filters and the base group of this type.
    fn declare(decl: &mut Declaration<Self>);
}

/// An option as declared, before resolution into a descriptor.
pub(crate) struct OptionDecl<T> {
    pub(crate) property: PropertyId,
    pub(crate) name: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) required: bool,
    pub(crate) default: Option<OptionValue>,
    pub(crate) order: Option<i32>,
    pub(crate) completions: Vec<String>,
    pub(crate) value_type: ValueType,
    pub(crate) zero: OptionValue,
    pub(crate) setter: Setter<T>,
}

impl<T: 'static> OptionDecl<T> {
    /// Re-target the setter through a lens into an embedding type.
    fn lift<U: 'static>(self, lens: fn(&mut U) -> &mut T) -> OptionDecl<U> {
        let inner = self.setter;
        OptionDecl {
            property: self.property,
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            required: self.required,
            default: self.default,
            order: self.order,
            completions: self.completions,
            value_type: self.value_type,
            zero: self.zero,
            setter: Arc::new(move |target: &mut U, value| inner(lens(target), value)),
        }
    }
}

/// Options and filters declared by one type in the hierarchy.
pub(crate) struct Level<T> {
    pub(crate) declaring_type: &'static str,
    pub(crate) options: Vec<OptionDecl<T>>,
    pub(crate) filters: Vec<FilterDescriptor>,
}

impl<T: 'static> Level<T> {
    fn lift<U: 'static>(self, lens: fn(&mut U) -> &mut T) -> Level<U> {
        Level {
            declaring_type: self.declaring_type,
            options: self.options.into_iter().map(|o| o.lift(lens)).collect(),
            filters: self.filters,
        }
    }
}

/// Registration table filled by [`Options::declare`].
pub struct Declaration<T> {
    own: Level<T>,
    bases: Option<Vec<Level<T>>>,
    problems: Vec<Problem>,
}

impl<T: Options> Declaration<T> {
    pub(crate) fn new() -> Self {
        Self {
            own: Level {
                declaring_type: std::any::type_name::<T>(),
                options: Vec::new(),
                filters: Vec::new(),
            },
            bases: None,
            problems: Vec::new(),
        }
    }

    /// Declare an option bound to `property` through `set`.
    ///
    /// The display name defaults to the property name in kebab case.
    pub fn option<V, F>(&mut self, property: &'static str, set: F) -> OptionBuilder<'_, T, V>
    where
        V: OptionType,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let setter: Setter<T> = Arc::new(move |target: &mut T, value: OptionValue| {
            match V::from_value(value) {
                Some(typed) => {
                    set(target, typed);
                    Ok(())
                }
                None => Err(ValueMismatch {
                    expected: std::any::type_name::<V>(),
                }),
            }
        });

        self.own.options.push(OptionDecl {
            property: PropertyId::new(self.own.declaring_type, property),
            name: None,
            aliases: Vec::new(),
            description: None,
            required: false,
            default: None,
            order: None,
            completions: Vec::new(),
            value_type: V::value_type(),
            zero: V::zero_value(),
            setter,
        });

        let index = self.own.options.len() - 1;
        OptionBuilder {
            decl: &mut self.own.options[index],
            _value: PhantomData,
        }
    }

    /// Attach filter `F` with order 0.
    pub fn filter<F: 'static>(&mut self) -> &mut Self {
        self.filter_ordered::<F>(0)
    }

    /// Attach filter `F` with an explicit order.
    pub fn filter_ordered<F: 'static>(&mut self, order: i32) -> &mut Self {
        self.own.filters.push(FilterDescriptor::of::<F>(order));
        self
    }

    /// Inherit the declaration of `B`, reached through `lens`.
    ///
    /// Only one base group is allowed; a second call is recorded as a
    /// configuration problem and ignored.
    pub fn extends<B: Options>(&mut self, lens: fn(&mut T) -> &mut B) -> &mut Self {
        if self.bases.is_some() {
            self.problems.push(Problem::MultipleBases {
                declaring_type: self.own.declaring_type,
            });
            return self;
        }

        let mut base = Declaration::<B>::new();
        B::declare(&mut base);
        let (levels, problems) = base.into_levels();
        self.problems.extend(problems);
        self.bases = Some(levels.into_iter().map(|level| level.lift(lens)).collect());
        self
    }

    /// Levels from the most derived (this type) to the root base.
    pub(crate) fn into_levels(self) -> (Vec<Level<T>>, Vec<Problem>) {
        let mut levels = vec![self.own];
        levels.extend(self.bases.unwrap_or_default());
        (levels, self.problems)
    }
}

/// Chained configuration of one declared option.
pub struct OptionBuilder<'a, T, V> {
    decl: &'a mut OptionDecl<T>,
    _value: PhantomData<fn() -> V>,
}

impl<'a, T, V: OptionType> OptionBuilder<'a, T, V> {
    /// Override the display name.
    pub fn name(self, name: impl Into<String>) -> Self {
        self.decl.name = Some(name.into());
        self
    }

    /// Add an alias (`-n` for a short flag, `--nick` or `nick` for a long one).
    pub fn alias(self, alias: impl Into<String>) -> Self {
        self.decl.aliases.push(alias.into());
        self
    }

    /// Help text.
    pub fn description(self, text: impl Into<String>) -> Self {
        self.decl.description = Some(text.into());
        self
    }

    /// Mark the option required.
    pub fn required(self) -> Self {
        self.decl.required = true;
        self
    }

    /// Explicit default value.
    pub fn default(self, value: impl Into<V>) -> Self {
        self.decl.default = Some(value.into().into_value());
        self
    }

    /// Explicit order; lower values are registered first.
    pub fn order(self, order: i32) -> Self {
        self.decl.order = Some(order);
        self
    }

    /// Completion hints shown in help; values outside the list are still accepted.
    pub fn completions<I, S>(self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decl.completions.extend(hints.into_iter().map(Into::into));
        self
    }
}
