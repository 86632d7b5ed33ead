//! metadata
//!
//! Option and filter metadata for command types.
//!
//! # Architecture
//!
//! Command types describe themselves through [`Options::declare`], an explicit
//! registration table standing in for attribute reflection. [`extract`] turns
//! a declaration into an ordered, immutable [`CommandModel`]; [`model`] caches
//! it per type for the lifetime of the process.
//!
//! Nothing here performs I/O or talks to the parser engine. Problems found in
//! a declaration are recorded on the model and surfaced when the command's
//! bindings are built (see [`crate::engine::builder`]).

pub mod declare;
pub mod descriptor;
pub mod extract;

pub use declare::{Declaration, OptionBuilder, Options};
pub use descriptor::{
    CommandDescriptor, DefaultValue, FilterDescriptor, OptionDescriptor, ValueMismatch,
};
pub use extract::{extract, model, CommandModel};

use std::fmt;

use crate::core::types::PropertyId;

/// A configuration problem found while declaring or building a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// A declaration called `extends` more than once.
    MultipleBases { declaring_type: &'static str },

    /// The property type cannot be bound by the parser engine.
    UnsupportedType {
        property: PropertyId,
        type_name: &'static str,
    },

    /// A name or alias is already used by another option of the command.
    DuplicateName {
        property: PropertyId,
        token: String,
        first: PropertyId,
    },

    /// A name or alias collides with one the parser engine reserves.
    ReservedName { property: PropertyId, token: String },

    /// The display name or an alias is empty.
    EmptyName { property: PropertyId },

    /// Bindings were applied twice to the same registration context.
    OperationAlreadySet,

    /// The same command type was registered more than once.
    DuplicateCommand { name: String },

    /// A sub-command names a parent that was never registered.
    UnknownParent { parent: &'static str },

    /// Two sibling commands share a name.
    DuplicateCommandName { name: String },

    /// A command name collides with a sub-command the parser engine generates.
    ReservedCommandName { name: String },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::MultipleBases { declaring_type } => {
                write!(f, "{} extends more than one option group", declaring_type)
            }
            Problem::UnsupportedType {
                property,
                type_name,
            } => write!(
                f,
                "property '{}' has type {} which cannot be bound to an option",
                property, type_name
            ),
            Problem::DuplicateName {
                property,
                token,
                first,
            } => write!(
                f,
                "property '{}' reuses '{}' already taken by '{}'",
                property, token, first
            ),
            Problem::ReservedName { property, token } => {
                write!(f, "property '{}' uses reserved name '{}'", property, token)
            }
            Problem::EmptyName { property } => {
                write!(f, "property '{}' has an empty name or alias", property)
            }
            Problem::OperationAlreadySet => {
                write!(f, "an operation is already installed on this command")
            }
            Problem::DuplicateCommand { name } => {
                write!(f, "command type '{}' is registered more than once", name)
            }
            Problem::UnknownParent { parent } => {
                write!(f, "parent command '{}' is not registered", parent)
            }
            Problem::DuplicateCommandName { name } => {
                write!(f, "more than one sub-command is named '{}'", name)
            }
            Problem::ReservedCommandName { name } => {
                write!(f, "command name '{}' is reserved", name)
            }
        }
    }
}
