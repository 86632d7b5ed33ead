//! core::types
//!
//! Strong identity types.
//!
//! # Types
//!
//! - [`CommandTypeId`] - Identity of a command type
//! - [`FilterKey`] - Capability key used to look up a filter in the registry
//! - [`PropertyId`] - Identity of a declared option property
//!
//! Identities compare by `TypeId`; the type name is carried only for
//! diagnostics and logging.
//!
//! # Examples
//!
//! ```
//! use cmdhost::core::types::{CommandTypeId, FilterKey};
//!
//! struct Greet;
//! struct Timing;
//!
//! assert_eq!(CommandTypeId::of::<Greet>(), CommandTypeId::of::<Greet>());
//! assert_ne!(FilterKey::of::<Greet>(), FilterKey::of::<Timing>());
//! assert!(CommandTypeId::of::<Greet>().type_name().ends_with("Greet"));
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type identity plus its name.
#[derive(Clone, Copy)]
struct TypeIdentity {
    id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Last path segment of the type name (`app::cmd::Greet` -> `Greet`).
    fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Identity of a command type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandTypeId(TypeIdentity);

impl CommandTypeId {
    /// Identity of `T`.
    pub fn of<T: 'static>() -> Self {
        Self(TypeIdentity::of::<T>())
    }

    /// The underlying `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.0.id
    }

    /// Fully qualified type name.
    pub fn type_name(&self) -> &'static str {
        self.0.name
    }

    /// Unqualified type name, for messages.
    pub fn short_name(&self) -> &'static str {
        self.0.short_name()
    }
}

impl fmt::Debug for CommandTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandTypeId({})", self.0.name)
    }
}

impl fmt::Display for CommandTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// Capability key of a filter.
///
/// Usually the filter implementation type itself; a marker type can be used
/// instead to decouple a command's declaration from the implementation
/// registered by the host.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterKey(TypeIdentity);

impl FilterKey {
    /// Key for `T`.
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self(TypeIdentity::of::<T>())
    }

    /// Fully qualified type name of the key.
    pub fn type_name(&self) -> &'static str {
        self.0.name
    }

    /// Unqualified type name of the key.
    pub fn short_name(&self) -> &'static str {
        self.0.short_name()
    }
}

impl fmt::Debug for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterKey({})", self.0.name)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// Identity of a declared property: the declaring type plus the property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId {
    /// Type that declared the property (a command or an inherited group).
    pub declaring_type: &'static str,
    /// Property name as declared.
    pub name: &'static str,
}

impl PropertyId {
    /// Create a property identity.
    pub fn new(declaring_type: &'static str, name: &'static str) -> Self {
        Self {
            declaring_type,
            name,
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self
            .declaring_type
            .rsplit("::")
            .next()
            .unwrap_or(self.declaring_type);
        write!(f, "{}.{}", ty, self.name)
    }
}
