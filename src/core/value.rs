//! core::value
//!
//! Option value types and the typed values exchanged with the parser engine.
//!
//! # Overview
//!
//! Every bindable property type implements [`OptionType`], which tells the
//! runtime what to ask the parser for ([`ValueType`]), what the zero value of
//! the type is, and how to convert the typed value the parser hands back
//! ([`OptionValue`]) into the property type.
//!
//! Coercion from text happens inside the parser engine. Nothing in this
//! module parses strings.
//!
//! # Example
//!
//! ```
//! use cmdhost::core::value::{OptionType, OptionValue, ValueKind, ValueType};
//!
//! assert_eq!(bool::value_type(), ValueType::Plain(ValueKind::Bool));
//! assert_eq!(<Option<u8>>::zero_value(), OptionValue::Absent);
//! assert_eq!(i32::from_value(OptionValue::Int(7)), Some(7));
//! ```

use std::fmt;
use std::path::PathBuf;

/// Primitive kinds the parser engine can coerce to.
///
/// Integer kinds carry the inclusive range the parser must enforce, so a
/// value that does not fit the property type is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Bool,
    Int { min: i64, max: i64 },
    UInt { max: u64 },
    Float,
    Text,
    Path,
}

impl ValueKind {
    /// Short human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int { .. } => "integer",
            ValueKind::UInt { .. } => "unsigned integer",
            ValueKind::Float => "number",
            ValueKind::Text => "string",
            ValueKind::Path => "path",
        }
    }
}

/// Declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueType {
    /// A primitive that always has a value.
    Plain(ValueKind),
    /// A primitive wrapped in `Option`; omitted means absent.
    Nullable(ValueKind),
    /// A type the parser engine cannot bind (e.g. `Option<Option<T>>`).
    Unsupported(&'static str),
}

impl ValueType {
    /// The primitive kind, if the type is bindable.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            ValueType::Plain(kind) | ValueType::Nullable(kind) => Some(*kind),
            ValueType::Unsupported(_) => None,
        }
    }

    /// Whether omission binds as absent.
    pub fn is_nullable(&self) -> bool {
        matches!(self, ValueType::Nullable(_))
    }
}

/// A typed value produced by the parser engine or a default supplier.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Path(PathBuf),
    /// No value; binds as `None` for nullable properties.
    Absent,
}

impl OptionValue {
    /// Whether this is [`OptionValue::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, OptionValue::Absent)
    }

    /// Render the value the way it would be written on the command line.
    ///
    /// Returns `None` for values that have no command-line spelling (absent
    /// values and empty strings/paths).
    pub fn render(&self) -> Option<String> {
        let rendered = self.to_string();
        if self.is_absent() || rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{}", v),
            OptionValue::Int(v) => write!(f, "{}", v),
            OptionValue::UInt(v) => write!(f, "{}", v),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Text(v) => write!(f, "{}", v),
            OptionValue::Path(v) => write!(f, "{}", v.display()),
            OptionValue::Absent => Ok(()),
        }
    }
}

/// A property type that can be bound from a command-line option.
pub trait OptionType: Sized + Send + 'static {
    /// The type the parser engine must produce.
    fn value_type() -> ValueType;

    /// The zero value used when a non-required option has no default.
    fn zero_value() -> OptionValue;

    /// Convert a parsed value; `None` when the value does not fit.
    fn from_value(value: OptionValue) -> Option<Self>;

    /// Convert into an [`OptionValue`] (used for declared defaults).
    fn into_value(self) -> OptionValue;
}

impl OptionType for bool {
    fn value_type() -> ValueType {
        ValueType::Plain(ValueKind::Bool)
    }

    fn zero_value() -> OptionValue {
        OptionValue::Bool(false)
    }

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> OptionValue {
        OptionValue::Bool(self)
    }
}

macro_rules! signed_option_type {
    ($($ty:ty),*) => {$(
        impl OptionType for $ty {
            fn value_type() -> ValueType {
                ValueType::Plain(ValueKind::Int {
                    min: <$ty>::MIN as i64,
                    max: <$ty>::MAX as i64,
                })
            }

            fn zero_value() -> OptionValue {
                OptionValue::Int(0)
            }

            fn from_value(value: OptionValue) -> Option<Self> {
                match value {
                    OptionValue::Int(v) => <$ty>::try_from(v).ok(),
                    OptionValue::UInt(v) => <$ty>::try_from(v).ok(),
                    _ => None,
                }
            }

            fn into_value(self) -> OptionValue {
                OptionValue::Int(self as i64)
            }
        }
    )*};
}

macro_rules! unsigned_option_type {
    ($($ty:ty),*) => {$(
        impl OptionType for $ty {
            fn value_type() -> ValueType {
                ValueType::Plain(ValueKind::UInt {
                    max: <$ty>::MAX as u64,
                })
            }

            fn zero_value() -> OptionValue {
                OptionValue::UInt(0)
            }

            fn from_value(value: OptionValue) -> Option<Self> {
                match value {
                    OptionValue::UInt(v) => <$ty>::try_from(v).ok(),
                    OptionValue::Int(v) => <$ty>::try_from(v).ok(),
                    _ => None,
                }
            }

            fn into_value(self) -> OptionValue {
                OptionValue::UInt(self as u64)
            }
        }
    )*};
}

signed_option_type!(i8, i16, i32, i64, isize);
unsigned_option_type!(u8, u16, u32, u64, usize);

impl OptionType for f64 {
    fn value_type() -> ValueType {
        ValueType::Plain(ValueKind::Float)
    }

    fn zero_value() -> OptionValue {
        OptionValue::Float(0.0)
    }

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Float(v) => Some(v),
            OptionValue::Int(v) => Some(v as f64),
            OptionValue::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    fn into_value(self) -> OptionValue {
        OptionValue::Float(self)
    }
}

impl OptionType for f32 {
    fn value_type() -> ValueType {
        ValueType::Plain(ValueKind::Float)
    }

    fn zero_value() -> OptionValue {
        OptionValue::Float(0.0)
    }

    fn from_value(value: OptionValue) -> Option<Self> {
        let wide = f64::from_value(value)?;
        let narrow = wide as f32;
        // Finite input that overflows f32 does not fit.
        (narrow.is_finite() || !wide.is_finite()).then_some(narrow)
    }

    fn into_value(self) -> OptionValue {
        OptionValue::Float(self as f64)
    }
}

impl OptionType for String {
    fn value_type() -> ValueType {
        ValueType::Plain(ValueKind::Text)
    }

    fn zero_value() -> OptionValue {
        OptionValue::Text(String::new())
    }

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Text(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> OptionValue {
        OptionValue::Text(self)
    }
}

impl OptionType for PathBuf {
    fn value_type() -> ValueType {
        ValueType::Plain(ValueKind::Path)
    }

    fn zero_value() -> OptionValue {
        OptionValue::Path(PathBuf::new())
    }

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Path(v) => Some(v),
            OptionValue::Text(v) => Some(PathBuf::from(v)),
            _ => None,
        }
    }

    fn into_value(self) -> OptionValue {
        OptionValue::Path(self)
    }
}

impl<T: OptionType> OptionType for Option<T> {
    fn value_type() -> ValueType {
        match T::value_type() {
            ValueType::Plain(kind) => ValueType::Nullable(kind),
            _ => ValueType::Unsupported(std::any::type_name::<Self>()),
        }
    }

    fn zero_value() -> OptionValue {
        OptionValue::Absent
    }

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Absent => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn into_value(self) -> OptionValue {
        match self {
            Some(v) => v.into_value(),
            None => OptionValue::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod value_types {
        use super::*;

        #[test]
        fn integers_carry_ranges() {
            assert_eq!(
                u8::value_type(),
                ValueType::Plain(ValueKind::UInt { max: 255 })
            );
            assert_eq!(
                i16::value_type(),
                ValueType::Plain(ValueKind::Int {
                    min: -32768,
                    max: 32767
                })
            );
        }

        #[test]
        fn option_is_nullable() {
            assert_eq!(
                <Option<String>>::value_type(),
                ValueType::Nullable(ValueKind::Text)
            );
            assert!(<Option<bool>>::value_type().is_nullable());
        }

        #[test]
        fn nested_option_is_unsupported() {
            let ty = <Option<Option<i32>>>::value_type();
            assert!(matches!(ty, ValueType::Unsupported(_)));
            assert!(ty.kind().is_none());
        }
    }

    mod zero_values {
        use super::*;

        #[test]
        fn value_like_types() {
            assert_eq!(bool::zero_value(), OptionValue::Bool(false));
            assert_eq!(i32::zero_value(), OptionValue::Int(0));
            assert_eq!(u64::zero_value(), OptionValue::UInt(0));
            assert_eq!(f64::zero_value(), OptionValue::Float(0.0));
            assert_eq!(String::zero_value(), OptionValue::Text(String::new()));
        }

        #[test]
        fn nullable_is_absent() {
            assert_eq!(<Option<i32>>::zero_value(), OptionValue::Absent);
        }
    }

    mod conversions {
        use super::*;

        #[test]
        fn narrowing_rejects_out_of_range() {
            assert_eq!(u8::from_value(OptionValue::UInt(300)), None);
            assert_eq!(i8::from_value(OptionValue::Int(-5)), Some(-5));
        }

        #[test]
        fn f32_rejects_overflow() {
            assert_eq!(f32::from_value(OptionValue::Float(1e300)), None);
            assert_eq!(f32::from_value(OptionValue::Float(0.5)), Some(0.5));
            assert_eq!(
                f32::from_value(OptionValue::Float(f64::INFINITY)),
                Some(f32::INFINITY)
            );
        }

        #[test]
        fn mismatched_kind_is_rejected() {
            assert_eq!(bool::from_value(OptionValue::Text("true".into())), None);
        }

        #[test]
        fn option_maps_absent_to_none() {
            assert_eq!(<Option<i32>>::from_value(OptionValue::Absent), Some(None));
            assert_eq!(
                <Option<i32>>::from_value(OptionValue::Int(3)),
                Some(Some(3))
            );
        }

        #[test]
        fn into_value_round_trip_for_defaults() {
            assert_eq!("world".to_string().into_value(), OptionValue::Text("world".into()));
            assert_eq!(Some(5u16).into_value(), OptionValue::UInt(5));
            assert_eq!(None::<u16>.into_value(), OptionValue::Absent);
        }
    }

    #[test]
    fn render_skips_empty_values() {
        assert_eq!(OptionValue::Absent.render(), None);
        assert_eq!(OptionValue::Text(String::new()).render(), None);
        assert_eq!(OptionValue::Bool(true).render(), Some("true".to_string()));
        assert_eq!(OptionValue::Float(1.5).render(), Some("1.5".to_string()));
    }
}
