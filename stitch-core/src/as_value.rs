use crate::{Error, Result, Value, truncate_long};
use anyhow::Context;
use rust_decimal::Decimal;
use std::any;
use time::{Date, PrimitiveDateTime, format_description::well_known::Iso8601};
use uuid::Uuid;

/// Convert both ways between Rust field types and [`Value`].
///
/// Column kinds in the registry are built against `Value` directly; `AsValue`
/// is what the derive macro reaches for when binding a typed struct field
/// out of the `Value` a [`crate::ColumnKind`] produced, and when reading a
/// field back out as a `Value` for foreign-key comparison during wiring.
pub trait AsValue {
    /// Try to convert a dynamic `Value` into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Convert `self` into a `Value`, the direction the binder uses to
    /// compare a local column against a candidate reference's column.
    fn as_value(self) -> Value;
}

impl AsValue for Value {
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
    fn as_value(self) -> Value {
        self
    }
}

macro_rules! impl_as_value {
    ($source:ty, $variant:ident) => {
        impl AsValue for $source {
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
            fn as_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}
impl_as_value!(bool, Bool);
impl_as_value!(i32, Int32);
impl_as_value!(i64, Int64);
impl_as_value!(f32, Float32);
impl_as_value!(f64, Float64);
impl_as_value!(Decimal, Decimal);
impl_as_value!(String, Str);
impl_as_value!(Vec<u8>, Bytes);
impl_as_value!(Uuid, Uuid);
impl_as_value!(Date, Date);
impl_as_value!(PrimitiveDateTime, Timestamp);

impl<T: AsValue> AsValue for Option<T> {
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::try_from_value(value)?))
        }
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
}

/// Parse the textual forms the registry's `zero*` kinds accept for dates and
/// timestamps when the row carries them as strings rather than typed driver
/// columns.
pub fn parse_date(input: &str) -> Result<Date> {
    Date::parse(input, &Iso8601::DATE)
        .with_context(|| format!("Cannot parse `{}` as a date", truncate_long!(input)))
}

pub fn parse_timestamp(input: &str) -> Result<PrimitiveDateTime> {
    PrimitiveDateTime::parse(input, &Iso8601::DATE_TIME)
        .with_context(|| format!("Cannot parse `{}` as a timestamp", truncate_long!(input)))
}
