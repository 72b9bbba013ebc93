use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// A single cell from a denormalized result row.
///
/// Mirrors the shape of column values a driver hands back: scalar, optionally
/// absent (`Null`), with just enough variants to cover the primitive column
/// kinds the registry knows about.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Str(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(Date),
    Timestamp(PrimitiveDateTime),
}

impl Value {
    /// True for `Null` and for the empty/zero representations that the
    /// `zero*` column kinds treat as absent (empty string, integer/float
    /// zero, `false`, the nil UUID).
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Null` and for the value each variant treats as its own
    /// zero representation: the empty string (and the string forms `"0"`,
    /// `"false"`), numeric zero, `false`, and the nil UUID. A primary key
    /// made up entirely of canonical-zero columns is treated as absent
    /// (typically the far side of a `LEFT JOIN` that did not match) rather
    /// than deduplicated against.
    pub fn is_canonical_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(v) => !v,
            Value::Int32(v) => *v == 0,
            Value::Int64(v) => *v == 0,
            Value::Float32(v) => *v == 0.0,
            Value::Float64(v) => *v == 0.0,
            Value::Str(v) => matches!(v.as_str(), "" | "0" | "false"),
            Value::Uuid(v) => v.is_nil(),
            Value::Decimal(_) | Value::Bytes(_) | Value::Date(_) | Value::Timestamp(_) => false,
        }
    }

    /// Render the value as a string, the form used for primary-key
    /// deduplication keys and for the canonical-zero check.
    pub fn to_key_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Decimal(v) => v.to_string(),
            Value::Str(v) => v.clone(),
            Value::Bytes(v) => v.iter().map(|b| format!("{b:02x}")).collect(),
            Value::Uuid(v) => v.to_string(),
            Value::Date(v) => v.to_string(),
            Value::Timestamp(v) => v.to_string(),
        }
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Str(value.into())
    }
}
