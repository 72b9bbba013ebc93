use crate::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use uuid::Uuid;

/// One column kind: how to stringify a value for primary-key comparison, how
/// to bind a raw driver value into the canonical [`Value`], and how to
/// compare two bound values for equality.
///
/// `kind` strings on `#[entity(kind = "...")]` are looked up against a
/// [`TypeRegistry`] at derive-expansion time; unrecognized names are not a
/// compile error, they just make the column fall back to the identity
/// binding (see [`TypeRegistry::get`]).
pub trait ColumnKind: Send + Sync {
    /// The registered name, e.g. `"zerostring"`.
    fn name(&self) -> &'static str;
    /// Stringify a value for primary-key dedup purposes.
    fn stringify_pk(&self, value: &Value) -> String;
    /// Bind a raw value, returning `None` when the kind's zero/empty
    /// representation was observed (skip-worthy for PK purposes).
    fn bind(&self, value: &Value) -> crate::Result<Option<Value>>;
    /// Equality used by C6 for FK matching. Zero-on-either-side returns
    /// false by default, so "unset" never matches "unset". `bool`/`zerobool`
    /// override this (see their impls) to reproduce the original mapper's
    /// documented inability to distinguish "set false" from "unset".
    fn equal(&self, a: &Value, b: &Value) -> bool {
        !a.is_canonical_zero() && !b.is_canonical_zero() && a == b
    }
}

macro_rules! plain_kind {
    ($struct_name:ident, $name:literal) => {
        pub struct $struct_name;
        impl ColumnKind for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }
            fn stringify_pk(&self, value: &Value) -> String {
                value.to_key_string()
            }
            fn bind(&self, value: &Value) -> crate::Result<Option<Value>> {
                Ok(Some(value.clone()))
            }
        }
    };
}

plain_kind!(UuidKind, "uuid");
plain_kind!(StringKind, "string");
plain_kind!(Int32Kind, "int32");
plain_kind!(Int64Kind, "int64");
plain_kind!(Float32Kind, "float32");
plain_kind!(Float64Kind, "float64");

/// Boolean column kind. `equal` deliberately does *not* reject a
/// canonical-zero (`false`) pair the way the trait default does: the
/// original mapper's `boolean.Equal` compares raw values with no zero check
/// at all, so two rows that both genuinely carry `false` on a bool FK link
/// upstream. Preserved here rather than "fixed" into different behavior —
/// see DESIGN.md.
pub struct BoolKind;
impl ColumnKind for BoolKind {
    fn name(&self) -> &'static str {
        "bool"
    }
    fn stringify_pk(&self, value: &Value) -> String {
        value.to_key_string()
    }
    fn bind(&self, value: &Value) -> crate::Result<Option<Value>> {
        Ok(Some(value.clone()))
    }
    fn equal(&self, a: &Value, b: &Value) -> bool {
        a == b
    }
}

/// Timestamp column kind. Accepts an already-typed `Value::Timestamp`
/// unchanged, and also parses `Value::Str`/`Value::Bytes` driver shapes
/// (some drivers hand timestamps back as text rather than a native type).
pub struct TimestampKind;
impl ColumnKind for TimestampKind {
    fn name(&self) -> &'static str {
        "timestamp"
    }
    fn stringify_pk(&self, value: &Value) -> String {
        value.to_key_string()
    }
    fn bind(&self, value: &Value) -> crate::Result<Option<Value>> {
        match value {
            Value::Str(s) => Ok(Some(Value::Timestamp(crate::parse_timestamp(s)?))),
            Value::Bytes(b) => Ok(Some(Value::Timestamp(crate::parse_timestamp(
                &String::from_utf8_lossy(b),
            )?))),
            other => Ok(Some(other.clone())),
        }
    }
}

/// Date column kind. Same string/bytes parsing fallback as [`TimestampKind`].
pub struct DateKind;
impl ColumnKind for DateKind {
    fn name(&self) -> &'static str {
        "date"
    }
    fn stringify_pk(&self, value: &Value) -> String {
        value.to_key_string()
    }
    fn bind(&self, value: &Value) -> crate::Result<Option<Value>> {
        match value {
            Value::Str(s) => Ok(Some(Value::Date(crate::parse_date(s)?))),
            Value::Bytes(b) => Ok(Some(Value::Date(crate::parse_date(&String::from_utf8_lossy(
                b,
            ))?))),
            other => Ok(Some(other.clone())),
        }
    }
}

/// A set of string-ish "zero" values the zero-canonical kinds treat as
/// equivalent to NULL: the empty string, `"0"` and `false`.
const ZERO_STRINGS: [&str; 3] = ["", "0", "false"];

macro_rules! zero_kind {
    ($struct_name:ident, $name:literal, $is_zero:expr) => {
        pub struct $struct_name;
        impl ColumnKind for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }
            fn stringify_pk(&self, value: &Value) -> String {
                value.to_key_string()
            }
            fn bind(&self, value: &Value) -> crate::Result<Option<Value>> {
                let is_zero: fn(&Value) -> bool = $is_zero;
                if value.is_null() || is_zero(value) {
                    return Ok(None);
                }
                Ok(Some(value.clone()))
            }
        }
    };
    ($struct_name:ident, $name:literal, $is_zero:expr, equal = $equal:expr) => {
        pub struct $struct_name;
        impl ColumnKind for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }
            fn stringify_pk(&self, value: &Value) -> String {
                value.to_key_string()
            }
            fn bind(&self, value: &Value) -> crate::Result<Option<Value>> {
                let is_zero: fn(&Value) -> bool = $is_zero;
                if value.is_null() || is_zero(value) {
                    return Ok(None);
                }
                Ok(Some(value.clone()))
            }
            fn equal(&self, a: &Value, b: &Value) -> bool {
                let equal: fn(&Value, &Value) -> bool = $equal;
                equal(a, b)
            }
        }
    };
}

zero_kind!(ZeroStringKind, "zerostring", |v| match v {
    Value::Str(s) => ZERO_STRINGS.contains(&s.as_str()),
    _ => false,
});
zero_kind!(ZeroIntKind, "zeroint", |v| matches!(
    v,
    Value::Int32(0) | Value::Int64(0)
));
zero_kind!(ZeroFloatKind, "zerofloat", |v| matches!(v, Value::Float32(f) if *f == 0.0)
    || matches!(v, Value::Float64(f) if *f == 0.0));
// `zeroBool.Equal` in the original mapper is also a raw `==`, no zero check,
// same documented limitation as `BoolKind` above.
zero_kind!(
    ZeroBoolKind,
    "zerobool",
    |v| matches!(v, Value::Bool(false)),
    equal = |a, b| a == b
);
zero_kind!(ZeroUuidKind, "zerouuid", |v| matches!(
    v,
    Value::Uuid(u) if *u == Uuid::nil()
));

/// Dispatch table from `kind` tag name to [`ColumnKind`] implementation.
///
/// Grounded on the fourteen registry entries of the original mapper: the
/// nine plain kinds plus the five zero-canonical ones used for nullable
/// foreign keys that a driver reports as their type's zero value instead of
/// SQL NULL.
pub struct TypeRegistry {
    kinds: HashMap<&'static str, Box<dyn ColumnKind>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut kinds: HashMap<&'static str, Box<dyn ColumnKind>> = HashMap::new();
        let mut register = |kind: Box<dyn ColumnKind>| {
            kinds.insert(kind.name(), kind);
        };
        register(Box::new(UuidKind));
        register(Box::new(StringKind));
        register(Box::new(Int32Kind));
        register(Box::new(Int64Kind));
        register(Box::new(Float32Kind));
        register(Box::new(Float64Kind));
        register(Box::new(BoolKind));
        register(Box::new(TimestampKind));
        register(Box::new(DateKind));
        register(Box::new(ZeroStringKind));
        register(Box::new(ZeroIntKind));
        register(Box::new(ZeroFloatKind));
        register(Box::new(ZeroBoolKind));
        register(Box::new(ZeroUuidKind));
        Self { kinds }
    }

    /// Look up a registered kind by name. `None` for unknown names; callers
    /// fall back to treating the column as an opaque passthrough value.
    pub fn get(&self, name: &str) -> Option<&dyn ColumnKind> {
        self.kinds.get(name).map(|b| b.as_ref())
    }

    pub fn register(&mut self, kind: Box<dyn ColumnKind>) {
        self.kinds.insert(kind.name(), kind);
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide default registry, built once and shared by every mapper call
/// that does not supply a custom [`TypeRegistry`] via
/// [`crate::MapperOptions`].
pub fn default_registry() -> &'static TypeRegistry {
    static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(TypeRegistry::new)
}
