//! Dynamically typed property values.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use crate::error::{Error, TypeError};
use crate::types::ValueType;

/// A dynamically-typed property value.
///
/// Every value read from or written to a state entry, bound into a
/// predicate, or sent to the store as a parameter is a `Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    /// Exact decimal kept in its textual form.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    /// Days since 1970-01-01.
    Date(i32),
    /// Microseconds since midnight.
    Time(i64),
    /// Microseconds since the Unix epoch, UTC.
    Timestamp(i64),
    Uuid([u8; 16]),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalar type of this value; `None` for `Null` and arrays.
    pub const fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Null | Value::Array(_) => return None,
            Value::Bool(_) => ValueType::Bool,
            Value::TinyInt(_) => ValueType::TinyInt,
            Value::SmallInt(_) => ValueType::SmallInt,
            Value::Int(_) => ValueType::Int,
            Value::BigInt(_) => ValueType::BigInt,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::Decimal(_) => ValueType::Decimal,
            Value::Text(_) => ValueType::Text,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Date(_) => ValueType::Date,
            Value::Time(_) => ValueType::Time,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Json(_) => ValueType::Json,
        })
    }

    /// Name used in type mismatch messages.
    pub const fn type_name(&self) -> &'static str {
        match self.value_type() {
            Some(ty) => ty.name(),
            None if self.is_null() => "NULL",
            None => "ARRAY",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer width widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(i64::from(*v)),
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Text or decimal contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Decimal(s) => Some(s),
            _ => None,
        }
    }

    /// Feed this value into a hasher.
    ///
    /// Floats hash by bit pattern so that hashing agrees with
    /// [`Value::key_eq`].
    pub fn hash_into<H: Hasher>(&self, hasher: &mut H) {
        std::mem::discriminant(self).hash(hasher);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(hasher),
            Value::TinyInt(n) => n.hash(hasher),
            Value::SmallInt(n) => n.hash(hasher),
            Value::Int(n) | Value::Date(n) => n.hash(hasher),
            Value::BigInt(n) | Value::Time(n) | Value::Timestamp(n) => n.hash(hasher),
            Value::Float(x) => x.to_bits().hash(hasher),
            Value::Double(x) => x.to_bits().hash(hasher),
            Value::Decimal(s) | Value::Text(s) => s.hash(hasher),
            Value::Bytes(bytes) => bytes.hash(hasher),
            Value::Uuid(bytes) => bytes.hash(hasher),
            Value::Json(json) => json.to_string().hash(hasher),
            Value::Array(items) => {
                items.len().hash(hasher);
                for item in items {
                    item.hash_into(hasher);
                }
            }
        }
    }

    /// Equality suitable for keys: reflexive for every value, floats
    /// compared by bit pattern.
    pub fn key_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.key_eq(y))
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => b.fmt(f),
            Value::TinyInt(n) => n.fmt(f),
            Value::SmallInt(n) => n.fmt(f),
            Value::Int(n) => n.fmt(f),
            Value::BigInt(n) => n.fmt(f),
            Value::Float(x) => x.fmt(f),
            Value::Double(x) => x.fmt(f),
            Value::Decimal(s) | Value::Text(s) => f.write_str(s),
            Value::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::Date(days) => write!(f, "date:{days}"),
            Value::Time(micros) => write!(f, "time:{micros}"),
            Value::Timestamp(micros) => write!(f, "timestamp:{micros}"),
            Value::Uuid(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                write!(
                    f,
                    "{}-{}-{}-{}-{}",
                    &hex[..8],
                    &hex[8..12],
                    &hex[12..16],
                    &hex[16..20],
                    &hex[20..]
                )
            }
            Value::Json(json) => json.fmt(f),
            Value::Array(items) => {
                f.write_str("[")?;
                let mut first = true;
                for item in items {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<u8> => Bytes,
    [u8; 16] => Uuid,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: actual.type_name().to_string(),
        property: None,
    })
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl TryFrom<Value> for i32 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::TinyInt(v) => Ok(i32::from(v)),
            Value::SmallInt(v) => Ok(i32::from(v)),
            Value::Int(v) => Ok(v),
            Value::BigInt(v) => i32::try_from(v).map_err(|_| {
                Error::Type(TypeError {
                    expected: "i32",
                    actual: format!("BIGINT {} out of range", v),
                    property: None,
                })
            }),
            other => Err(mismatch("i32", &other)),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_i64() {
            Some(v) => Ok(v),
            None => Err(mismatch("i64", &value)),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(v) => Ok(f64::from(v)),
            Value::Double(v) => Ok(v),
            Value::Int(v) => Ok(f64::from(v)),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(v) | Value::Decimal(v) => Ok(v),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl TryFrom<Value> for [u8; 16] {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Uuid(v) => Ok(v),
            other => Err(mismatch("UUID", &other)),
        }
    }
}

/// `Null` maps to `None`.
impl<T> TryFrom<Value> for Option<T>
where
    T: TryFrom<Value, Error = Error>,
{
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        v.hash_into(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_hash_distinguishes_variants() {
        assert_ne!(hash_of(&Value::Int(1)), hash_of(&Value::BigInt(1)));
        assert_eq!(hash_of(&Value::Text("a".into())), hash_of(&"a".into()));
    }

    #[test]
    fn test_key_eq_is_reflexive_for_nan() {
        let nan = Value::Double(f64::NAN);
        assert!(nan.key_eq(&nan.clone()));
        assert_ne!(nan, nan.clone());
        assert_eq!(hash_of(&nan), hash_of(&Value::Double(f64::NAN)));
    }

    #[test]
    fn test_option_conversion() {
        let some: Option<i32> = Option::try_from(Value::Int(42)).unwrap();
        assert_eq!(some, Some(42));
        let none: Option<String> = Option::try_from(Value::Null).unwrap();
        assert_eq!(none, None);
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_bigint_narrowing() {
        assert_eq!(i32::try_from(Value::BigInt(7)).unwrap(), 7);
        assert!(i32::try_from(Value::BigInt(i64::MAX)).is_err());
        assert!(i32::try_from(Value::Text("7".into())).is_err());
    }

    #[test]
    fn test_uuid_display() {
        let v = Value::Uuid([
            0x67, 0xe5, 0x50, 0x44, 0x10, 0xb1, 0x42, 0x6f, 0x92, 0x47, 0xbb, 0x68, 0x0e, 0x5f,
            0xe0, 0xc8,
        ]);
        assert_eq!(v.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }
}
