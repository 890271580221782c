//! Declared property types and value coercion.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, TypeError};
use crate::value::Value;

/// The declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    // Integer types
    TinyInt,
    SmallInt,
    Int,
    BigInt,

    // Floating point
    Float,
    Double,

    // Fixed precision
    Decimal,

    Bool,
    Text,
    Bytes,

    // Date/time types
    Date,
    Time,
    Timestamp,

    Uuid,
    Json,
}

impl ValueType {
    /// Get a display name for this type.
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::TinyInt => "TINYINT",
            ValueType::SmallInt => "SMALLINT",
            ValueType::Int => "INTEGER",
            ValueType::BigInt => "BIGINT",
            ValueType::Float => "REAL",
            ValueType::Double => "DOUBLE",
            ValueType::Decimal => "DECIMAL",
            ValueType::Bool => "BOOLEAN",
            ValueType::Text => "TEXT",
            ValueType::Bytes => "BLOB",
            ValueType::Date => "DATE",
            ValueType::Time => "TIME",
            ValueType::Timestamp => "TIMESTAMP",
            ValueType::Uuid => "UUID",
            ValueType::Json => "JSON",
        }
    }

    /// Check if this type is an integer type.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            ValueType::TinyInt | ValueType::SmallInt | ValueType::Int | ValueType::BigInt
        )
    }

    /// Zero value of a value-like type. Text, binary, decimal and JSON have
    /// none and yield null; `Property::default_value` accounts for
    /// nullability.
    pub fn default_value(self) -> Value {
        match self {
            ValueType::TinyInt => Value::TinyInt(0),
            ValueType::SmallInt => Value::SmallInt(0),
            ValueType::Int => Value::Int(0),
            ValueType::BigInt => Value::BigInt(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Double => Value::Double(0.0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Date => Value::Date(0),
            ValueType::Time => Value::Time(0),
            ValueType::Timestamp => Value::Timestamp(0),
            ValueType::Uuid => Value::Uuid([0; 16]),
            ValueType::Decimal | ValueType::Text | ValueType::Bytes | ValueType::Json => {
                Value::Null
            }
        }
    }

    /// Check whether `value` is the default for this type. Null always is.
    pub fn is_default(self, value: &Value) -> bool {
        value.is_null() || value.key_eq(&self.default_value())
    }

    /// Convert `value` into the representation of this type.
    ///
    /// Integers are narrowed or widened to the declared width (with range
    /// checks), text is accepted for decimals. Null passes through; whether
    /// null is allowed is the property's concern.
    #[allow(clippy::cast_possible_truncation)]
    pub fn coerce(self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }
        if self.is_integer() {
            let Some(wide) = value.as_i64() else {
                return Err(self.mismatch(&value));
            };
            let out_of_range = || {
                Error::Type(TypeError {
                    expected: self.name(),
                    actual: format!("{} out of range", wide),
                    property: None,
                })
            };
            return match self {
                ValueType::TinyInt => i8::try_from(wide)
                    .map(Value::TinyInt)
                    .map_err(|_| out_of_range()),
                ValueType::SmallInt => i16::try_from(wide)
                    .map(Value::SmallInt)
                    .map_err(|_| out_of_range()),
                ValueType::Int => i32::try_from(wide)
                    .map(Value::Int)
                    .map_err(|_| out_of_range()),
                _ => Ok(Value::BigInt(wide)),
            };
        }
        match (self, value) {
            (ValueType::Float, Value::Float(v)) => Ok(Value::Float(v)),
            (ValueType::Float, Value::Double(v)) => Ok(Value::Float(v as f32)),
            (ValueType::Double, Value::Double(v)) => Ok(Value::Double(v)),
            (ValueType::Double, Value::Float(v)) => Ok(Value::Double(f64::from(v))),
            (ValueType::Decimal, Value::Decimal(v) | Value::Text(v)) => Ok(Value::Decimal(v)),
            (ValueType::Bool, v @ Value::Bool(_))
            | (ValueType::Text, v @ Value::Text(_))
            | (ValueType::Bytes, v @ Value::Bytes(_))
            | (ValueType::Date, v @ Value::Date(_))
            | (ValueType::Time, v @ Value::Time(_))
            | (ValueType::Timestamp, v @ Value::Timestamp(_))
            | (ValueType::Uuid, v @ Value::Uuid(_))
            | (ValueType::Json, v @ Value::Json(_)) => Ok(v),
            (_, other) => Err(self.mismatch(&other)),
        }
    }

    fn mismatch(self, value: &Value) -> Error {
        Error::Type(TypeError {
            expected: self.name(),
            actual: value.type_name().to_string(),
            property: None,
        })
    }
}

/// Rust types with a corresponding declared property type.
pub trait ValueTypeInfo {
    /// The declared type for this Rust type.
    const VALUE_TYPE: ValueType;

    /// Whether this type admits null.
    const NULLABLE: bool = false;
}

impl ValueTypeInfo for i8 {
    const VALUE_TYPE: ValueType = ValueType::TinyInt;
}

impl ValueTypeInfo for i16 {
    const VALUE_TYPE: ValueType = ValueType::SmallInt;
}

impl ValueTypeInfo for i32 {
    const VALUE_TYPE: ValueType = ValueType::Int;
}

impl ValueTypeInfo for i64 {
    const VALUE_TYPE: ValueType = ValueType::BigInt;
}

impl ValueTypeInfo for f32 {
    const VALUE_TYPE: ValueType = ValueType::Float;
}

impl ValueTypeInfo for f64 {
    const VALUE_TYPE: ValueType = ValueType::Double;
}

impl ValueTypeInfo for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;
}

impl ValueTypeInfo for String {
    const VALUE_TYPE: ValueType = ValueType::Text;
}

impl ValueTypeInfo for Vec<u8> {
    const VALUE_TYPE: ValueType = ValueType::Bytes;
}

impl ValueTypeInfo for [u8; 16] {
    const VALUE_TYPE: ValueType = ValueType::Uuid;
}

impl ValueTypeInfo for serde_json::Value {
    const VALUE_TYPE: ValueType = ValueType::Json;
}

impl<T: ValueTypeInfo> ValueTypeInfo for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE;
    const NULLABLE: bool = true;
}
