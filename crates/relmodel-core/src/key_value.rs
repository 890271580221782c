//! Structural key values.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::value::Value;

/// The value of a primary or foreign key.
///
/// Equality and hashing are element-wise. `Null` stands for "no value",
/// e.g. a foreign key with a null component.
#[derive(Debug, Clone)]
pub enum EntityKeyValue {
    Null,
    Simple(Value),
    Composite(Vec<Value>),
}

impl EntityKeyValue {
    /// Build a key value from components in key order.
    ///
    /// Yields `Null` if there are no components or any component is null.
    pub fn from_values(mut values: Vec<Value>) -> Self {
        if values.is_empty() || values.iter().any(Value::is_null) {
            return EntityKeyValue::Null;
        }
        if values.len() == 1 {
            return EntityKeyValue::Simple(values.remove(0));
        }
        EntityKeyValue::Composite(values)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EntityKeyValue::Null)
    }

    /// Components in key order; empty for `Null`.
    pub fn values(&self) -> &[Value] {
        match self {
            EntityKeyValue::Null => &[],
            EntityKeyValue::Simple(v) => std::slice::from_ref(v),
            EntityKeyValue::Composite(values) => values,
        }
    }
}

impl PartialEq for EntityKeyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EntityKeyValue::Null, EntityKeyValue::Null) => true,
            (EntityKeyValue::Simple(a), EntityKeyValue::Simple(b)) => a.key_eq(b),
            (EntityKeyValue::Composite(a), EntityKeyValue::Composite(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.key_eq(y))
            }
            _ => false,
        }
    }
}

impl Eq for EntityKeyValue {}

impl Hash for EntityKeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            EntityKeyValue::Null => 0u8.hash(state),
            EntityKeyValue::Simple(v) => {
                1u8.hash(state);
                v.hash_into(state);
            }
            EntityKeyValue::Composite(values) => {
                2u8.hash(state);
                values.len().hash(state);
                for v in values {
                    v.hash_into(state);
                }
            }
        }
    }
}

impl fmt::Display for EntityKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKeyValue::Null => write!(f, "<null key>"),
            EntityKeyValue::Simple(v) => write!(f, "{}", v),
            EntityKeyValue::Composite(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn composite_equality_is_structural() {
        let a = EntityKeyValue::from_values(vec![Value::Int(77), Value::from("X")]);
        let b = EntityKeyValue::from_values(vec![Value::Int(77), Value::from("X")]);
        let c = EntityKeyValue::from_values(vec![Value::Int(77), Value::from("Y")]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn simple_and_composite_do_not_collide() {
        let simple = EntityKeyValue::from_values(vec![Value::Int(1)]);
        assert!(matches!(simple, EntityKeyValue::Simple(Value::Int(1))));
        assert_ne!(simple, EntityKeyValue::Composite(vec![Value::Int(1)]));
    }

    #[test]
    fn any_null_component_yields_null_key() {
        let key = EntityKeyValue::from_values(vec![Value::Int(77), Value::Null]);
        assert!(key.is_null());
        assert_eq!(key, EntityKeyValue::Null);
        assert!(key.values().is_empty());
    }

    #[test]
    fn float_components_hash_consistently() {
        let a = EntityKeyValue::from_values(vec![Value::Double(f64::NAN)]);
        let b = EntityKeyValue::from_values(vec![Value::Double(f64::NAN)]);
        assert_eq!(a, b);
    }
}
