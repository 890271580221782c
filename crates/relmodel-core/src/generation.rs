//! The value generation capability.

use std::fmt::Debug;

use crate::entity::Property;
use crate::value::Value;
use crate::Result;

/// Produces values for properties generated on add.
///
/// Returned values must be assignable to the property's declared type.
pub trait ValueGenerator: Send + Sync + Debug {
    fn next(&self, property: &Property) -> Result<Value>;
}
