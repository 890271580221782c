//! Named value overlays attached to a state entry.
//!
//! A sidecar covers a fixed subset of an entity type's properties and holds
//! at most one value per covered property. Its three flags decide how the
//! owning [`crate::StateEntry`] routes reads, writes and commits:
//!
//! | flag                | effect                                                        |
//! |---------------------|---------------------------------------------------------------|
//! | `transparent_read`  | entry reads return the sidecar value when one is stored       |
//! | `transparent_write` | entry writes to covered properties land in the sidecar        |
//! | `auto_commit`       | values are copied into the entry by `auto_commit_sidecars`    |

use std::collections::HashMap;

use relmodel_core::{Error, NotFoundKind, Property, Result, Value};

/// Name of the sidecar holding captured original values.
pub const ORIGINAL_VALUES: &str = "OriginalValues";

/// Name of the sidecar receiving store-generated values during a save.
pub const STORE_GENERATED_VALUES: &str = "StoreGeneratedValues";

/// A named partial overlay of property values.
#[derive(Debug, Clone)]
pub struct Sidecar {
    name: String,
    covered: Vec<Property>,
    values: HashMap<usize, Value>,
    transparent_read: bool,
    transparent_write: bool,
    auto_commit: bool,
}

impl Sidecar {
    /// Create an opaque sidecar covering `properties`.
    pub fn new(name: impl Into<String>, properties: &[Property]) -> Self {
        Self {
            name: name.into(),
            covered: properties.to_vec(),
            values: HashMap::new(),
            transparent_read: false,
            transparent_write: false,
            auto_commit: false,
        }
    }

    /// The original-values sidecar for an entry over `properties`.
    pub fn original_values(properties: &[Property]) -> Self {
        Self::new(ORIGINAL_VALUES, properties)
    }

    /// The store-generated-values sidecar: reads and writes pass through it
    /// and its values are committed once the save succeeds.
    pub fn store_generated_values(properties: &[Property]) -> Self {
        Self::new(STORE_GENERATED_VALUES, properties)
            .with_transparent_read(true)
            .with_transparent_write(true)
            .with_auto_commit(true)
    }

    #[must_use]
    pub fn with_transparent_read(mut self, enabled: bool) -> Self {
        self.transparent_read = enabled;
        self
    }

    #[must_use]
    pub fn with_transparent_write(mut self, enabled: bool) -> Self {
        self.transparent_write = enabled;
        self
    }

    #[must_use]
    pub fn with_auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transparent_read(&self) -> bool {
        self.transparent_read
    }

    pub fn transparent_write(&self) -> bool {
        self.transparent_write
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    pub fn covered_properties(&self) -> &[Property] {
        &self.covered
    }

    /// Check whether `property` is in the covered subset.
    pub fn can_store_value(&self, property: &Property) -> bool {
        self.covered.contains(property)
    }

    pub fn has_value(&self, property: &Property) -> bool {
        self.can_store_value(property) && self.values.contains_key(&property.index())
    }

    /// The stored value for `property`, if any.
    pub fn try_get(&self, property: &Property) -> Option<&Value> {
        if !self.can_store_value(property) {
            return None;
        }
        self.values.get(&property.index())
    }

    /// Store `value` for a covered property.
    pub fn set(&mut self, property: &Property, value: Value) -> Result<()> {
        if !self.can_store_value(property) {
            return Err(Error::not_found_in(
                NotFoundKind::Property,
                property.name(),
                format!("sidecar '{}'", self.name),
            ));
        }
        self.values.insert(property.index(), value);
        Ok(())
    }

    /// Forget the stored value for `property`.
    pub fn remove_value(&mut self, property: &Property) -> Option<Value> {
        if !self.can_store_value(property) {
            return None;
        }
        self.values.remove(&property.index())
    }

    /// Forget every stored value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored values in covered-property order.
    pub fn stored_values(&self) -> impl Iterator<Item = (&Property, &Value)> {
        self.covered
            .iter()
            .filter_map(|p| self.values.get(&p.index()).map(|v| (p, v)))
    }
}
