//! Client-side value generation for properties generated on add.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use relmodel_core::{
    ConcurrentCache, ConfigErrorKind, EntityType, EntityTypeId, Error, Property, Result, Value,
    ValueGenerator, ValueType,
};
use uuid::Uuid;

/// Hands out negative integers (-1, -2, ...) as placeholder keys until the
/// store assigns real ones.
#[derive(Debug)]
pub struct TemporaryIntegerGenerator {
    next: AtomicI64,
}

impl TemporaryIntegerGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(-1),
        }
    }
}

impl Default for TemporaryIntegerGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueGenerator for TemporaryIntegerGenerator {
    fn next(&self, property: &Property) -> Result<Value> {
        let value = self.next.fetch_sub(1, Ordering::Relaxed);
        property.value_type().coerce(Value::BigInt(value))
    }
}

/// Random version 4 UUIDs.
#[derive(Debug, Default)]
pub struct UuidGenerator;

impl ValueGenerator for UuidGenerator {
    fn next(&self, _property: &Property) -> Result<Value> {
        Ok(Value::Uuid(Uuid::new_v4().into_bytes()))
    }
}

/// Random version 4 UUIDs rendered as hyphenated text, for string keys.
#[derive(Debug, Default)]
pub struct StringUuidGenerator;

impl ValueGenerator for StringUuidGenerator {
    fn next(&self, _property: &Property) -> Result<Value> {
        Ok(Value::Text(Uuid::new_v4().hyphenated().to_string()))
    }
}

/// Picks and caches one generator per property.
///
/// Overrides registered by value type win over the built-in choice.
#[derive(Debug, Default)]
pub struct ValueGeneratorCache {
    overrides: Vec<(ValueType, Arc<dyn ValueGenerator>)>,
    cache: ConcurrentCache<(EntityTypeId, usize), Arc<dyn ValueGenerator>>,
}

impl ValueGeneratorCache {
    pub fn new(overrides: Vec<(ValueType, Arc<dyn ValueGenerator>)>) -> Self {
        Self {
            overrides,
            cache: ConcurrentCache::new(),
        }
    }

    /// The generator for `property`, created on first use.
    pub fn generator_for(
        &self,
        entity_type: &EntityType,
        property: &Property,
    ) -> Result<Arc<dyn ValueGenerator>> {
        let key = (entity_type.id(), property.index());
        if let Some(existing) = self.cache.try_get(&key) {
            return Ok(existing);
        }
        let generator = self.select(property).ok_or_else(|| {
            Error::config(
                ConfigErrorKind::MissingService,
                format!(
                    "no value generator for property '{}' of type {}",
                    property,
                    property.value_type().name()
                ),
            )
        })?;
        tracing::trace!(property = %property, "Created value generator");
        Ok(self.cache.get_or_add(key, |_| generator))
    }

    fn select(&self, property: &Property) -> Option<Arc<dyn ValueGenerator>> {
        let value_type = property.value_type();
        if let Some((_, generator)) = self.overrides.iter().find(|(t, _)| *t == value_type) {
            return Some(Arc::clone(generator));
        }
        match value_type {
            t if t.is_integer() => Some(Arc::new(TemporaryIntegerGenerator::new())),
            ValueType::Uuid => Some(Arc::new(UuidGenerator)),
            ValueType::Text => Some(Arc::new(StringUuidGenerator)),
            _ => None,
        }
    }
}
