//! Creation of state entries from native instances or value buffers.

use std::any::Any;
use std::sync::Arc;

use relmodel_core::{EntityType, Error, NotFoundKind, Result, TypeError, Value};

use crate::config::ContextConfiguration;
use crate::state_entry::StateEntry;

/// Creates [`StateEntry`] values bound to one context configuration.
#[derive(Debug, Clone)]
pub struct StateEntryFactory {
    configuration: Arc<ContextConfiguration>,
}

impl StateEntryFactory {
    pub fn new(configuration: Arc<ContextConfiguration>) -> Self {
        Self { configuration }
    }

    pub fn configuration(&self) -> &Arc<ContextConfiguration> {
        &self.configuration
    }

    /// Wrap a native instance of `entity_type`'s backing type.
    pub fn create(
        &self,
        entity_type: &Arc<EntityType>,
        entity: Box<dyn Any + Send>,
    ) -> Result<StateEntry> {
        let Some(clr_type) = entity_type.clr_type() else {
            return Err(Error::Type(TypeError {
                expected: "entity type with a native backing type",
                actual: format!("shadow-only entity type '{}'", entity_type.name()),
                property: None,
            }));
        };
        if (*entity).type_id() != clr_type.type_id {
            return Err(Error::Type(TypeError {
                expected: clr_type.type_name,
                actual: format!("instance of another type for '{}'", entity_type.name()),
                property: None,
            }));
        }
        let mut entry = StateEntry::new(
            Arc::clone(&self.configuration),
            Arc::clone(entity_type),
            Some(entity),
        )?;
        entry.snapshot_originals_if_eager()?;
        tracing::trace!(entry = %entry.id(), entity_type = %entity_type.name(), "Created state entry");
        Ok(entry)
    }

    /// Wrap a native value, looking its entity type up in the model.
    pub fn create_for<T: Any + Send>(&self, entity: T) -> Result<StateEntry> {
        let entity_type = self
            .configuration
            .model()
            .entity_type_for::<T>()
            .ok_or_else(|| Error::not_found(NotFoundKind::EntityType, std::any::type_name::<T>()))?;
        self.create(&entity_type, Box::new(entity))
    }

    /// Materialize an entry from values in property declaration order.
    ///
    /// Native types are instantiated through the accessor registry; shadow
    /// only types keep the values in the entry.
    pub fn create_from_values(
        &self,
        entity_type: &Arc<EntityType>,
        values: Vec<Value>,
    ) -> Result<StateEntry> {
        let properties = entity_type.properties();
        if values.len() != properties.len() {
            return Err(Error::Type(TypeError {
                expected: "one value per property",
                actual: format!(
                    "{} values for {} properties of '{}'",
                    values.len(),
                    properties.len(),
                    entity_type.name()
                ),
                property: None,
            }));
        }
        let entity = match entity_type.clr_type() {
            Some(clr_type) => Some(self.configuration.accessors().create_instance(clr_type)?),
            None => None,
        };
        let mut entry = StateEntry::new(
            Arc::clone(&self.configuration),
            Arc::clone(entity_type),
            entity,
        )?;
        for (property, value) in properties.iter().zip(values) {
            entry.load_value(property, value)?;
        }
        entry.snapshot_originals_if_eager()?;
        tracing::trace!(entry = %entry.id(), entity_type = %entity_type.name(), "Materialized state entry");
        Ok(entry)
    }
}
