//! The entity model and the metadata lookup capability.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::entity::{EntityType, EntityTypeId};
use crate::error::{Error, NotFoundKind, Result};

/// Supplies entity types by name or by native type.
pub trait MetadataProvider: Send + Sync {
    fn entity_type_by_name(&self, name: &str) -> Option<Arc<EntityType>>;

    fn entity_type_by_type(&self, type_id: TypeId) -> Option<Arc<EntityType>>;

    fn entity_type_by_id(&self, id: EntityTypeId) -> Option<Arc<EntityType>>;

    /// Strict lookup by name.
    fn get_entity_type(&self, name: &str) -> Result<Arc<EntityType>> {
        self.entity_type_by_name(name)
            .ok_or_else(|| Error::not_found(NotFoundKind::EntityType, name))
    }
}

/// A finished set of entity types.
#[derive(Debug, Default)]
pub struct Model {
    entity_types: Vec<Arc<EntityType>>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze `entity_type` and add it to the model.
    pub fn add_entity_type(&mut self, entity_type: EntityType) -> Arc<EntityType> {
        let entity_type = Arc::new(entity_type);
        tracing::debug!(
            entity_type = %entity_type.name(),
            properties = entity_type.properties().len(),
            foreign_keys = entity_type.foreign_keys().len(),
            "Added entity type to model"
        );
        self.entity_types.push(Arc::clone(&entity_type));
        entity_type
    }

    pub fn entity_types(&self) -> &[Arc<EntityType>] {
        &self.entity_types
    }

    /// Look up the entity type backed by `T`.
    pub fn entity_type_for<T: Any>(&self) -> Option<Arc<EntityType>> {
        self.entity_type_by_type(TypeId::of::<T>())
    }
}

impl MetadataProvider for Model {
    fn entity_type_by_name(&self, name: &str) -> Option<Arc<EntityType>> {
        self.entity_types
            .iter()
            .find(|et| et.name() == name)
            .cloned()
    }

    fn entity_type_by_type(&self, type_id: TypeId) -> Option<Arc<EntityType>> {
        self.entity_types
            .iter()
            .find(|et| et.clr_type().is_some_and(|clr| clr.type_id == type_id))
            .cloned()
    }

    fn entity_type_by_id(&self, id: EntityTypeId) -> Option<Arc<EntityType>> {
        self.entity_types.iter().find(|et| et.id() == id).cloned()
    }
}
