//! Per-instance change tracking.
//!
//! A [`StateEntry`] wraps one entity instance (or, for types without a
//! native backing type, a buffer of shadow values) and tracks its lifecycle
//! state, per-property modified flags, original values, the relationship
//! snapshot and any attached [`Sidecar`]s.
//!
//! Reads and writes go through an explicit overlay check: attached sidecars
//! are consulted in attach order before primary storage is touched.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use relmodel_core::{
    EntityKeyValue, EntityType, Error, ForeignKey, NotFoundKind, Property, PropertyAccessor,
    Result, TypeError, Value, ValueGenerationOnAdd,
};

use crate::config::ContextConfiguration;
use crate::sidecar::{ORIGINAL_VALUES, STORE_GENERATED_VALUES, Sidecar};
use crate::state::EntityState;
use crate::state_manager::EntryId;

fn missing_instance(entity_type: &EntityType) -> Error {
    Error::Type(TypeError {
        expected: "native entity instance",
        actual: format!("no instance attached to '{}' entry", entity_type.name()),
        property: None,
    })
}

/// Tracks one entity instance.
///
/// An entry is owned by a single unit of work and has no internal locking.
pub struct StateEntry {
    id: EntryId,
    configuration: Arc<ContextConfiguration>,
    entity_type: Arc<EntityType>,
    entity: Option<Box<dyn Any + Send>>,
    shadow_values: Vec<Value>,
    accessors: Vec<Option<Arc<PropertyAccessor>>>,
    state: EntityState,
    modified: Vec<bool>,
    sidecars: Vec<Sidecar>,
    relationship_snapshot: HashMap<usize, Value>,
}

impl std::fmt::Debug for StateEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateEntry")
            .field("id", &self.id)
            .field("entity_type", &self.entity_type.name())
            .field("state", &self.state)
            .field("modified", &self.modified)
            .field(
                "sidecars",
                &self.sidecars.iter().map(Sidecar::name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl StateEntry {
    /// Build an entry. Accessors for native properties are resolved here so
    /// later reads and writes never look them up again.
    pub(crate) fn new(
        configuration: Arc<ContextConfiguration>,
        entity_type: Arc<EntityType>,
        entity: Option<Box<dyn Any + Send>>,
    ) -> Result<Self> {
        let properties = entity_type.properties();
        let mut accessors = Vec::with_capacity(properties.len());
        for property in properties {
            if property.is_shadow() {
                accessors.push(None);
            } else {
                accessors.push(Some(
                    configuration
                        .accessors()
                        .accessor_for(&entity_type, property)?,
                ));
            }
        }
        let shadow_values = properties
            .iter()
            .map(Property::default_value)
            .collect();
        let mut sidecars = Vec::new();
        if entity_type.has_clr_type() {
            sidecars.push(Sidecar::original_values(properties));
        }
        Ok(Self {
            id: EntryId::next(),
            modified: vec![false; properties.len()],
            configuration,
            entity,
            shadow_values,
            accessors,
            state: EntityState::Unknown,
            sidecars,
            relationship_snapshot: HashMap::new(),
            entity_type,
        })
    }

    /// Capture every original value when the entity type asks for eager
    /// capture. Called once the primary values are in place.
    pub(crate) fn snapshot_originals_if_eager(&mut self) -> Result<()> {
        if self.entity_type.use_lazy_original_values() {
            return Ok(());
        }
        let entity_type = Arc::clone(&self.entity_type);
        let mut originals = Sidecar::original_values(entity_type.properties());
        for property in entity_type.properties() {
            originals.set(property, self.read_primary(property)?)?;
        }
        self.attach_sidecar(originals);
        Ok(())
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn configuration(&self) -> &Arc<ContextConfiguration> {
        &self.configuration
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    /// The native instance, if it is a `T`.
    pub fn entity<T: Any>(&self) -> Option<&T> {
        self.entity.as_ref().and_then(|e| e.downcast_ref::<T>())
    }

    /// Mutable access to the native instance. Changes made this way are
    /// only noticed by [`StateEntry::detect_changes`].
    pub fn entity_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.entity.as_mut().and_then(|e| e.downcast_mut::<T>())
    }

    fn check_owned(&self, property: &Property) -> Result<()> {
        if self.entity_type.owns(property) {
            Ok(())
        } else {
            Err(Error::not_found_in(
                NotFoundKind::Property,
                property.name(),
                self.entity_type.name(),
            ))
        }
    }

    fn read_primary(&self, property: &Property) -> Result<Value> {
        let index = property.index();
        match (&self.accessors[index], &self.entity) {
            (None, _) => Ok(self.shadow_values[index].clone()),
            (Some(accessor), Some(entity)) => accessor.get(&**entity),
            (Some(_), None) => Err(missing_instance(&self.entity_type)),
        }
    }

    fn write_primary(&mut self, property: &Property, value: Value) -> Result<()> {
        let index = property.index();
        let Some(accessor) = &self.accessors[index] else {
            self.shadow_values[index] = value;
            return Ok(());
        };
        match &mut self.entity {
            Some(entity) => accessor.set(&mut **entity, value),
            None => Err(missing_instance(&self.entity_type)),
        }
    }

    /// Store a materialized value without any tracking side effects.
    pub(crate) fn load_value(&mut self, property: &Property, value: Value) -> Result<()> {
        let value = property.coerce(value)?;
        self.write_primary(property, value)
    }

    /// Current value of `property`, as seen through transparent sidecars.
    pub fn get(&self, property: &Property) -> Result<Value> {
        self.check_owned(property)?;
        for sidecar in &self.sidecars {
            if sidecar.transparent_read() {
                if let Some(value) = sidecar.try_get(property) {
                    return Ok(value.clone());
                }
            }
        }
        self.read_primary(property)
    }

    /// Current value of the property named `name`.
    pub fn get_by_name(&self, name: &str) -> Result<Value> {
        let property = self.entity_type.get_property(name)?.clone();
        self.get(&property)
    }

    /// Write `value` to `property`.
    ///
    /// The first transparent-write sidecar covering the property takes the
    /// value; otherwise it goes to primary storage, capturing the original
    /// value and marking the property modified when it actually changes.
    pub fn set(&mut self, property: &Property, value: Value) -> Result<()> {
        self.check_owned(property)?;
        let value = property.coerce(value)?;
        if let Some(sidecar) = self
            .sidecars
            .iter_mut()
            .find(|s| s.transparent_write() && s.can_store_value(property))
        {
            tracing::trace!(
                entry = %self.id,
                property = %property,
                sidecar = sidecar.name(),
                "Redirected write to sidecar"
            );
            return sidecar.set(property, value);
        }
        self.set_primary(property, value)
    }

    /// Write to the property named `name`.
    pub fn set_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        let property = self.entity_type.get_property(name)?.clone();
        self.set(&property, value)
    }

    fn set_primary(&mut self, property: &Property, value: Value) -> Result<()> {
        let current = self.read_primary(property)?;
        if current.key_eq(&value) {
            return Ok(());
        }
        self.capture_original(property, &current)?;
        if self.entity_type.is_relationship_property(property) {
            self.relationship_snapshot
                .insert(property.index(), value.clone());
        }
        if self.configuration.sensitive_data_logging() {
            tracing::trace!(entry = %self.id, property = %property, old = %current, new = %value, "Set property");
        } else {
            tracing::trace!(entry = %self.id, property = %property, "Set property");
        }
        self.write_primary(property, value)?;
        if matches!(self.state, EntityState::Unchanged | EntityState::Modified) {
            self.set_property_modified(property, true)?;
        }
        Ok(())
    }

    fn capture_original(&mut self, property: &Property, current: &Value) -> Result<()> {
        let originals = match self.sidecars.iter().position(|s| s.name() == ORIGINAL_VALUES) {
            Some(position) => &mut self.sidecars[position],
            None => self.attach_sidecar(Sidecar::original_values(self.entity_type.properties())),
        };
        if originals.has_value(property) {
            return Ok(());
        }
        originals.set(property, current.clone())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Move the entry to `new_state`.
    ///
    /// `Added` to `Deleted` collapses to `Unknown`. `Unknown` to `Added`
    /// generates values for properties generated on add that still hold
    /// their default. The state manager's tracked set follows the state.
    #[tracing::instrument(level = "debug", skip(self), fields(entry = %self.id, entity_type = %self.entity_type.name()))]
    pub fn set_entity_state(&mut self, new_state: EntityState) -> Result<()> {
        let old_state = self.state;
        let new_state = if old_state == EntityState::Added && new_state == EntityState::Deleted {
            EntityState::Unknown
        } else {
            new_state
        };
        if old_state == new_state {
            return Ok(());
        }

        if old_state == EntityState::Unknown && new_state == EntityState::Added {
            self.generate_values()?;
        }

        match new_state {
            EntityState::Modified => {
                for property in self.entity_type.properties() {
                    if !self.entity_type.is_key_property(property) {
                        self.modified[property.index()] = true;
                    }
                }
            }
            EntityState::Unchanged => self.modified.fill(false),
            _ => {}
        }

        self.transition(old_state, new_state);
        Ok(())
    }

    fn transition(&mut self, old_state: EntityState, new_state: EntityState) {
        self.state = new_state;
        let manager = self.configuration.state_manager();
        if !new_state.is_tracked() {
            manager.stop_tracking(self.id);
        } else if old_state.is_tracked() {
            manager.update_state(self.id, new_state);
        } else {
            manager.start_tracking(self.id, self.entity_type.name(), new_state);
        }
        tracing::debug!(entry = %self.id, from = %old_state, to = %new_state, "Entity state changed");
    }

    fn generate_values(&mut self) -> Result<()> {
        let entity_type = Arc::clone(&self.entity_type);
        for property in entity_type.properties() {
            if property.generation_on_add() != ValueGenerationOnAdd::Client {
                continue;
            }
            if !property.is_default_value(&self.get(property)?) {
                continue;
            }
            let generator = self
                .configuration
                .value_generators()
                .generator_for(&entity_type, property)?;
            let value = generator.next(property)?;
            tracing::trace!(entry = %self.id, property = %property, "Generated value on add");
            self.set(property, value)?;
        }
        Ok(())
    }

    pub fn is_property_modified(&self, property: &Property) -> Result<bool> {
        self.check_owned(property)?;
        Ok(self.modified[property.index()])
    }

    /// Mark or unmark `property` as modified.
    ///
    /// Marking any property (key properties included) on an `Unchanged`
    /// entry makes it `Modified`; clearing the last flag of a `Modified`
    /// entry makes it `Unchanged`.
    pub fn set_property_modified(&mut self, property: &Property, modified: bool) -> Result<()> {
        self.check_owned(property)?;
        self.modified[property.index()] = modified;
        if modified && self.state == EntityState::Unchanged {
            self.transition(EntityState::Unchanged, EntityState::Modified);
        } else if !modified
            && self.state == EntityState::Modified
            && !self.modified.iter().any(|m| *m)
        {
            self.transition(EntityState::Modified, EntityState::Unchanged);
        }
        Ok(())
    }

    /// Properties currently flagged as modified, in declaration order.
    pub fn modified_properties(&self) -> Vec<&Property> {
        self.entity_type
            .properties()
            .iter()
            .filter(|p| self.modified[p.index()])
            .collect()
    }

    /// Make the current values the new originals.
    ///
    /// `Modified` and `Added` become `Unchanged`; `Deleted` becomes
    /// `Unknown`; `Unchanged` and `Unknown` are left alone.
    pub fn accept_changes(&mut self) -> Result<()> {
        match self.state {
            EntityState::Unchanged | EntityState::Unknown => Ok(()),
            EntityState::Modified | EntityState::Added => {
                if let Some(originals) = self.try_get_sidecar_mut(ORIGINAL_VALUES) {
                    originals.clear();
                }
                self.snapshot_originals_if_eager()?;
                let entity_type = Arc::clone(&self.entity_type);
                for property in entity_type.properties() {
                    if entity_type.is_relationship_property(property) {
                        let current = self.read_primary(property)?;
                        self.relationship_snapshot.insert(property.index(), current);
                    }
                }
                self.set_entity_state(EntityState::Unchanged)
            }
            EntityState::Deleted => self.set_entity_state(EntityState::Unknown),
        }
    }

    /// Compare native values against captured originals and mark every
    /// property that changed behind the entry's back. Returns whether any
    /// change was found.
    pub fn detect_changes(&mut self) -> Result<bool> {
        if !matches!(self.state, EntityState::Unchanged | EntityState::Modified) {
            return Ok(false);
        }
        let entity_type = Arc::clone(&self.entity_type);
        let mut changed = false;
        for property in entity_type.properties() {
            let current = self.read_primary(property)?;
            let original = self
                .try_get_sidecar(ORIGINAL_VALUES)
                .and_then(|s| s.try_get(property))
                .cloned();
            if let Some(original) = original {
                if !original.key_eq(&current) && !self.modified[property.index()] {
                    self.set_property_modified(property, true)?;
                    changed = true;
                }
            }
            if entity_type.is_relationship_property(property) {
                let snapshot = self.relationship_snapshot.get(&property.index());
                if snapshot.is_some_and(|s| !s.key_eq(&current)) {
                    self.relationship_snapshot.insert(property.index(), current);
                    changed = true;
                }
            }
        }
        tracing::debug!(entry = %self.id, changed, "Detected changes");
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Original values and the relationship snapshot
    // ------------------------------------------------------------------

    /// The original value of `property`; the current value if none was
    /// captured.
    pub fn original_value(&self, property: &Property) -> Result<Value> {
        self.check_owned(property)?;
        match self
            .try_get_sidecar(ORIGINAL_VALUES)
            .and_then(|s| s.try_get(property))
        {
            Some(value) => Ok(value.clone()),
            None => self.read_primary(property),
        }
    }

    /// Overwrite the original value of `property`. Current values are not
    /// touched.
    pub fn set_original_value(&mut self, property: &Property, value: Value) -> Result<()> {
        self.check_owned(property)?;
        let value = property.coerce(value)?;
        if self.try_get_sidecar(ORIGINAL_VALUES).is_none() {
            self.attach_sidecar(Sidecar::original_values(self.entity_type.properties()));
        }
        self.sidecar_mut(ORIGINAL_VALUES)?.set(property, value)
    }

    /// The last observed value of a relationship property; the current
    /// value if it was never snapshotted.
    pub fn relationship_snapshot_value(&self, property: &Property) -> Result<Value> {
        self.check_owned(property)?;
        match self.relationship_snapshot.get(&property.index()) {
            Some(value) => Ok(value.clone()),
            None => self.read_primary(property),
        }
    }

    pub fn set_relationship_snapshot_value(
        &mut self,
        property: &Property,
        value: Value,
    ) -> Result<()> {
        self.check_owned(property)?;
        let value = property.coerce(value)?;
        self.relationship_snapshot.insert(property.index(), value);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// The primary key built from current values.
    pub fn primary_key_value(&self) -> Result<EntityKeyValue> {
        let key = self.entity_type.get_key()?;
        self.key_value(key.properties(), Self::get)
    }

    /// The foreign key built from current values of its dependent
    /// properties on this entry.
    pub fn dependent_key_value(&self, foreign_key: &ForeignKey) -> Result<EntityKeyValue> {
        self.key_value(foreign_key.dependent_properties(), Self::get)
    }

    /// The foreign key built from relationship snapshot values.
    pub fn dependent_key_snapshot(&self, foreign_key: &ForeignKey) -> Result<EntityKeyValue> {
        self.key_value(
            foreign_key.dependent_properties(),
            Self::relationship_snapshot_value,
        )
    }

    /// The principal key referenced by `foreign_key`, read from this entry
    /// as the principal side.
    pub fn principal_key_value(&self, foreign_key: &ForeignKey) -> Result<EntityKeyValue> {
        self.key_value(foreign_key.principal_key().properties(), Self::get)
    }

    fn key_value(
        &self,
        properties: &[Property],
        read: fn(&Self, &Property) -> Result<Value>,
    ) -> Result<EntityKeyValue> {
        let values = properties
            .iter()
            .map(|p| read(self, p))
            .collect::<Result<Vec<_>>>()?;
        Ok(EntityKeyValue::from_values(values))
    }

    /// Current values of every property in declaration order.
    pub fn get_value_buffer(&self) -> Result<Vec<Value>> {
        self.entity_type
            .properties()
            .iter()
            .map(|p| self.get(p))
            .collect()
    }

    // ------------------------------------------------------------------
    // Sidecars
    // ------------------------------------------------------------------

    /// Attach `sidecar`, replacing one with the same name in place.
    ///
    /// Every covered property must belong to this entry's entity type.
    pub fn add_sidecar(&mut self, sidecar: Sidecar) -> Result<&mut Sidecar> {
        for property in sidecar.covered_properties() {
            self.check_owned(property)?;
        }
        Ok(self.attach_sidecar(sidecar))
    }

    fn attach_sidecar(&mut self, sidecar: Sidecar) -> &mut Sidecar {
        let position = match self.sidecars.iter().position(|s| s.name() == sidecar.name()) {
            Some(position) => {
                self.sidecars[position] = sidecar;
                position
            }
            None => {
                self.sidecars.push(sidecar);
                self.sidecars.len() - 1
            }
        };
        tracing::trace!(entry = %self.id, sidecar = self.sidecars[position].name(), "Attached sidecar");
        &mut self.sidecars[position]
    }

    /// Detach the sidecar named `name`. Missing names are ignored.
    pub fn remove_sidecar(&mut self, name: &str) -> Option<Sidecar> {
        let position = self.sidecars.iter().position(|s| s.name() == name)?;
        Some(self.sidecars.remove(position))
    }

    pub fn try_get_sidecar(&self, name: &str) -> Option<&Sidecar> {
        self.sidecars.iter().find(|s| s.name() == name)
    }

    pub fn try_get_sidecar_mut(&mut self, name: &str) -> Option<&mut Sidecar> {
        self.sidecars.iter_mut().find(|s| s.name() == name)
    }

    /// Strict sidecar lookup.
    pub fn sidecar(&self, name: &str) -> Result<&Sidecar> {
        self.try_get_sidecar(name)
            .ok_or_else(|| Error::not_found_in(NotFoundKind::Sidecar, name, self.entity_type.name()))
    }

    pub fn sidecar_mut(&mut self, name: &str) -> Result<&mut Sidecar> {
        let owner = self.entity_type.name().to_string();
        self.try_get_sidecar_mut(name)
            .ok_or_else(|| Error::not_found_in(NotFoundKind::Sidecar, name, owner))
    }

    /// Attached sidecars in attach order.
    pub fn sidecars(&self) -> &[Sidecar] {
        &self.sidecars
    }

    /// Read `property` from the named sidecar, falling back to the entry
    /// when the sidecar holds no value for it.
    pub fn sidecar_value(&self, name: &str, property: &Property) -> Result<Value> {
        self.check_owned(property)?;
        match self.sidecar(name)?.try_get(property) {
            Some(value) => Ok(value.clone()),
            None => self.read_primary(property),
        }
    }

    /// Write `property` into the named sidecar.
    pub fn set_sidecar_value(&mut self, name: &str, property: &Property, value: Value) -> Result<()> {
        self.check_owned(property)?;
        let value = property.coerce(value)?;
        self.sidecar_mut(name)?.set(property, value)
    }

    /// Attach a store-generated-values sidecar covering every property the
    /// store may generate on insert.
    pub fn prepare_to_save(&mut self) -> &mut Sidecar {
        let generated: Vec<Property> = self
            .entity_type
            .properties()
            .iter()
            .filter(|p| p.generation_on_save().on_insert())
            .cloned()
            .collect();
        self.attach_sidecar(Sidecar::store_generated_values(&generated))
    }

    /// Copy the values of every auto-commit sidecar into primary storage,
    /// then detach those sidecars.
    pub fn auto_commit_sidecars(&mut self) -> Result<()> {
        let (committing, kept): (Vec<Sidecar>, Vec<Sidecar>) = std::mem::take(&mut self.sidecars)
            .into_iter()
            .partition(Sidecar::auto_commit);
        self.sidecars = kept;
        for sidecar in committing {
            for (property, value) in sidecar.stored_values() {
                self.write_primary(property, value.clone())?;
                if self.entity_type.is_relationship_property(property) {
                    self.relationship_snapshot
                        .insert(property.index(), value.clone());
                }
            }
            tracing::trace!(entry = %self.id, sidecar = sidecar.name(), "Committed sidecar");
        }
        Ok(())
    }

    /// Discard every auto-commit sidecar without touching primary storage.
    pub fn auto_rollback_sidecars(&mut self) {
        let before = self.sidecars.len();
        self.sidecars.retain(|s| !s.auto_commit());
        if before != self.sidecars.len() {
            tracing::trace!(entry = %self.id, discarded = before - self.sidecars.len(), "Rolled back sidecars");
        }
    }

    /// Whether a store-generated-values sidecar is attached.
    pub fn is_prepared_to_save(&self) -> bool {
        self.try_get_sidecar(STORE_GENERATED_VALUES).is_some()
    }
}
