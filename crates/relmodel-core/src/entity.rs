//! Entity metadata: entity types, properties, keys and foreign keys.
//!
//! Metadata is assembled once through the `&mut self` builders on
//! [`EntityType`], then frozen behind an `Arc` by [`crate::Model`] and
//! shared read-only by every state entry and query compilation.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ConfigErrorKind, Error, NotFoundKind, Result, TypeError};
use crate::identifiers::SchemaQualifiedName;
use crate::types::{ValueType, ValueTypeInfo};
use crate::value::Value;

static NEXT_ENTITY_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one constructed [`EntityType`] instance.
///
/// Two entity types with the same name built separately get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityTypeId(u64);

impl EntityTypeId {
    fn next() -> Self {
        Self(NEXT_ENTITY_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The native Rust type backing an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClrType {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl ClrType {
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// When a client-side value is generated for a newly added entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueGenerationOnAdd {
    #[default]
    None,
    /// Generate a value on the client when the entity becomes `Added`.
    Client,
}

/// When the store generates a value that must be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueGenerationOnSave {
    #[default]
    None,
    WhenInserting,
    WhenInsertingAndUpdating,
}

impl ValueGenerationOnSave {
    pub const fn on_insert(self) -> bool {
        !matches!(self, ValueGenerationOnSave::None)
    }

    pub const fn on_update(self) -> bool {
        matches!(self, ValueGenerationOnSave::WhenInsertingAndUpdating)
    }
}

/// Key-identifying column role in a keyed (partition/row) store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKeyRole {
    PartitionKey,
    RowKey,
}

/// A property declared on an entity type.
///
/// Equality is identity: same owning entity type instance, same ordinal.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    value_type: ValueType,
    nullable: bool,
    index: usize,
    declaring_type: EntityTypeId,
    declaring_type_name: String,
    is_shadow: bool,
    is_concurrency_token: bool,
    generation_on_add: ValueGenerationOnAdd,
    generation_on_save: ValueGenerationOnSave,
    column_name: Option<String>,
    store_key: Option<StoreKeyRole>,
}

impl Property {
    /// Start declaring a property of the given type.
    pub fn builder(name: impl Into<String>, value_type: ValueType) -> PropertyBuilder {
        PropertyBuilder {
            name: name.into(),
            value_type,
            nullable: false,
            shadow: false,
            concurrency_token: false,
            generation_on_add: ValueGenerationOnAdd::None,
            generation_on_save: ValueGenerationOnSave::None,
            column_name: None,
            store_key: None,
        }
    }

    /// Start declaring a property whose type and nullability follow `T`.
    pub fn typed<T: ValueTypeInfo>(name: impl Into<String>) -> PropertyBuilder {
        Self::builder(name, T::VALUE_TYPE).nullable(T::NULLABLE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Ordinal of this property within its entity type.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn declaring_type(&self) -> EntityTypeId {
        self.declaring_type
    }

    pub fn declaring_type_name(&self) -> &str {
        &self.declaring_type_name
    }

    /// Shadow properties have no native field; their value lives in the entry.
    pub fn is_shadow(&self) -> bool {
        self.is_shadow
    }

    pub fn is_concurrency_token(&self) -> bool {
        self.is_concurrency_token
    }

    pub fn generation_on_add(&self) -> ValueGenerationOnAdd {
        self.generation_on_add
    }

    pub fn generation_on_save(&self) -> ValueGenerationOnSave {
        self.generation_on_save
    }

    /// Store column name; defaults to the property name.
    pub fn column_name(&self) -> &str {
        self.column_name.as_deref().unwrap_or(&self.name)
    }

    pub fn store_key(&self) -> Option<StoreKeyRole> {
        self.store_key
    }

    /// The value a freshly constructed native instance holds for this
    /// property: null when nullable, otherwise the type's zero value, with
    /// empty text and empty bytes for reference-like types.
    pub fn default_value(&self) -> Value {
        if self.nullable {
            return Value::Null;
        }
        match self.value_type {
            ValueType::Text => Value::Text(String::new()),
            ValueType::Bytes => Value::Bytes(Vec::new()),
            ValueType::Json => Value::Json(serde_json::Value::Null),
            other => other.default_value(),
        }
    }

    /// Check whether `value` is the default for this property. Null always is.
    pub fn is_default_value(&self, value: &Value) -> bool {
        value.is_null() || value.key_eq(&self.default_value())
    }

    /// Coerce `value` to this property's declared type, rejecting null for
    /// non-nullable properties.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        if value.is_null() && !self.nullable && !self.is_shadow {
            return Err(Error::Type(TypeError {
                expected: self.value_type.name(),
                actual: "NULL".to_string(),
                property: Some(self.name.clone()),
            }));
        }
        self.value_type.coerce(value).map_err(|err| match err {
            Error::Type(mut t) => {
                t.property = Some(self.name.clone());
                Error::Type(t)
            }
            other => other,
        })
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type && self.index == other.index
    }
}

impl Eq for Property {}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type_name, self.name)
    }
}

/// Builder for a [`Property`]; finished by [`EntityType::add_property`].
#[derive(Debug, Clone)]
pub struct PropertyBuilder {
    name: String,
    value_type: ValueType,
    nullable: bool,
    shadow: bool,
    concurrency_token: bool,
    generation_on_add: ValueGenerationOnAdd,
    generation_on_save: ValueGenerationOnSave,
    column_name: Option<String>,
    store_key: Option<StoreKeyRole>,
}

impl PropertyBuilder {
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub fn shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    #[must_use]
    pub fn concurrency_token(mut self) -> Self {
        self.concurrency_token = true;
        self
    }

    #[must_use]
    pub fn generate_on_add(mut self, generation: ValueGenerationOnAdd) -> Self {
        self.generation_on_add = generation;
        self
    }

    #[must_use]
    pub fn generate_on_save(mut self, generation: ValueGenerationOnSave) -> Self {
        self.generation_on_save = generation;
        self
    }

    #[must_use]
    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    #[must_use]
    pub fn store_key(mut self, role: StoreKeyRole) -> Self {
        self.store_key = Some(role);
        self
    }
}

/// An ordered, non-empty set of properties from one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    properties: Vec<Property>,
}

impl Key {
    /// Build a key. Fails if `properties` is empty or spans more than one
    /// entity type instance.
    pub fn new(properties: Vec<Property>) -> Result<Self> {
        let Some(first) = properties.first() else {
            return Err(Error::config(
                ConfigErrorKind::EmptyArgument,
                "a key requires at least one property",
            ));
        };
        let owner = first.declaring_type();
        if let Some(stranger) = properties.iter().find(|p| p.declaring_type() != owner) {
            return Err(Error::config(
                ConfigErrorKind::InconsistentEntityType,
                format!(
                    "property '{}' does not belong to the same entity type instance as '{}'",
                    stranger,
                    first
                ),
            ));
        }
        Ok(Self { properties })
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn declaring_type(&self) -> EntityTypeId {
        self.properties[0].declaring_type()
    }

    pub fn declaring_type_name(&self) -> &str {
        self.properties[0].declaring_type_name()
    }

    pub fn is_composite(&self) -> bool {
        self.properties.len() > 1
    }

    pub fn contains(&self, property: &Property) -> bool {
        self.properties.contains(property)
    }
}

/// Dependent properties referencing a principal key, matched by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    principal_key: Key,
    dependent_properties: Vec<Property>,
}

impl ForeignKey {
    pub fn new(principal_key: Key, dependent_properties: Vec<Property>) -> Result<Self> {
        let dependent = Key::new(dependent_properties)?;
        if dependent.properties.len() != principal_key.properties.len() {
            return Err(Error::config(
                ConfigErrorKind::KeyArityMismatch,
                format!(
                    "foreign key has {} properties but the principal key on '{}' has {}",
                    dependent.properties.len(),
                    principal_key.declaring_type_name(),
                    principal_key.properties.len()
                ),
            ));
        }
        Ok(Self {
            principal_key,
            dependent_properties: dependent.properties,
        })
    }

    pub fn principal_key(&self) -> &Key {
        &self.principal_key
    }

    pub fn principal_type(&self) -> EntityTypeId {
        self.principal_key.declaring_type()
    }

    pub fn dependent_properties(&self) -> &[Property] {
        &self.dependent_properties
    }

    pub fn declaring_type(&self) -> EntityTypeId {
        self.dependent_properties[0].declaring_type()
    }
}

/// Describes one kind of entity: its properties, key and foreign keys.
#[derive(Debug)]
pub struct EntityType {
    id: EntityTypeId,
    name: String,
    clr_type: Option<ClrType>,
    table_name: Option<String>,
    schema: Option<String>,
    properties: Vec<Property>,
    key: Option<Key>,
    foreign_keys: Vec<ForeignKey>,
    use_lazy_original_values: bool,
}

impl EntityType {
    /// Create an entity type with no native backing type. All of its
    /// properties are shadow properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityTypeId::next(),
            name: name.into(),
            clr_type: None,
            table_name: None,
            schema: None,
            properties: Vec::new(),
            key: None,
            foreign_keys: Vec::new(),
            use_lazy_original_values: true,
        }
    }

    /// Create an entity type backed by the native type `T`.
    pub fn for_type<T: Any>(name: impl Into<String>) -> Self {
        let mut entity_type = Self::new(name);
        entity_type.clr_type = Some(ClrType::of::<T>());
        entity_type
    }

    pub fn id(&self) -> EntityTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clr_type(&self) -> Option<ClrType> {
        self.clr_type
    }

    pub fn has_clr_type(&self) -> bool {
        self.clr_type.is_some()
    }

    /// Store table name; defaults to the entity name.
    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Table name qualified by the schema, when one is set.
    pub fn qualified_table_name(&self) -> SchemaQualifiedName {
        match self.schema() {
            Some(schema) => SchemaQualifiedName::with_schema(schema, self.table_name()),
            None => SchemaQualifiedName::new(self.table_name()),
        }
    }

    pub fn set_table_name(&mut self, table_name: impl Into<String>) -> &mut Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn set_schema(&mut self, schema: impl Into<String>) -> &mut Self {
        self.schema = Some(schema.into());
        self
    }

    /// Whether original values are captured on first write (`true`) or
    /// for every property as soon as an entry is created (`false`).
    pub fn use_lazy_original_values(&self) -> bool {
        self.use_lazy_original_values
    }

    pub fn set_use_lazy_original_values(&mut self, lazy: bool) -> &mut Self {
        self.use_lazy_original_values = lazy;
        self
    }

    /// Declare a property. Returns the finished property for use in keys.
    pub fn add_property(&mut self, builder: PropertyBuilder) -> Result<Property> {
        if builder.name.is_empty() {
            return Err(Error::config(
                ConfigErrorKind::EmptyArgument,
                format!("property name on '{}' must not be empty", self.name),
            ));
        }
        if self.property(&builder.name).is_some() {
            return Err(Error::config(
                ConfigErrorKind::DuplicateProperty,
                format!("'{}' already declares property '{}'", self.name, builder.name),
            ));
        }
        let property = Property {
            name: builder.name,
            value_type: builder.value_type,
            nullable: builder.nullable,
            index: self.properties.len(),
            declaring_type: self.id,
            declaring_type_name: self.name.clone(),
            is_shadow: builder.shadow || self.clr_type.is_none(),
            is_concurrency_token: builder.concurrency_token,
            generation_on_add: builder.generation_on_add,
            generation_on_save: builder.generation_on_save,
            column_name: builder.column_name,
            store_key: builder.store_key,
        };
        tracing::trace!(
            entity_type = %self.name,
            property = %property.name,
            index = property.index,
            shadow = property.is_shadow,
            "Declared property"
        );
        self.properties.push(property.clone());
        Ok(property)
    }

    /// Set the primary key.
    pub fn set_key(&mut self, properties: Vec<Property>) -> Result<&Key> {
        let key = Key::new(properties)?;
        if key.declaring_type() != self.id {
            return Err(Error::config(
                ConfigErrorKind::InconsistentEntityType,
                format!(
                    "key properties belong to '{}', not to this '{}' instance",
                    key.declaring_type_name(),
                    self.name
                ),
            ));
        }
        Ok(&*self.key.insert(key))
    }

    /// Add a foreign key from `dependent_properties` on this type to
    /// `principal_key`.
    pub fn add_foreign_key(
        &mut self,
        principal_key: &Key,
        dependent_properties: Vec<Property>,
    ) -> Result<&ForeignKey> {
        let foreign_key = ForeignKey::new(principal_key.clone(), dependent_properties)?;
        if foreign_key.declaring_type() != self.id {
            return Err(Error::config(
                ConfigErrorKind::InconsistentEntityType,
                format!(
                    "foreign key properties do not belong to this '{}' instance",
                    self.name
                ),
            ));
        }
        self.foreign_keys.push(foreign_key);
        Ok(&self.foreign_keys[self.foreign_keys.len() - 1])
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Strict property lookup.
    pub fn get_property(&self, name: &str) -> Result<&Property> {
        self.property(name)
            .ok_or_else(|| Error::not_found_in(NotFoundKind::Property, name, &self.name))
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Strict primary key lookup.
    pub fn get_key(&self) -> Result<&Key> {
        self.key
            .as_ref()
            .ok_or_else(|| Error::not_found_in(NotFoundKind::Key, "primary key", &self.name))
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Check whether `property` was declared on this instance.
    pub fn owns(&self, property: &Property) -> bool {
        property.declaring_type == self.id && property.index < self.properties.len()
    }

    /// Check whether `property` is part of the primary key.
    pub fn is_key_property(&self, property: &Property) -> bool {
        self.key.as_ref().is_some_and(|k| k.contains(property))
    }

    /// Check whether `property` takes part in the primary key or any
    /// foreign key; such properties are tracked in the relationship snapshot.
    pub fn is_relationship_property(&self, property: &Property) -> bool {
        self.is_key_property(property)
            || self
                .foreign_keys
                .iter()
                .any(|fk| fk.dependent_properties.contains(property))
    }

    /// Distinct principal entity types this type depends on.
    pub fn principal_types(&self) -> Vec<EntityTypeId> {
        let mut principals: Vec<EntityTypeId> = self
            .foreign_keys
            .iter()
            .map(ForeignKey::principal_type)
            .filter(|id| *id != self.id)
            .collect();
        principals.sort();
        principals.dedup();
        principals
    }
}
