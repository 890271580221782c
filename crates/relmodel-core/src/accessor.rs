//! Property accessors for native entity types.
//!
//! Accessors are plain closures captured once when a type is registered and
//! cached by `(type, property name)`. Each call does one downcast.
//!
//! # Example
//!
//! ```
//! use relmodel_core::{AccessorRegistry, TypeAccessors, Value};
//!
//! #[derive(Default)]
//! struct Customer {
//!     id: i32,
//!     city: Option<String>,
//! }
//!
//! let registry = AccessorRegistry::new();
//! registry.register(
//!     TypeAccessors::<Customer>::with_default()
//!         .property("Id", |c| c.id.into(), |c, v| {
//!             c.id = v.try_into()?;
//!             Ok(())
//!         })
//!         .property("City", |c| c.city.clone().into(), |c, v| {
//!             c.city = v.try_into()?;
//!             Ok(())
//!         }),
//! );
//!
//! let accessor = registry
//!     .accessor(std::any::TypeId::of::<Customer>(), "City")
//!     .unwrap();
//! let mut customer = Customer::default();
//! accessor.set(&mut customer, Value::from("Berlin")).unwrap();
//! assert_eq!(customer.city.as_deref(), Some("Berlin"));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::ConcurrentCache;
use crate::entity::{ClrType, EntityType, Property};
use crate::error::{Error, NotFoundKind, Result, TypeError};
use crate::value::Value;

type GetFn = dyn Fn(&dyn Any) -> Result<Value> + Send + Sync;
type SetFn = dyn Fn(&mut dyn Any, Value) -> Result<()> + Send + Sync;
type FactoryFn = dyn Fn() -> Box<dyn Any + Send> + Send + Sync;

/// Getter and setter pair for one native property.
pub struct PropertyAccessor {
    owner: ClrType,
    name: String,
    getter: Box<GetFn>,
    setter: Box<SetFn>,
}

impl PropertyAccessor {
    pub fn owner(&self) -> ClrType {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the property from `instance`.
    pub fn get(&self, instance: &dyn Any) -> Result<Value> {
        (self.getter)(instance)
    }

    /// Write `value` into `instance`.
    pub fn set(&self, instance: &mut dyn Any, value: Value) -> Result<()> {
        (self.setter)(instance, value)
    }
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("owner", &self.owner.type_name)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn wrong_instance(owner: ClrType) -> Error {
    Error::Type(TypeError {
        expected: owner.type_name,
        actual: "instance of another native type".to_string(),
        property: None,
    })
}

/// Accessors for one native type, collected before registration.
pub struct TypeAccessors<T> {
    factory: Option<Arc<FactoryFn>>,
    properties: Vec<PropertyAccessor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send> TypeAccessors<T> {
    /// Accessors for a type that cannot be materialized from values.
    pub fn new() -> Self {
        Self {
            factory: None,
            properties: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a property getter/setter pair.
    #[must_use]
    pub fn property<G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        let owner = ClrType::of::<T>();
        self.properties.push(PropertyAccessor {
            owner,
            name: name.into(),
            getter: Box::new(move |instance: &dyn Any| {
                instance
                    .downcast_ref::<T>()
                    .map(&get)
                    .ok_or_else(|| wrong_instance(owner))
            }),
            setter: Box::new(move |instance: &mut dyn Any, value: Value| {
                let typed = instance
                    .downcast_mut::<T>()
                    .ok_or_else(|| wrong_instance(owner))?;
                set(typed, value)
            }),
        });
        self
    }
}

impl<T: Any + Send + Default> TypeAccessors<T> {
    /// Accessors for a type materialized through `T::default()`.
    pub fn with_default() -> Self {
        let mut accessors = Self::new();
        accessors.factory = Some(Arc::new(|| Box::new(T::default()) as Box<dyn Any + Send>));
        accessors
    }
}

impl<T: Any + Send> Default for TypeAccessors<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of native property accessors and instance factories.
#[derive(Default)]
pub struct AccessorRegistry {
    accessors: ConcurrentCache<(TypeId, String), Arc<PropertyAccessor>>,
    factories: ConcurrentCache<TypeId, Arc<FactoryFn>>,
}

impl fmt::Debug for AccessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorRegistry")
            .field("accessors", &self.accessors.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}

impl AccessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the accessors of one native type.
    ///
    /// A `(type, name)` pair that is already registered keeps its first
    /// accessor.
    pub fn register<T: Any + Send>(&self, accessors: TypeAccessors<T>) {
        let type_id = TypeId::of::<T>();
        if let Some(factory) = accessors.factory {
            self.factories.get_or_add(type_id, |_| factory);
        }
        for accessor in accessors.properties {
            let key = (type_id, accessor.name.clone());
            self.accessors.get_or_add(key, |_| Arc::new(accessor));
        }
        tracing::debug!(
            native_type = std::any::type_name::<T>(),
            total_accessors = self.accessors.len(),
            "Registered property accessors"
        );
    }

    pub fn accessor(&self, type_id: TypeId, name: &str) -> Option<Arc<PropertyAccessor>> {
        self.accessors.try_get(&(type_id, name.to_string()))
    }

    /// Accessor for a non-shadow property of a native-backed entity type.
    pub fn accessor_for(
        &self,
        entity_type: &EntityType,
        property: &Property,
    ) -> Result<Arc<PropertyAccessor>> {
        entity_type
            .clr_type()
            .and_then(|clr| self.accessor(clr.type_id, property.name()))
            .ok_or_else(|| {
                Error::not_found_in(NotFoundKind::Accessor, property.name(), entity_type.name())
            })
    }

    /// Create a default instance of a registered native type.
    pub fn create_instance(&self, clr_type: ClrType) -> Result<Box<dyn Any + Send>> {
        self.factories
            .try_get(&clr_type.type_id)
            .map(|factory| factory())
            .ok_or_else(|| Error::not_found(NotFoundKind::Accessor, clr_type.type_name))
    }
}
