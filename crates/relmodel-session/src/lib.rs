//! State entries, sidecars and change tracking for relmodel.
//!
//! `relmodel-session` is the **change-tracking layer**. Application code
//! mutates entities through a [`StateEntry`]; the entry records what
//! changed so a later save pass can turn it into store commands.
//!
//! # Role In The Architecture
//!
//! - **State entries**: current values, original values, modified flags and
//!   the relationship snapshot for one instance.
//! - **Sidecars**: named overlays for values not yet committed to the entity,
//!   such as store-generated keys during a save.
//! - **State manager**: the thread-safe registry of tracked entries.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use relmodel_core::{EntityType, Model, Property, Value};
//! use relmodel_session::{ContextConfiguration, ContextOptions, EntityState, StateEntryFactory};
//!
//! let mut customer = EntityType::new("Customer");
//! let id = customer.add_property(Property::typed::<i32>("Id")).unwrap();
//! let city = customer.add_property(Property::typed::<Option<String>>("City")).unwrap();
//! customer.set_key(vec![id]).unwrap();
//!
//! let mut model = Model::new();
//! let customer = model.add_entity_type(customer);
//! let configuration =
//!     ContextConfiguration::new(ContextOptions::new().use_model(Arc::new(model))).unwrap();
//!
//! let factory = StateEntryFactory::new(configuration);
//! let mut entry = factory
//!     .create_from_values(&customer, vec![Value::Int(1), Value::from("Berlin")])
//!     .unwrap();
//! entry.set_entity_state(EntityState::Unchanged).unwrap();
//!
//! entry.set(&city, Value::from("Paris")).unwrap();
//! assert_eq!(entry.state(), EntityState::Modified);
//! assert_eq!(entry.original_value(&city).unwrap(), Value::from("Berlin"));
//! ```

pub mod config;
pub mod factory;
pub mod sidecar;
pub mod state;
pub mod state_entry;
pub mod state_manager;
pub mod value_generation;

pub use config::{ContextConfiguration, ContextOptions};
pub use factory::StateEntryFactory;
pub use sidecar::{ORIGINAL_VALUES, STORE_GENERATED_VALUES, Sidecar};
pub use state::EntityState;
pub use state_entry::StateEntry;
pub use state_manager::{EntryId, StateManager, TrackedEntry};
pub use value_generation::{
    StringUuidGenerator, TemporaryIntegerGenerator, UuidGenerator, ValueGeneratorCache,
};
