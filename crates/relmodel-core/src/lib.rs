//! Core metadata, values and errors for relmodel.
//!
//! This crate provides the shared vocabulary of the runtime:
//!
//! - `EntityType`, `Property`, `Key` and `ForeignKey` metadata
//! - `Value` and `ValueType` for tracked values
//! - `EntityKeyValue` for structural key comparison
//! - `AccessorRegistry` for native field access
//! - the `MetadataProvider`, `StoreExecutor` and `ValueGenerator` capabilities

pub mod accessor;
pub mod cache;
pub mod entity;
pub mod error;
pub mod generation;
pub mod identifiers;
pub mod key_value;
pub mod model;
pub mod store;
pub mod types;
pub mod value;

pub use accessor::{AccessorRegistry, PropertyAccessor, TypeAccessors};
pub use cache::ConcurrentCache;
pub use entity::{
    ClrType, EntityType, EntityTypeId, ForeignKey, Key, Property, PropertyBuilder, StoreKeyRole,
    ValueGenerationOnAdd, ValueGenerationOnSave,
};
pub use error::{
    ConfigError, ConfigErrorKind, Error, NotFoundError, NotFoundKind, Result, StoreError,
    TranslationError, TypeError, UpdateError, UpdateErrorKind,
};
pub use generation::ValueGenerator;
pub use identifiers::{
    MigrationId, SchemaQualifiedName, delimit_identifier, delimit_identifier_mysql,
    generate_literal,
};
pub use key_value::EntityKeyValue;
pub use model::{MetadataProvider, Model};
pub use store::{Parameter, StoreExecutor, StoreResult};
pub use types::{ValueType, ValueTypeInfo};
pub use value::Value;
