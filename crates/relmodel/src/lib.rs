//! relmodel - change tracking and query translation for relational object
//! mapping.
//!
//! relmodel keeps per-instance state for application entities, turns their
//! changes into parameterized INSERT, UPDATE and DELETE commands, and
//! translates query filters into store predicates:
//!
//! - Entity metadata built once and shared read-only
//! - State entries with original values, modification flags and sidecars
//! - Store-generated values read back and committed only when a save succeeds
//! - Filter translation that pushes what the store can evaluate into the
//!   per-source select and leaves the rest to the client
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use relmodel::prelude::*;
//!
//! let mut blog = EntityType::new("Blog");
//! let id = blog.add_property(Property::typed::<i64>("Id")).unwrap();
//! blog.set_key(vec![id]).unwrap();
//! blog.add_property(Property::typed::<Option<String>>("Name")).unwrap();
//!
//! let mut model = Model::new();
//! let blog = model.add_entity_type(blog);
//! let configuration =
//!     ContextConfiguration::new(ContextOptions::new().use_model(Arc::new(model))).unwrap();
//! let factory = StateEntryFactory::new(configuration);
//!
//! let mut entry = factory
//!     .create_from_values(&blog, vec![Value::BigInt(1), Value::from("Old")])
//!     .unwrap();
//! entry.set_entity_state(EntityState::Unchanged).unwrap();
//! entry.set_by_name("Name", Value::from("New")).unwrap();
//! assert_eq!(entry.state(), EntityState::Modified);
//!
//! let plan = SaveChanges::new(&SqliteSqlGenerator).plan(&[entry]).unwrap();
//! let sql = plan.updates[0].to_sql(&SqliteSqlGenerator).unwrap();
//! assert_eq!(
//!     sql,
//!     "UPDATE \"Blog\" SET \"Name\" = @p1\nWHERE \"Id\" = @p0;\nSELECT changes();\n"
//! );
//! ```

pub use relmodel_core::{
    AccessorRegistry, ClrType, ConfigError, ConfigErrorKind, EntityKeyValue, EntityType,
    EntityTypeId, Error, ForeignKey, Key, MetadataProvider, MigrationId, Model, NotFoundError,
    NotFoundKind, Parameter, Property, PropertyAccessor, PropertyBuilder, Result,
    SchemaQualifiedName, StoreError, StoreExecutor, StoreKeyRole, StoreResult, TranslationError,
    TypeAccessors, TypeError, UpdateError, UpdateErrorKind, Value, ValueGenerationOnAdd,
    ValueGenerationOnSave, ValueGenerator, ValueType, delimit_identifier, generate_literal,
};
pub use relmodel_query::{
    BodyClause, ComparisonOp, ConstantValue, Expression, FilteringTranslator, ItemType,
    PredicateExpr, QueryCompilationContext, QueryModel, QuerySource, QuerySourceId,
    QueryableConstant, SelectExpression, Selector, TableFilterGenerator,
};
pub use relmodel_relational::{
    ColumnModification, ColumnRoles, Dialect, FlushOrderer, FlushPlan, ModificationCommand,
    ModificationOperation, MysqlSqlGenerator, ParameterNameGenerator, SaveChanges, SaveResult,
    SelectSqlGenerator, SqlGenerator, SqliteSqlGenerator, generator_for_dialect,
};
pub use relmodel_session::{
    ContextConfiguration, ContextOptions, EntityState, EntryId, ORIGINAL_VALUES,
    STORE_GENERATED_VALUES, Sidecar, StateEntry, StateEntryFactory, StateManager,
};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::{
        // Metadata
        AccessorRegistry,
        // Configuration
        ContextConfiguration,
        ContextOptions,
        EntityState,
        EntityType,
        Error,
        // Queries
        Expression,
        Model,
        Property,
        QueryCompilationContext,
        QueryModel,
        QuerySource,
        Result,
        // Persistence
        SaveChanges,
        Selector,
        SelectSqlGenerator,
        SqlGenerator,
        SqliteSqlGenerator,
        // Change tracking
        StateEntry,
        StateEntryFactory,
        StoreExecutor,
        StoreResult,
        TypeAccessors,
        Value,
    };
}
