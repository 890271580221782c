//! Relational command generation and persistence for relmodel.
//!
//! `relmodel-relational` turns tracked changes and compiled queries into
//! store command text:
//!
//! - [`ModificationCommand`] describes the INSERT, UPDATE or DELETE for one
//!   dirty [`relmodel_session::StateEntry`] as a list of
//!   [`ColumnModification`]s.
//! - [`SqlGenerator`] renders those commands; [`SqliteSqlGenerator`] and
//!   [`MysqlSqlGenerator`] provide the dialect hooks.
//! - [`SelectSqlGenerator`] renders a compiled
//!   [`relmodel_query::SelectExpression`].
//! - [`SaveChanges`] orders commands by foreign key dependency, runs them
//!   through a [`relmodel_core::StoreExecutor`] and feeds store-generated
//!   values back into the entries.

pub mod column_modification;
pub mod dialect;
pub mod modification_command;
pub mod parameters;
pub mod save;
pub mod select_sql;
pub mod sql_generator;

pub use column_modification::{ColumnModification, ColumnRoles};
pub use dialect::{Dialect, MysqlSqlGenerator, SqliteSqlGenerator, generator_for_dialect};
pub use modification_command::{ModificationCommand, ModificationOperation};
pub use parameters::ParameterNameGenerator;
pub use save::{FlushOrderer, FlushPlan, SaveChanges, SaveResult};
pub use select_sql::SelectSqlGenerator;
pub use sql_generator::SqlGenerator;
