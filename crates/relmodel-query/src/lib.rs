//! Query translation for relmodel.
//!
//! `relmodel-query` is the **query translation layer**. It takes a parsed
//! [`QueryModel`] and fills one [`SelectExpression`] per query source with
//! the table to read, the store-translatable part of the filter, and the
//! projected properties.
//!
//! # Role In The Architecture
//!
//! - **Expression tree**: [`Expression`], a closed sum type over node kinds.
//! - **Binder**: resolves `source.Member` to a [`relmodel_core::Property`].
//! - **Filtering translator**: rewrites filters into [`PredicateExpr`],
//!   narrowing AND when only one side translates.
//! - **Select model**: [`QueryCompilationContext`] owns the per-source
//!   [`SelectExpression`]s for one query.
//!
//! SQL text for a select expression is rendered by `relmodel-relational`;
//! [`TableFilterGenerator`] renders filters for keyed table stores.
//!
//! AND narrowing drops untranslatable conjuncts, so the pushed-down
//! predicate may match more rows than the full filter. Results must be
//! filtered again after materialization.

pub mod binder;
pub mod context;
pub mod expression;
pub mod query_model;
pub mod select;
pub mod table_filter;
pub mod translator;

pub use context::QueryCompilationContext;
pub use expression::{ComparisonOp, ConstantValue, Expression};
pub use query_model::{BodyClause, ItemType, QueryModel, QuerySource, QuerySourceId, Selector};
pub use select::SelectExpression;
pub use table_filter::TableFilterGenerator;
pub use translator::{FilteringTranslator, PredicateExpr, QueryableConstant};
