//! Per-query compilation state.

use std::collections::HashMap;
use std::sync::Arc;

use relmodel_core::{Error, MetadataProvider, NotFoundKind, Result};

use crate::query_model::{QueryModel, QuerySource, QuerySourceId, Selector};
use crate::select::SelectExpression;
use crate::translator::FilteringTranslator;

/// Holds one [`SelectExpression`] per query source while a single query is
/// translated. Not shared between queries.
pub struct QueryCompilationContext {
    metadata: Arc<dyn MetadataProvider>,
    sources: HashMap<QuerySourceId, QuerySource>,
    selects: HashMap<QuerySourceId, SelectExpression>,
    order: Vec<QuerySourceId>,
}

impl std::fmt::Debug for QueryCompilationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCompilationContext")
            .field("sources", &self.order)
            .finish_non_exhaustive()
    }
}

impl QueryCompilationContext {
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            metadata,
            sources: HashMap::new(),
            selects: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &dyn MetadataProvider {
        self.metadata.as_ref()
    }

    /// Register `source` and create its select expression.
    ///
    /// Registering the same source twice returns the existing expression.
    pub fn add_query_source(&mut self, source: &QuerySource) -> Result<&mut SelectExpression> {
        let id = source.id();
        if !self.selects.contains_key(&id) {
            let entity_type = source
                .item_type()
                .resolve(self.metadata.as_ref())
                .ok_or_else(|| {
                    Error::not_found(NotFoundKind::EntityType, source.item_type().to_string())
                })?;
            tracing::debug!(
                query_source = %id,
                item = source.item_name(),
                entity_type = %entity_type.name(),
                "Created select expression"
            );
            self.selects.insert(
                id,
                SelectExpression::new(id, source.item_name(), entity_type),
            );
            self.sources.insert(id, source.clone());
            self.order.push(id);
        }
        self.get_select_expression_mut(id)
    }

    pub fn query_source(&self, id: QuerySourceId) -> Option<&QuerySource> {
        self.sources.get(&id)
    }

    /// Strict lookup of the select expression for `id`.
    pub fn get_select_expression(&self, id: QuerySourceId) -> Result<&SelectExpression> {
        self.selects
            .get(&id)
            .ok_or_else(|| Error::not_found(NotFoundKind::SelectExpression, id.to_string()))
    }

    pub fn try_get_select_expression(&self, id: QuerySourceId) -> Option<&SelectExpression> {
        self.selects.get(&id)
    }

    pub fn get_select_expression_mut(&mut self, id: QuerySourceId) -> Result<&mut SelectExpression> {
        self.selects
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(NotFoundKind::SelectExpression, id.to_string()))
    }

    /// Select expressions in source registration order.
    pub fn select_expressions(&self) -> impl Iterator<Item = &SelectExpression> {
        self.order.iter().filter_map(|id| self.selects.get(id))
    }

    /// Populate select expressions from `query`.
    ///
    /// Each `where` predicate is translated once per source, binding only
    /// members of that source; translated parts are conjoined into the
    /// source's predicate. Untranslated parts are left for client-side
    /// evaluation.
    #[tracing::instrument(level = "debug", skip_all, fields(main_from = %query.main_from().id()))]
    pub fn compile(&mut self, query: &QueryModel) -> Result<()> {
        for source in query.query_sources() {
            self.add_query_source(source)?;
        }

        for predicate in query.where_clauses() {
            let mut translated = Vec::with_capacity(self.order.len());
            for &id in &self.order {
                let predicate = FilteringTranslator::new(self, Some(id)).translate(predicate)?;
                translated.push((id, predicate));
            }
            for (id, predicate) in translated {
                match predicate {
                    Some(predicate) => {
                        tracing::trace!(query_source = %id, predicate = %predicate, "Pushed down predicate");
                        self.get_select_expression_mut(id)?.add_predicate(predicate);
                    }
                    None => {
                        tracing::debug!(query_source = %id, "Predicate not translatable for source");
                    }
                }
            }
        }

        match query.selector() {
            Selector::Entity(id) => self.get_select_expression_mut(*id)?.project_entity(),
            Selector::Members(members) => {
                for member in members {
                    let bound = self.bind_member_expression(member, None, |property, select| {
                        (property.clone(), select.query_source())
                    });
                    match bound {
                        Some((property, id)) => {
                            self.get_select_expression_mut(id)?
                                .add_to_projection(&property);
                        }
                        None => tracing::debug!(member = %member, "Selector member not bound"),
                    }
                }
            }
        }
        Ok(())
    }
}
