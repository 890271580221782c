//! The per-source select model.

use std::sync::Arc;

use relmodel_core::{EntityType, Property, SchemaQualifiedName};

use crate::query_model::QuerySourceId;
use crate::translator::PredicateExpr;

/// Store-neutral description of what to fetch for one query source: the
/// table, an optional translated predicate and the projected properties.
#[derive(Debug, Clone)]
pub struct SelectExpression {
    query_source: QuerySourceId,
    alias: String,
    entity_type: Arc<EntityType>,
    table: SchemaQualifiedName,
    predicate: Option<PredicateExpr>,
    projection: Vec<Property>,
}

impl SelectExpression {
    pub fn new(
        query_source: QuerySourceId,
        alias: impl Into<String>,
        entity_type: Arc<EntityType>,
    ) -> Self {
        let table = entity_type.qualified_table_name();
        Self {
            query_source,
            alias: alias.into(),
            entity_type,
            table,
            predicate: None,
            projection: Vec::new(),
        }
    }

    pub fn query_source(&self) -> QuerySourceId {
        self.query_source
    }

    /// Table alias, taken from the query source's item name.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn table(&self) -> &SchemaQualifiedName {
        &self.table
    }

    pub fn predicate(&self) -> Option<&PredicateExpr> {
        self.predicate.as_ref()
    }

    pub fn set_predicate(&mut self, predicate: Option<PredicateExpr>) {
        self.predicate = predicate;
    }

    /// Conjoin `predicate` with the current one.
    pub fn add_predicate(&mut self, predicate: PredicateExpr) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }

    /// Project `property`, returning its position. Already projected
    /// properties keep their position.
    pub fn add_to_projection(&mut self, property: &Property) -> usize {
        match self.projection_index(property) {
            Some(index) => index,
            None => {
                self.projection.push(property.clone());
                self.projection.len() - 1
            }
        }
    }

    /// Project every property of the entity type in declaration order.
    pub fn project_entity(&mut self) {
        let entity_type = Arc::clone(&self.entity_type);
        for property in entity_type.properties() {
            self.add_to_projection(property);
        }
    }

    pub fn projection(&self) -> &[Property] {
        &self.projection
    }

    pub fn projection_index(&self, property: &Property) -> Option<usize> {
        self.projection.iter().position(|p| p == property)
    }

    pub fn is_projection_empty(&self) -> bool {
        self.projection.is_empty()
    }
}
