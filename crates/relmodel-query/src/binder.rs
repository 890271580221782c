//! Member expression binding.

use relmodel_core::Property;

use crate::context::QueryCompilationContext;
use crate::expression::Expression;
use crate::query_model::QuerySourceId;
use crate::select::SelectExpression;

impl QueryCompilationContext {
    /// Resolve `source.Member` to a property and the select expression of
    /// its source, then hand both to `binder`.
    ///
    /// Binding succeeds only when the member's target is a direct reference
    /// to a query source that matches `query_source` (when given), the
    /// source's item type maps to an entity type, the member names a
    /// declared property, and a select expression exists for the source.
    /// Every other case is unbound and yields `None`.
    pub fn bind_member_expression<R>(
        &self,
        expression: &Expression,
        query_source: Option<QuerySourceId>,
        binder: impl FnOnce(&Property, &SelectExpression) -> R,
    ) -> Option<R> {
        let Expression::Member { target, name } = expression else {
            return None;
        };
        let Expression::QuerySourceRef(referenced) = target.as_ref() else {
            return None;
        };
        if query_source.is_some_and(|filter| filter != *referenced) {
            return None;
        }
        let entity_type = self
            .query_source(*referenced)?
            .item_type()
            .resolve(self.metadata())?;
        let property = entity_type.property(name)?;
        let select = self.try_get_select_expression(*referenced)?;
        Some(binder(property, select))
    }
}
