//! SELECT text for one compiled select expression.

use relmodel_core::Parameter;
use relmodel_query::{PredicateExpr, SelectExpression};

use crate::parameters::ParameterNameGenerator;
use crate::sql_generator::SqlGenerator;

/// Renders a [`SelectExpression`] as
/// `SELECT a."Col", … FROM "Table" AS a WHERE …`.
///
/// Constants in the predicate become parameters.
pub struct SelectSqlGenerator<'a> {
    generator: &'a dyn SqlGenerator,
}

impl<'a> SelectSqlGenerator<'a> {
    pub fn new(generator: &'a dyn SqlGenerator) -> Self {
        Self { generator }
    }

    /// Build the command text and its parameters.
    pub fn generate(
        &self,
        select: &SelectExpression,
        names: &mut ParameterNameGenerator,
    ) -> (String, Vec<Parameter>) {
        let mut sql = String::from("SELECT ");
        let mut parameters = Vec::new();

        if select.is_projection_empty() {
            sql.push('1');
        } else {
            for (i, property) in select.projection().iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                self.push_column(&mut sql, select.alias(), property.column_name());
            }
        }

        sql.push_str("\nFROM ");
        sql.push_str(&self.generator.delimit_table(select.table()));
        sql.push_str(" AS ");
        sql.push_str(select.alias());

        if let Some(predicate) = select.predicate() {
            sql.push_str("\nWHERE ");
            self.push_predicate(&mut sql, select.alias(), predicate, names, &mut parameters);
        }

        tracing::trace!(
            dialect = self.generator.dialect(),
            table = %select.table(),
            parameters = parameters.len(),
            "Generated select"
        );
        (sql, parameters)
    }

    fn push_column(&self, sql: &mut String, alias: &str, column: &str) {
        sql.push_str(alias);
        sql.push('.');
        sql.push_str(&self.generator.delimit_identifier(column));
    }

    fn push_predicate(
        &self,
        sql: &mut String,
        alias: &str,
        predicate: &PredicateExpr,
        names: &mut ParameterNameGenerator,
        parameters: &mut Vec<Parameter>,
    ) {
        match predicate {
            PredicateExpr::Comparison {
                op,
                property,
                constant,
            } => {
                let name = names.generate_next();
                self.push_column(sql, alias, property.column_name());
                sql.push(' ');
                sql.push_str(op.as_str());
                sql.push(' ');
                sql.push_str(&name);
                parameters.push(Parameter::new(name, constant.value().clone()));
            }
            PredicateExpr::And(left, right) | PredicateExpr::Or(left, right) => {
                let keyword = if matches!(predicate, PredicateExpr::And(..)) {
                    " AND "
                } else {
                    " OR "
                };
                sql.push('(');
                self.push_predicate(sql, alias, left, names, parameters);
                sql.push_str(keyword);
                self.push_predicate(sql, alias, right, names, parameters);
                sql.push(')');
            }
        }
    }
}
