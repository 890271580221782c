//! MySQL command text.

use relmodel_core::{SchemaQualifiedName, delimit_identifier_mysql};

use crate::column_modification::ColumnModification;
use crate::sql_generator::SqlGenerator;

/// MySQL quotes identifiers with backticks and reports the row count
/// through `ROW_COUNT()`, generated keys through `LAST_INSERT_ID()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlSqlGenerator;

impl MysqlSqlGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for MysqlSqlGenerator {
    fn dialect(&self) -> &'static str {
        "mysql"
    }

    fn delimit_identifier(&self, identifier: &str) -> String {
        delimit_identifier_mysql(identifier)
    }

    fn append_rows_affected_where_condition(&self, out: &mut String, expected_rows: u64) {
        out.push_str("ROW_COUNT() = ");
        out.push_str(&expected_rows.to_string());
    }

    fn append_identity_where_condition(&self, out: &mut String, column: &ColumnModification) {
        out.push_str(&self.delimit_identifier(column.column_name()));
        out.push_str(" = LAST_INSERT_ID()");
    }

    fn append_select_affected_count_command(&self, out: &mut String, _table: &SchemaQualifiedName) {
        out.push_str("SELECT ROW_COUNT()");
        self.end_statement(out);
    }
}
