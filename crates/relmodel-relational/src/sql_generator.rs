//! Command text for persisting a change set.
//!
//! [`SqlGenerator`] renders INSERT, UPDATE and DELETE operations from a list
//! of [`ColumnModification`]s. Every operation is followed by a command that
//! lets the caller verify the outcome: either a select of the store-generated
//! columns of the affected row, or a select of the affected row count.
//! Dialects supply the store-specific parts through the required hooks.

use relmodel_core::{
    ConfigErrorKind, Error, Result, SchemaQualifiedName, delimit_identifier, generate_literal,
};

use crate::column_modification::ColumnModification;

/// Placeholder rendered for a column that was given no parameter.
const MISSING_PARAMETER: &str = "NULL";

/// Renders modification commands for one store dialect.
pub trait SqlGenerator: Send + Sync {
    /// Dialect name, used in logs.
    fn dialect(&self) -> &'static str;

    /// Terminator appended after every statement.
    fn batch_command_separator(&self) -> &str {
        ";"
    }

    fn delimit_identifier(&self, identifier: &str) -> String {
        delimit_identifier(identifier)
    }

    /// Delimit a table name, delimiting the schema separately when present.
    fn delimit_table(&self, table: &SchemaQualifiedName) -> String {
        match &table.schema {
            Some(schema) => format!(
                "{}.{}",
                self.delimit_identifier(schema),
                self.delimit_identifier(&table.name)
            ),
            None => self.delimit_identifier(&table.name),
        }
    }

    fn generate_literal(&self, literal: &str) -> String {
        generate_literal(literal)
    }

    /// Text emitted once at the start of a batch.
    fn append_batch_header(&self, _out: &mut String) {}

    /// Condition that holds when the previous statement touched `expected_rows` rows.
    fn append_rows_affected_where_condition(&self, out: &mut String, expected_rows: u64);

    /// Condition matching a key column to the value the store just generated.
    fn append_identity_where_condition(&self, out: &mut String, column: &ColumnModification);

    /// Command returning the number of rows the previous statement affected.
    fn append_select_affected_count_command(&self, out: &mut String, table: &SchemaQualifiedName);

    /// INSERT followed by a read-back of generated columns or of the row count.
    fn append_insert_operation(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        operations: &[ColumnModification],
    ) -> Result<()> {
        check_table(table)?;
        let writes: Vec<&ColumnModification> = operations.iter().filter(|c| c.is_write()).collect();
        self.append_insert_command(out, table, &writes);
        self.append_read_back(out, table, operations);
        Ok(())
    }

    /// UPDATE followed by a read-back of generated columns or of the row count.
    fn append_update_operation(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        operations: &[ColumnModification],
    ) -> Result<()> {
        check_table(table)?;
        let writes: Vec<&ColumnModification> = operations.iter().filter(|c| c.is_write()).collect();
        let conditions: Vec<&ColumnModification> =
            operations.iter().filter(|c| c.is_condition()).collect();
        self.append_update_command(out, table, &writes, &conditions);
        self.append_read_back(out, table, operations);
        Ok(())
    }

    /// DELETE followed by the row count.
    fn append_delete_operation(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        operations: &[ColumnModification],
    ) -> Result<()> {
        check_table(table)?;
        let conditions: Vec<&ColumnModification> =
            operations.iter().filter(|c| c.is_condition()).collect();
        self.append_delete_command(out, table, &conditions);
        self.append_select_affected_count_command(out, table);
        Ok(())
    }

    fn append_insert_command(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        writes: &[&ColumnModification],
    ) {
        out.push_str("INSERT INTO ");
        out.push_str(&self.delimit_table(table));
        if !writes.is_empty() {
            out.push_str(" (");
            self.append_column_list(out, writes);
            out.push(')');
        }
        out.push('\n');
        if writes.is_empty() {
            out.push_str("DEFAULT VALUES");
        } else {
            out.push_str("VALUES (");
            for (i, column) in writes.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(column.parameter_name().unwrap_or(MISSING_PARAMETER));
            }
            out.push(')');
        }
        self.end_statement(out);
    }

    fn append_update_command(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        writes: &[&ColumnModification],
        conditions: &[&ColumnModification],
    ) {
        out.push_str("UPDATE ");
        out.push_str(&self.delimit_table(table));
        out.push_str(" SET ");
        for (i, column) in writes.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.append_where_condition(out, column, false);
        }
        self.append_where_clause(out, conditions);
        self.end_statement(out);
    }

    fn append_delete_command(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        conditions: &[&ColumnModification],
    ) {
        out.push_str("DELETE FROM ");
        out.push_str(&self.delimit_table(table));
        self.append_where_clause(out, conditions);
        self.end_statement(out);
    }

    /// SELECT of the read columns of the row just written, identified by its keys.
    fn append_select_affected_command(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        reads: &[&ColumnModification],
        keys: &[&ColumnModification],
    ) {
        out.push_str("SELECT ");
        self.append_column_list(out, reads);
        out.push_str("\nFROM ");
        out.push_str(&self.delimit_table(table));
        out.push_str("\nWHERE ");
        self.append_rows_affected_where_condition(out, 1);
        for key in keys {
            out.push_str(" AND ");
            if key.is_read() {
                self.append_identity_where_condition(out, key);
            } else {
                // After the write the row holds a written key's new value
                // and an unwritten key's original one.
                self.append_where_condition(out, key, !key.is_write());
            }
        }
        self.end_statement(out);
    }

    /// `"col" = @p`, using the original-value parameter when asked.
    fn append_where_condition(
        &self,
        out: &mut String,
        column: &ColumnModification,
        use_original_value: bool,
    ) {
        let parameter = if use_original_value {
            column.original_parameter_name()
        } else {
            column.parameter_name()
        };
        out.push_str(&self.delimit_identifier(column.column_name()));
        out.push_str(" = ");
        out.push_str(parameter.unwrap_or(MISSING_PARAMETER));
    }

    fn append_where_clause(&self, out: &mut String, conditions: &[&ColumnModification]) {
        if conditions.is_empty() {
            return;
        }
        out.push_str("\nWHERE ");
        for (i, column) in conditions.iter().enumerate() {
            if i > 0 {
                out.push_str(" AND ");
            }
            self.append_where_condition(out, column, true);
        }
    }

    fn append_column_list(&self, out: &mut String, columns: &[&ColumnModification]) {
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.delimit_identifier(column.column_name()));
        }
    }

    fn end_statement(&self, out: &mut String) {
        out.push_str(self.batch_command_separator());
        out.push('\n');
    }

    /// Read back generated columns if any, else the affected row count.
    fn append_read_back(
        &self,
        out: &mut String,
        table: &SchemaQualifiedName,
        operations: &[ColumnModification],
    ) {
        let reads: Vec<&ColumnModification> = operations.iter().filter(|c| c.is_read()).collect();
        if reads.is_empty() {
            self.append_select_affected_count_command(out, table);
        } else {
            let keys: Vec<&ColumnModification> = operations.iter().filter(|c| c.is_key()).collect();
            self.append_select_affected_command(out, table, &reads, &keys);
        }
    }
}

fn check_table(table: &SchemaQualifiedName) -> Result<()> {
    if table.name.is_empty() {
        return Err(Error::config(
            ConfigErrorKind::EmptyArgument,
            "table name must not be empty",
        ));
    }
    Ok(())
}
