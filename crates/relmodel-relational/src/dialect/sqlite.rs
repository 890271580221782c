//! SQLite command text.

use relmodel_core::SchemaQualifiedName;

use crate::column_modification::ColumnModification;
use crate::sql_generator::SqlGenerator;

/// SQLite reports the row count through `changes()` and generated keys
/// through `last_insert_rowid()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSqlGenerator;

impl SqliteSqlGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for SqliteSqlGenerator {
    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    fn append_rows_affected_where_condition(&self, out: &mut String, expected_rows: u64) {
        out.push_str("changes() = ");
        out.push_str(&expected_rows.to_string());
    }

    fn append_identity_where_condition(&self, out: &mut String, column: &ColumnModification) {
        out.push_str(&self.delimit_identifier(column.column_name()));
        out.push_str(" = last_insert_rowid()");
    }

    fn append_select_affected_count_command(&self, out: &mut String, _table: &SchemaQualifiedName) {
        out.push_str("SELECT changes()");
        self.end_statement(out);
    }
}

#[cfg(test)]
mod tests {
    use relmodel_core::{EntityType, Property, Value, ValueGenerationOnSave};

    use super::*;
    use crate::column_modification::ColumnRoles;
    use crate::parameters::ParameterNameGenerator;

    #[test]
    fn insert_reads_back_generated_key() {
        let mut et = EntityType::new("T");
        let id = et
            .add_property(
                Property::typed::<i64>("Id").generate_on_save(ValueGenerationOnSave::WhenInserting),
            )
            .unwrap();
        let name = et.add_property(Property::typed::<String>("Name")).unwrap();
        let mut names = ParameterNameGenerator::new();
        let ops = vec![
            ColumnModification::new(
                &id,
                ColumnRoles::default().key().read(),
                Value::BigInt(-1),
                Value::BigInt(-1),
                &mut names,
            ),
            ColumnModification::new(
                &name,
                ColumnRoles::default().write(),
                Value::from("Ada"),
                Value::Null,
                &mut names,
            ),
        ];

        let mut sql = String::new();
        SqliteSqlGenerator
            .append_insert_operation(&mut sql, &SchemaQualifiedName::new("T"), &ops)
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"T\" (\"Name\")\nVALUES (@p0);\n\
             SELECT \"Id\"\nFROM \"T\"\nWHERE changes() = 1 AND \"Id\" = last_insert_rowid();\n"
        );
    }

    #[test]
    fn delete_counts_changes() {
        let mut sql = String::new();
        SqliteSqlGenerator
            .append_delete_operation(&mut sql, &SchemaQualifiedName::new("T"), &[])
            .unwrap();
        assert_eq!(sql, "DELETE FROM \"T\";\nSELECT changes();\n");
    }
}
