//! Modification commands built from dirty state entries.

use std::fmt;
use std::sync::Arc;

use relmodel_core::{
    EntityType, Parameter, Result, SchemaQualifiedName, UpdateError, UpdateErrorKind, Value,
};
use relmodel_session::{EntityState, EntryId, STORE_GENERATED_VALUES, StateEntry};

use crate::column_modification::{ColumnModification, ColumnRoles};
use crate::parameters::ParameterNameGenerator;
use crate::sql_generator::SqlGenerator;

/// The statement a command renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModificationOperation {
    Insert,
    Update,
    Delete,
}

impl ModificationOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            ModificationOperation::Insert => "INSERT",
            ModificationOperation::Update => "UPDATE",
            ModificationOperation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ModificationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One INSERT, UPDATE or DELETE for one state entry.
#[derive(Debug, Clone)]
pub struct ModificationCommand {
    entry: EntryId,
    entity_type: Arc<EntityType>,
    table: SchemaQualifiedName,
    operation: ModificationOperation,
    columns: Vec<ColumnModification>,
}

impl ModificationCommand {
    /// Build the command persisting `entry`, if its state needs one.
    ///
    /// - `Added`: store-generated properties are read back, every other
    ///   property is written.
    /// - `Modified`: modified non-key properties are written; keys and
    ///   concurrency tokens are matched on their original values;
    ///   properties generated on update are read back.
    /// - `Deleted`: keys and concurrency tokens are matched on their
    ///   original values.
    ///
    /// Returns `None` for other states, and for a modified entry with
    /// nothing to write or read back.
    pub fn from_entry(
        entry: &StateEntry,
        names: &mut ParameterNameGenerator,
    ) -> Result<Option<Self>> {
        let operation = match entry.state() {
            EntityState::Added => ModificationOperation::Insert,
            EntityState::Modified => ModificationOperation::Update,
            EntityState::Deleted => ModificationOperation::Delete,
            EntityState::Unknown | EntityState::Unchanged => return Ok(None),
        };
        let entity_type = Arc::clone(entry.entity_type());

        let mut columns = Vec::new();
        for property in entity_type.properties() {
            let is_key = entity_type.is_key_property(property);
            let generation = property.generation_on_save();
            let mut roles = ColumnRoles {
                is_key,
                ..ColumnRoles::default()
            };
            match operation {
                ModificationOperation::Insert => {
                    if generation.on_insert() {
                        roles.is_read = true;
                    } else {
                        roles.is_write = true;
                    }
                }
                ModificationOperation::Update => {
                    roles.is_condition = is_key || property.is_concurrency_token();
                    if generation.on_update() {
                        roles.is_read = true;
                    } else if !is_key && entry.is_property_modified(property)? {
                        roles.is_write = true;
                    }
                }
                ModificationOperation::Delete => {
                    roles.is_condition = is_key || property.is_concurrency_token();
                }
            }
            if !(roles.is_read || roles.is_write || roles.is_condition) {
                continue;
            }
            let value = entry.get(property)?;
            let original = entry.original_value(property)?;
            columns.push(ColumnModification::new(property, roles, value, original, names));
        }

        if operation == ModificationOperation::Update
            && !columns.iter().any(|c| c.is_write() || c.is_read())
        {
            tracing::trace!(entry = %entry.id(), "Modified entry has nothing to write");
            return Ok(None);
        }

        tracing::trace!(
            entry = %entry.id(),
            entity_type = %entity_type.name(),
            operation = %operation,
            columns = columns.len(),
            "Built modification command"
        );
        Ok(Some(Self {
            entry: entry.id(),
            table: entity_type.qualified_table_name(),
            entity_type,
            operation,
            columns,
        }))
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn table(&self) -> &SchemaQualifiedName {
        &self.table
    }

    pub fn operation(&self) -> ModificationOperation {
        self.operation
    }

    pub fn column_modifications(&self) -> &[ColumnModification] {
        &self.columns
    }

    /// Columns read back after the command runs, in select-list order.
    pub fn read_columns(&self) -> impl Iterator<Item = &ColumnModification> {
        self.columns.iter().filter(|c| c.is_read())
    }

    /// Whether the store returns generated values for this command.
    pub fn requires_result_propagation(&self) -> bool {
        self.columns.iter().any(ColumnModification::is_read)
    }

    /// Every parameter the rendered text refers to.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.columns
            .iter()
            .flat_map(ColumnModification::parameters)
            .collect()
    }

    /// Render the command into `out`.
    pub fn append_to(&self, generator: &dyn SqlGenerator, out: &mut String) -> Result<()> {
        match self.operation {
            ModificationOperation::Insert => {
                generator.append_insert_operation(out, &self.table, &self.columns)
            }
            ModificationOperation::Update => {
                generator.append_update_operation(out, &self.table, &self.columns)
            }
            ModificationOperation::Delete => {
                generator.append_delete_operation(out, &self.table, &self.columns)
            }
        }
    }

    /// Render the command into a fresh batch.
    pub fn to_sql(&self, generator: &dyn SqlGenerator) -> Result<String> {
        let mut out = String::new();
        generator.append_batch_header(&mut out);
        self.append_to(generator, &mut out)?;
        Ok(out)
    }

    /// Store the values read back for this command in the entry's
    /// store-generated values sidecar, attaching it if needed.
    pub fn propagate_results(&self, entry: &mut StateEntry, row: &[Value]) -> Result<()> {
        let reads: Vec<&ColumnModification> = self.read_columns().collect();
        if reads.len() != row.len() {
            return Err(UpdateError {
                kind: UpdateErrorKind::UnexpectedResult,
                message: format!(
                    "expected {} generated values for '{}', store returned {}",
                    reads.len(),
                    self.entity_type.name(),
                    row.len()
                ),
                command: None,
            }
            .into());
        }
        if !entry.is_prepared_to_save() {
            entry.prepare_to_save();
        }
        for (column, value) in reads.into_iter().zip(row) {
            entry.set_sidecar_value(STORE_GENERATED_VALUES, column.property(), value.clone())?;
        }
        tracing::trace!(entry = %entry.id(), values = row.len(), "Propagated store generated values");
        Ok(())
    }
}
