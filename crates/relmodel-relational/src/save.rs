//! Persisting tracked changes.
//!
//! Commands are executed in dependency order:
//! - DELETE child-first (to respect FK constraints)
//! - INSERT parent-first (to respect FK constraints)
//! - UPDATE any order
//!
//! Each command is one batch: the statement plus its read-back. A command
//! that does not affect exactly one row fails the whole save.

use std::collections::HashMap;

use relmodel_core::{Error, Result, StoreExecutor, StoreResult, UpdateError, UpdateErrorKind};
use relmodel_session::{EntryId, StateEntry};

use crate::modification_command::{ModificationCommand, ModificationOperation};
use crate::parameters::ParameterNameGenerator;
use crate::sql_generator::SqlGenerator;

/// Orders modification commands by foreign key dependency.
///
/// The dependency count of a command is the number of principal entity
/// types its entity type refers to.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlushOrderer;

impl FlushOrderer {
    pub fn new() -> Self {
        Self
    }

    fn dependency_count(command: &ModificationCommand) -> usize {
        command.entity_type().principal_types().len()
    }

    /// Order commands into a flush plan.
    ///
    /// - Deletes: child-first (more dependencies = delete first)
    /// - Inserts: parent-first (fewer dependencies = insert first)
    /// - Updates: any order
    ///
    /// The sorts are stable, so commands with equal counts keep their order.
    pub fn order(&self, commands: Vec<ModificationCommand>) -> FlushPlan {
        let mut plan = FlushPlan::new();
        for command in commands {
            match command.operation() {
                ModificationOperation::Delete => plan.deletes.push(command),
                ModificationOperation::Insert => plan.inserts.push(command),
                ModificationOperation::Update => plan.updates.push(command),
            }
        }

        plan.deletes
            .sort_by(|a, b| Self::dependency_count(b).cmp(&Self::dependency_count(a)));
        plan.inserts
            .sort_by(|a, b| Self::dependency_count(a).cmp(&Self::dependency_count(b)));
        plan
    }
}

/// Commands of one save, grouped and ordered for execution.
#[derive(Debug, Default)]
pub struct FlushPlan {
    /// Delete commands (ordered child-first).
    pub deletes: Vec<ModificationCommand>,
    /// Insert commands (ordered parent-first).
    pub inserts: Vec<ModificationCommand>,
    /// Update commands (any order).
    pub updates: Vec<ModificationCommand>,
}

impl FlushPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty() && self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deletes.len() + self.inserts.len() + self.updates.len()
    }

    /// Commands in execution order: deletes, inserts, then updates.
    pub fn commands(&self) -> impl Iterator<Item = &ModificationCommand> {
        self.deletes
            .iter()
            .chain(self.inserts.iter())
            .chain(self.updates.iter())
    }
}

/// Result of a save.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveResult {
    /// Number of rows inserted.
    pub inserted: usize,
    /// Number of rows updated.
    pub updated: usize,
    /// Number of rows deleted.
    pub deleted: usize,
}

impl SaveResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows written.
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    fn record(&mut self, operation: ModificationOperation) {
        match operation {
            ModificationOperation::Insert => self.inserted += 1,
            ModificationOperation::Update => self.updated += 1,
            ModificationOperation::Delete => self.deleted += 1,
        }
    }
}

/// Turns dirty state entries into store commands and runs them.
pub struct SaveChanges<'g> {
    generator: &'g dyn SqlGenerator,
    orderer: FlushOrderer,
}

impl<'g> SaveChanges<'g> {
    pub fn new(generator: &'g dyn SqlGenerator) -> Self {
        Self {
            generator,
            orderer: FlushOrderer::new(),
        }
    }

    /// Build the ordered plan for `entries` without executing anything.
    pub fn plan(&self, entries: &[StateEntry]) -> Result<FlushPlan> {
        let mut commands = Vec::new();
        for entry in entries {
            let mut names = ParameterNameGenerator::new();
            if let Some(command) = ModificationCommand::from_entry(entry, &mut names)? {
                commands.push(command);
            }
        }
        Ok(self.orderer.order(commands))
    }

    /// Persist every entry that needs saving.
    ///
    /// On success every saved entry has its store-generated values committed
    /// and its changes accepted. On failure the store-generated values of
    /// every entry are discarded and the entries keep their states.
    #[tracing::instrument(level = "info", skip_all, fields(dialect = self.generator.dialect(), entries = entries.len()))]
    pub fn execute<E: StoreExecutor + ?Sized>(
        &self,
        entries: &mut [StateEntry],
        executor: &mut E,
    ) -> Result<SaveResult> {
        let plan = self.plan(entries)?;
        if plan.is_empty() {
            tracing::debug!("Nothing to save");
            return Ok(SaveResult::new());
        }
        tracing::info!(
            deletes = plan.deletes.len(),
            inserts = plan.inserts.len(),
            updates = plan.updates.len(),
            "Executing flush plan"
        );

        let start = std::time::Instant::now();
        let positions: HashMap<EntryId, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id(), i))
            .collect();

        match self.run(&plan, &positions, entries, executor) {
            Ok(result) => {
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis(),
                    inserted = result.inserted,
                    updated = result.updated,
                    deleted = result.deleted,
                    "Save complete"
                );
                Ok(result)
            }
            Err(e) => {
                for entry in entries.iter_mut() {
                    entry.auto_rollback_sidecars();
                }
                tracing::warn!(error = %e, "Save failed, store generated values discarded");
                Err(e)
            }
        }
    }

    fn run<E: StoreExecutor + ?Sized>(
        &self,
        plan: &FlushPlan,
        positions: &HashMap<EntryId, usize>,
        entries: &mut [StateEntry],
        executor: &mut E,
    ) -> Result<SaveResult> {
        for command in plan.commands() {
            entries[positions[&command.entry_id()]].prepare_to_save();
        }

        let mut result = SaveResult::new();
        for command in plan.commands() {
            let entry = &mut entries[positions[&command.entry_id()]];
            self.execute_command(command, entry, executor)?;
            result.record(command.operation());
        }

        for command in plan.commands() {
            let entry = &mut entries[positions[&command.entry_id()]];
            entry.auto_commit_sidecars()?;
            entry.accept_changes()?;
        }
        Ok(result)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(entry = %command.entry_id(), operation = %command.operation(), table = %command.table()))]
    fn execute_command<E: StoreExecutor + ?Sized>(
        &self,
        command: &ModificationCommand,
        entry: &mut StateEntry,
        executor: &mut E,
    ) -> Result<()> {
        let sql = command.to_sql(self.generator)?;
        let parameters = command.parameters();
        if entry.configuration().sensitive_data_logging() {
            tracing::trace!(sql = %sql, parameters = ?parameters, "Executing command");
        } else {
            tracing::trace!(sql = %sql, parameters = parameters.len(), "Executing command");
        }

        let outcome = executor.execute(&sql, &parameters)?;
        if command.requires_result_propagation() {
            let StoreResult::Rows(rows) = outcome else {
                return Err(unexpected_result(&sql, "expected generated values, store returned a row count"));
            };
            let [row] = rows.as_slice() else {
                return Err(concurrency_failure(&sql, rows.len() as u64));
            };
            command.propagate_results(entry, row)
        } else {
            let affected = affected_rows(&sql, &outcome)?;
            if affected == 1 {
                Ok(())
            } else {
                Err(concurrency_failure(&sql, affected))
            }
        }
    }
}

/// Row count reported by a row-count read-back.
fn affected_rows(sql: &str, outcome: &StoreResult) -> Result<u64> {
    match outcome {
        StoreResult::AffectedCount(count) => Ok(*count),
        StoreResult::Rows(rows) => match rows.as_slice() {
            [row] => match row.as_slice() {
                [count] => count
                    .as_i64()
                    .and_then(|n| u64::try_from(n).ok())
                    .ok_or_else(|| unexpected_result(sql, "row count is not a non-negative integer")),
                _ => Err(unexpected_result(sql, "row count result must have one column")),
            },
            _ => Err(unexpected_result(sql, "row count result must have one row")),
        },
    }
}

fn concurrency_failure(sql: &str, affected: u64) -> Error {
    UpdateError {
        kind: UpdateErrorKind::Concurrency,
        message: format!("expected 1 row to be affected, store reported {affected}"),
        command: Some(sql.to_string()),
    }
    .into()
}

fn unexpected_result(sql: &str, message: &str) -> Error {
    UpdateError {
        kind: UpdateErrorKind::UnexpectedResult,
        message: message.to_string(),
        command: Some(sql.to_string()),
    }
    .into()
}
