//! Per-column roles within one modification command.

use relmodel_core::{Parameter, Property, Value};

use crate::parameters::ParameterNameGenerator;

/// Role flags of a column in a modification command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    /// Store-generated; read back after the command runs.
    pub is_read: bool,
    /// Sent to the store (`VALUES` or `SET`).
    pub is_write: bool,
    /// Part of the primary key.
    pub is_key: bool,
    /// Checked in `WHERE` against its original value.
    pub is_condition: bool,
}

impl ColumnRoles {
    #[must_use]
    pub fn read(mut self) -> Self {
        self.is_read = true;
        self
    }

    #[must_use]
    pub fn write(mut self) -> Self {
        self.is_write = true;
        self
    }

    #[must_use]
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    #[must_use]
    pub fn condition(mut self) -> Self {
        self.is_condition = true;
        self
    }
}

/// One column of an INSERT, UPDATE or DELETE.
///
/// A write column gets a parameter carrying the current value. A condition
/// column, or a key column that is neither written nor read back, gets an
/// original-value parameter.
#[derive(Debug, Clone)]
pub struct ColumnModification {
    property: Property,
    roles: ColumnRoles,
    value: Value,
    original_value: Value,
    parameter_name: Option<String>,
    original_parameter_name: Option<String>,
}

impl ColumnModification {
    pub fn new(
        property: &Property,
        roles: ColumnRoles,
        value: Value,
        original_value: Value,
        names: &mut ParameterNameGenerator,
    ) -> Self {
        let parameter_name = roles.is_write.then(|| names.generate_next());
        let needs_original = roles.is_condition || (roles.is_key && !roles.is_write && !roles.is_read);
        let original_parameter_name = needs_original.then(|| names.generate_next());
        Self {
            property: property.clone(),
            roles,
            value,
            original_value,
            parameter_name,
            original_parameter_name,
        }
    }

    pub fn property(&self) -> &Property {
        &self.property
    }

    pub fn column_name(&self) -> &str {
        self.property.column_name()
    }

    pub fn roles(&self) -> ColumnRoles {
        self.roles
    }

    pub fn is_read(&self) -> bool {
        self.roles.is_read
    }

    pub fn is_write(&self) -> bool {
        self.roles.is_write
    }

    pub fn is_key(&self) -> bool {
        self.roles.is_key
    }

    pub fn is_condition(&self) -> bool {
        self.roles.is_condition
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn original_value(&self) -> &Value {
        &self.original_value
    }

    pub fn parameter_name(&self) -> Option<&str> {
        self.parameter_name.as_deref()
    }

    pub fn original_parameter_name(&self) -> Option<&str> {
        self.original_parameter_name.as_deref()
    }

    /// Parameters this column contributes, current value first.
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        let current = self
            .parameter_name
            .as_ref()
            .map(|name| Parameter::new(name.clone(), self.value.clone()));
        let original = self
            .original_parameter_name
            .as_ref()
            .map(|name| Parameter::new(name.clone(), self.original_value.clone()));
        current.into_iter().chain(original)
    }
}
