//! Identifier delimiting, literal escaping and migration identifiers.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConfigError, ConfigErrorKind, Error, Result};

/// Delimit an identifier with ANSI double quotes.
///
/// Embedded double quotes are doubled (`"` → `""`).
///
/// ```
/// use relmodel_core::delimit_identifier;
///
/// assert_eq!(delimit_identifier("Customers"), "\"Customers\"");
/// assert_eq!(delimit_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
#[inline]
pub fn delimit_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Delimit an identifier with MySQL backticks.
#[inline]
pub fn delimit_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Render a string literal in single quotes, doubling embedded quotes.
///
/// ```
/// use relmodel_core::generate_literal;
///
/// assert_eq!(generate_literal("O'Brien"), "'O''Brien'");
/// ```
#[inline]
pub fn generate_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}

/// A table name with an optional schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaQualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl SchemaQualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    pub fn is_schema_qualified(&self) -> bool {
        self.schema.is_some()
    }
}

impl fmt::Display for SchemaQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

const MIGRATION_ID_PATTERN: &str = r"^\d{15}_.+$";

fn migration_id_regex() -> Result<&'static Regex> {
    static REGEX: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(MIGRATION_ID_PATTERN))
        .as_ref()
        .map_err(|e| {
            Error::Config(ConfigError {
                kind: ConfigErrorKind::InvalidMigrationId,
                message: format!("migration id pattern failed to compile: {}", e),
                source: Some(Box::new(e.clone())),
            })
        })
}

/// A migration identifier: a 15 digit timestamp, an underscore and a name,
/// e.g. `201410241421441_Initial`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MigrationId(String);

impl MigrationId {
    /// Validate and wrap a migration identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::config(
                ConfigErrorKind::EmptyArgument,
                "migration id must not be empty",
            ));
        }
        if !migration_id_regex()?.is_match(&id) {
            return Err(Error::config(
                ConfigErrorKind::InvalidMigrationId,
                format!(
                    "'{}' is not a valid migration id; expected <15 digit timestamp>_<name>",
                    id
                ),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 15 digit timestamp prefix.
    pub fn timestamp(&self) -> &str {
        &self.0[..15]
    }

    /// The name after the timestamp.
    pub fn name(&self) -> &str {
        &self.0[16..]
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
