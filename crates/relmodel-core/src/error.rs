//! Error types for relmodel operations.

use std::fmt;

/// The primary error type for all relmodel operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid model or context configuration
    Config(ConfigError),
    /// Strict lookup of a named item failed
    NotFound(NotFoundError),
    /// Value or instance type conversion errors
    Type(TypeError),
    /// Persisting a change set failed
    Update(UpdateError),
    /// Failure reported by the store executor
    Store(StoreError),
    /// Query translation reached an expression it cannot handle
    Translation(TranslationError),
}

#[derive(Debug)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// Key or foreign key built from properties of different entity types
    InconsistentEntityType,
    /// A required argument was empty
    EmptyArgument,
    /// Migration identifier does not follow the timestamp_name format
    InvalidMigrationId,
    /// Property name declared twice on one entity type
    DuplicateProperty,
    /// Foreign key and principal key have different arity
    KeyArityMismatch,
    /// Context options are missing a required service
    MissingService,
}

#[derive(Debug, Clone)]
pub struct NotFoundError {
    pub kind: NotFoundKind,
    pub name: String,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Property,
    EntityType,
    Key,
    Sidecar,
    SelectExpression,
    Accessor,
}

impl NotFoundKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NotFoundKind::Property => "property",
            NotFoundKind::EntityType => "entity type",
            NotFoundKind::Key => "key",
            NotFoundKind::Sidecar => "sidecar",
            NotFoundKind::SelectExpression => "select expression",
            NotFoundKind::Accessor => "property accessor",
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub property: Option<String>,
}

#[derive(Debug)]
pub struct UpdateError {
    pub kind: UpdateErrorKind,
    pub message: String,
    pub command: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateErrorKind {
    /// The store affected a different number of rows than expected
    Concurrency,
    /// The store returned a result of the wrong shape
    UnexpectedResult,
}

#[derive(Debug)]
pub struct StoreError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Raised when the filtering translator visits a node it neither handles
/// nor recognizes as untranslatable. Never recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    Unhandled { node: String },
}

impl Error {
    /// Build a configuration error of the given kind.
    pub fn config(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            kind,
            message: message.into(),
            source: None,
        })
    }

    /// Build a not-found error for `name`.
    pub fn not_found(kind: NotFoundKind, name: impl Into<String>) -> Self {
        Error::NotFound(NotFoundError {
            kind,
            name: name.into(),
            owner: None,
        })
    }

    /// Build a not-found error for `name` inside `owner`.
    pub fn not_found_in(
        kind: NotFoundKind,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Error::NotFound(NotFoundError {
            kind,
            name: name.into(),
            owner: Some(owner.into()),
        })
    }

    /// Is this an optimistic concurrency failure?
    pub fn is_concurrency_failure(&self) -> bool {
        matches!(self, Error::Update(u) if u.kind == UpdateErrorKind::Concurrency)
    }

    /// The kind of configuration error, if this is one.
    pub fn config_kind(&self) -> Option<ConfigErrorKind> {
        match self {
            Error::Config(c) => Some(c.kind),
            _ => None,
        }
    }

    /// The kind of missing item, if this is a lookup miss.
    pub fn not_found_kind(&self) -> Option<NotFoundKind> {
        match self {
            Error::NotFound(n) => Some(n.kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::NotFound(e) => write!(f, "Not found: {}", e),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Update(e) => write!(f, "Update error: {}", e.message),
            Error::Store(e) => write!(f, "Store error: {}", e.message),
            Error::Translation(e) => write!(f, "Translation error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Store(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Translation(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(owner) = &self.owner {
            write!(f, "{} '{}' on '{}'", self.kind.as_str(), self.name, owner)
        } else {
            write!(f, "{} '{}'", self.kind.as_str(), self.name)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(property) = &self.property {
            write!(
                f,
                "expected {} for property '{}', found {}",
                self.expected, property, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::Unhandled { node } => {
                write!(f, "filter expression not handled: {}", node)
            }
        }
    }
}

impl std::error::Error for TranslationError {}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<NotFoundError> for Error {
    fn from(err: NotFoundError) -> Self {
        Error::NotFound(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<UpdateError> for Error {
    fn from(err: UpdateError) -> Self {
        Error::Update(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

impl From<TranslationError> for Error {
    fn from(err: TranslationError) -> Self {
        Error::Translation(err)
    }
}

/// Result type alias for relmodel operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_found_display_names_owner() {
        let err = Error::not_found_in(NotFoundKind::Property, "Nickname", "Customer");
        assert_eq!(
            err.to_string(),
            "Not found: property 'Nickname' on 'Customer'"
        );
        assert_eq!(err.not_found_kind(), Some(NotFoundKind::Property));
    }

    #[test]
    fn translation_error_is_exposed_as_source() {
        let err = Error::from(TranslationError::Unhandled {
            node: "QuerySourceRef(c)".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Translation error: filter expression not handled: QuerySourceRef(c)"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn concurrency_flag() {
        let err = Error::Update(UpdateError {
            kind: UpdateErrorKind::Concurrency,
            message: "expected 1 row, store affected 0".to_string(),
            command: None,
        });
        assert!(err.is_concurrency_failure());
        assert!(!Error::config(ConfigErrorKind::EmptyArgument, "x").is_concurrency_failure());
    }
}
