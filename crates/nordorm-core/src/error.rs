use crate::{
    cache::CacheError,
    connection::ConnectionError,
    factory::IdentityError,
    metadata::MetadataError,
    persister::MappingError,
    query::QueryError,
    settings::ConfigError,
};
use std::fmt;
use thiserror::Error as ThisError;

/// Boxed failure reported by an external collaborator (provider, persister,
/// compiler, cache region). Always wrapped with context before it escapes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

///
/// FactoryError
///
/// Error surfaced by every fallible session-factory operation.
/// Collaborator failures are wrapped with the operation and key that failed.
///

#[derive(Debug, ThisError)]
pub enum FactoryError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("assertion failure: {0}")]
    AssertionFailure(String),

    #[error("session factory '{name}' is closed")]
    Closed { name: String },
}

impl FactoryError {
    pub(crate) fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailure(message.into())
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Metadata(_) | Self::Identity(_) => ErrorClass::NotFound,
            Self::Query(_) | Self::Config(_) | Self::Mapping(_) => ErrorClass::Invalid,
            Self::Connection(_) | Self::Cache(_) => ErrorClass::Unavailable,
            Self::Closed { .. } => ErrorClass::Closed,
            Self::AssertionFailure(_) => ErrorClass::InvariantViolation,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Cache(_) => ErrorOrigin::Cache,
            Self::Config(_) => ErrorOrigin::Config,
            Self::Connection(_) => ErrorOrigin::Connection,
            Self::Identity(_) => ErrorOrigin::Registry,
            Self::Mapping(_) => ErrorOrigin::Mapping,
            Self::Metadata(_) => ErrorOrigin::Metadata,
            Self::Query(_) => ErrorOrigin::Query,
            Self::AssertionFailure(_) | Self::Closed { .. } => ErrorOrigin::Factory,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class(), ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin(), self.class(), self)
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Invalid,
    Unavailable,
    Closed,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::Unavailable => "unavailable",
            Self::Closed => "closed",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Subsystem that raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Cache,
    Config,
    Connection,
    Factory,
    Mapping,
    Metadata,
    Query,
    Registry,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cache => "cache",
            Self::Config => "config",
            Self::Connection => "connection",
            Self::Factory => "factory",
            Self::Mapping => "mapping",
            Self::Metadata => "metadata",
            Self::Query => "query",
            Self::Registry => "registry",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_errors_classify_as_not_found() {
        let err: FactoryError = MetadataError::NamedQueryNotFound("byName".to_string()).into();

        assert!(err.is_not_found());
        assert_eq!(err.origin(), ErrorOrigin::Metadata);
        assert_eq!(
            err.display_with_class(),
            "metadata:not_found: named query 'byName' not found"
        );
    }

    #[test]
    fn closed_factory_error_names_the_factory() {
        let err = FactoryError::Closed {
            name: "main".to_string(),
        };

        assert_eq!(err.class(), ErrorClass::Closed);
        assert_eq!(err.origin(), ErrorOrigin::Factory);
        assert_eq!(err.to_string(), "session factory 'main' is closed");
    }
}
