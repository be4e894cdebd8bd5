use derive_more::Display;
use nordorm_core::{
    error::{ErrorOrigin as CoreErrorOrigin, FactoryError},
    factory::IdentityError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }
}

impl From<FactoryError> for Error {
    fn from(err: FactoryError) -> Self {
        let kind = match &err {
            FactoryError::Metadata(_) => ErrorKind::NotFound,
            FactoryError::Query(_) | FactoryError::Mapping(_) => ErrorKind::Query,
            FactoryError::Connection(_) | FactoryError::Cache(_) => ErrorKind::Connection,
            FactoryError::Identity(_) => ErrorKind::Identity,
            FactoryError::Config(_) => ErrorKind::Config,
            FactoryError::AssertionFailure(_) | FactoryError::Closed { .. } => ErrorKind::Internal,
        };

        Self::new(kind, err.origin().into(), err.to_string())
    }
}

impl From<IdentityError> for Error {
    fn from(err: IdentityError) -> Self {
        FactoryError::from(err).into()
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Persister, collection role, named query, or property is not mapped.
    NotFound,

    /// Query or mapping could not be expanded or compiled.
    Query,

    /// Connection provider or cache region failed.
    Connection,

    /// A factory reference did not resolve.
    Identity,

    Config,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
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

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Cache => Self::Cache,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Connection => Self::Connection,
            CoreErrorOrigin::Factory => Self::Factory,
            CoreErrorOrigin::Mapping => Self::Mapping,
            CoreErrorOrigin::Metadata => Self::Metadata,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Registry => Self::Registry,
        }
    }
}
