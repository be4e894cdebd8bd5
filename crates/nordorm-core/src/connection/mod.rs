//! Connection gateway: synchronous wrapper over the external connection
//! provider that turns provider failures into `ConnectionError`.

mod gateway;

pub use gateway::ConnectionGateway;

use crate::error::BoxError;
use std::{any::Any, fmt};
use thiserror::Error as ThisError;

///
/// ConnectionError
///

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("failed to open connection: {source}")]
    Open { source: BoxError },

    #[error("failed to release connection {connection}: {source}")]
    Release { connection: String, source: BoxError },

    #[error("failed to shut down connection provider: {source}")]
    Shutdown { source: BoxError },

    #[error("session is disconnected and does not manage its own connection")]
    Disconnected,
}

///
/// Connection
///
/// Live database connection handle. Owned by exactly one party at a time:
/// the caller that supplied it, or the session that acquired it.
///

pub trait Connection: Send + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

///
/// ConnectionProvider
/// External acquire/release plumbing.
///

pub trait ConnectionProvider: Send + Sync + fmt::Debug {
    fn acquire(&self) -> Result<Box<dyn Connection>, BoxError>;

    fn release(&self, connection: Box<dyn Connection>) -> Result<(), BoxError>;

    fn close(&self) -> Result<(), BoxError>;
}
