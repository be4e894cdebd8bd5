use crate::connection::{Connection, ConnectionError, ConnectionProvider};
use std::sync::Arc;
use tracing::{debug, warn};

///
/// ConnectionGateway
///

#[derive(Clone, Debug)]
pub struct ConnectionGateway {
    provider: Arc<dyn ConnectionProvider>,
}

impl ConnectionGateway {
    #[must_use]
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    pub fn open(&self) -> Result<Box<dyn Connection>, ConnectionError> {
        let connection = self
            .provider
            .acquire()
            .map_err(|source| ConnectionError::Open { source })?;
        debug!(connection = ?connection, "connection acquired");

        Ok(connection)
    }

    pub fn close(&self, connection: Box<dyn Connection>) -> Result<(), ConnectionError> {
        let label = format!("{connection:?}");

        self.provider.release(connection).map_err(|source| {
            warn!(connection = %label, error = %source, "connection release failed");
            ConnectionError::Release {
                connection: label.clone(),
                source,
            }
        })?;
        debug!(connection = %label, "connection released");

        Ok(())
    }

    /// Shut down the underlying provider. Called once, from factory close.
    pub fn shutdown(&self) -> Result<(), ConnectionError> {
        self.provider
            .close()
            .map_err(|source| ConnectionError::Shutdown { source })
    }
}
