//! Unit-of-work sessions opened by a `SessionFactory`.

use crate::{
    connection::{Connection, ConnectionError},
    error::FactoryError,
    factory::SessionFactory,
    obs::MetricsEvent,
    query::{FilterTranslator, QueryTranslator},
};
use std::{fmt, mem, sync::Arc};
use tracing::{debug, warn};

///
/// Interceptor
/// Session lifecycle callbacks; every method defaults to a no-op.
///

pub trait Interceptor: Send + Sync + fmt::Debug {
    fn on_session_open(&self, _timestamp: u64) {}

    fn on_session_close(&self, _timestamp: u64) {}
}

///
/// EmptyInterceptor
///

#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyInterceptor;

impl Interceptor for EmptyInterceptor {}

// Who owns the connection currently held by the session.
#[derive(Debug, Default)]
enum SessionConnection {
    #[default]
    None,
    /// Acquired from the factory; released by the session.
    Owned(Box<dyn Connection>),
    /// Supplied by the caller; handed back on disconnect or close.
    Supplied(Box<dyn Connection>),
}

///
/// Session
///
/// Short-lived unit of work bound to one factory. With auto-close the
/// session acquires a connection on first use and releases it on close;
/// otherwise the caller's connection is used and returned untouched.
///

pub struct Session {
    factory: Arc<SessionFactory>,
    connection: SessionConnection,
    interceptor: Arc<dyn Interceptor>,
    auto_close: bool,
    timestamp: u64,
    closed: bool,
}

impl Session {
    pub(crate) fn new(
        factory: Arc<SessionFactory>,
        connection: Option<Box<dyn Connection>>,
        interceptor: Arc<dyn Interceptor>,
        timestamp: u64,
    ) -> Self {
        let auto_close = connection.is_none();
        let connection = connection.map_or(SessionConnection::None, SessionConnection::Supplied);

        Self {
            factory,
            connection,
            interceptor,
            auto_close,
            timestamp,
            closed: false,
        }
    }

    #[must_use]
    pub const fn factory(&self) -> &Arc<SessionFactory> {
        &self.factory
    }

    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    #[must_use]
    pub const fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    #[must_use]
    pub const fn is_auto_close(&self) -> bool {
        self.auto_close
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        !matches!(self.connection, SessionConnection::None)
    }

    /// Current connection, acquiring one from the factory when the session
    /// manages its own.
    pub fn connection(&mut self) -> Result<&dyn Connection, FactoryError> {
        if matches!(self.connection, SessionConnection::None) {
            if !self.auto_close {
                return Err(ConnectionError::Disconnected.into());
            }
            self.connection = SessionConnection::Owned(self.factory.open_connection()?);
        }

        match &self.connection {
            SessionConnection::Owned(connection) | SessionConnection::Supplied(connection) => {
                Ok(connection.as_ref())
            }
            SessionConnection::None => Err(ConnectionError::Disconnected.into()),
        }
    }

    /// Release a factory-acquired connection, or hand a supplied one back.
    pub fn disconnect(&mut self) -> Result<Option<Box<dyn Connection>>, FactoryError> {
        match mem::take(&mut self.connection) {
            SessionConnection::None => Ok(None),
            SessionConnection::Supplied(connection) => Ok(Some(connection)),
            SessionConnection::Owned(connection) => {
                self.factory.close_connection(connection)?;
                Ok(None)
            }
        }
    }

    /// Attach a caller-supplied connection. A factory-acquired connection is
    /// released first; a previously supplied one is handed back.
    pub fn reconnect(
        &mut self,
        connection: Box<dyn Connection>,
    ) -> Result<Option<Box<dyn Connection>>, FactoryError> {
        let previous = self.disconnect()?;
        self.connection = SessionConnection::Supplied(connection);
        self.auto_close = false;

        Ok(previous)
    }

    /// Compile `query` through the factory's translator cache.
    pub fn create_query(&self, query: &str) -> Result<Arc<dyn QueryTranslator>, FactoryError> {
        self.factory.get_query(query, false)
    }

    /// Compile the named query registered under `name`.
    pub fn named_query(&self, name: &str) -> Result<Arc<dyn QueryTranslator>, FactoryError> {
        let query = self.factory.named_query(name)?;

        self.factory.get_query(query, false)
    }

    /// Compile a filter over the elements of collection `role`.
    pub fn create_filter(
        &self,
        role: &str,
        filter: &str,
    ) -> Result<Arc<dyn FilterTranslator>, FactoryError> {
        self.factory.get_filter(filter, role, false)
    }

    /// End the unit of work. Returns the caller-supplied connection, if any.
    pub fn close(mut self) -> Result<Option<Box<dyn Connection>>, FactoryError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<Option<Box<dyn Connection>>, FactoryError> {
        self.closed = true;
        let result = self.disconnect();

        self.interceptor.on_session_close(self.timestamp);
        self.factory.record(MetricsEvent::SessionClosed);
        debug!(timestamp = self.timestamp, "session closed");

        result
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("timestamp", &self.timestamp)
            .field("auto_close", &self.auto_close)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.finish() {
            warn!(timestamp = self.timestamp, error = %err, "session drop failed to release connection");
        }
    }
}
