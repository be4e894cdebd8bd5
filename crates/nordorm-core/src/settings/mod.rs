//! Capability registry: the immutable settings bundle shared by the factory
//! and every session it opens.

mod config;

pub use config::{ConfigError, FactoryConfig, REDACTED, is_sensitive_key, redact_properties};

use crate::connection::ConnectionProvider;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, num::NonZeroUsize, sync::Arc};

/// Default capacity of the translator cache.
pub const DEFAULT_TRANSLATOR_CACHE_CAPACITY: usize = 128;

/// Token replacements applied by translators at compile time.
pub type QuerySubstitutions = BTreeMap<String, String>;

///
/// Dialect
///
/// Vendor SQL capability. Opaque to the factory; only handed to translators.
///

pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

///
/// TransactionFactory
/// Opaque transaction plumbing carried for sessions.
///

pub trait TransactionFactory: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

///
/// ConnectionTransactionFactory
/// Default transaction factory: transactions ride on the session connection.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectionTransactionFactory;

impl TransactionFactory for ConnectionTransactionFactory {
    fn name(&self) -> &'static str {
        "connection"
    }
}

///
/// IsolationLevel
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

///
/// FactorySettings
///
/// Immutable after construction; cloned handles are cheap.
///

#[derive(Clone, Debug)]
pub struct FactorySettings {
    dialect: Arc<dyn Dialect>,
    connection_provider: Arc<dyn ConnectionProvider>,
    transaction_factory: Arc<dyn TransactionFactory>,
    isolation_level: Option<IsolationLevel>,
    outer_join_fetch: bool,
    default_schema: Option<String>,
    query_substitutions: QuerySubstitutions,
    factory_name: Option<String>,
    translator_cache_capacity: NonZeroUsize,
}

impl FactorySettings {
    pub fn new(
        config: &FactoryConfig,
        dialect: Arc<dyn Dialect>,
        connection_provider: Arc<dyn ConnectionProvider>,
        transaction_factory: Arc<dyn TransactionFactory>,
    ) -> Result<Self, ConfigError> {
        let translator_cache_capacity = NonZeroUsize::new(config.translator_cache_capacity)
            .ok_or(ConfigError::ZeroCacheCapacity)?;

        Ok(Self {
            dialect,
            connection_provider,
            transaction_factory,
            isolation_level: config.isolation_level,
            outer_join_fetch: config.outer_join_fetch,
            default_schema: config.default_schema.clone(),
            query_substitutions: config.query_substitutions.clone(),
            factory_name: config.name.clone(),
            translator_cache_capacity,
        })
    }

    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    #[must_use]
    pub fn connection_provider(&self) -> &Arc<dyn ConnectionProvider> {
        &self.connection_provider
    }

    #[must_use]
    pub fn transaction_factory(&self) -> &Arc<dyn TransactionFactory> {
        &self.transaction_factory
    }

    #[must_use]
    pub const fn isolation_level(&self) -> Option<IsolationLevel> {
        self.isolation_level
    }

    #[must_use]
    pub const fn is_outer_join_fetch_enabled(&self) -> bool {
        self.outer_join_fetch
    }

    #[must_use]
    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    #[must_use]
    pub const fn query_substitutions(&self) -> &QuerySubstitutions {
        &self.query_substitutions
    }

    #[must_use]
    pub fn factory_name(&self) -> Option<&str> {
        self.factory_name.as_deref()
    }

    #[must_use]
    pub const fn translator_cache_capacity(&self) -> NonZeroUsize {
        self.translator_cache_capacity
    }
}
