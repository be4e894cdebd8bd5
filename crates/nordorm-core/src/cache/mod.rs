//! Second-level cache boundary. Regions are owned by their persister and are
//! only destroyed by factory close.

mod memory;

pub use memory::{MemoryCache, MemoryCacheProvider};

use crate::{error::BoxError, model::Identifier};
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// CacheError
///

#[derive(Debug, ThisError)]
pub enum CacheError {
    #[error("failed to evict '{key}' from cache region '{region}': {source}")]
    Remove {
        region: String,
        key: String,
        source: BoxError,
    },

    #[error("failed to clear cache region '{region}': {source}")]
    Clear { region: String, source: BoxError },

    #[error("failed to destroy cache region '{region}': {source}")]
    Destroy { region: String, source: BoxError },

    #[error("failed to build cache region '{region}': {source}")]
    Build { region: String, source: BoxError },
}

///
/// SecondLevelCache
///
/// Cross-session cache region for entity or collection state.
///

pub trait SecondLevelCache: Send + Sync + fmt::Debug {
    fn region(&self) -> &str;

    fn remove(&self, key: &Identifier) -> Result<(), BoxError>;

    fn clear(&self) -> Result<(), BoxError>;

    fn destroy(&self) -> Result<(), BoxError>;
}

///
/// CacheProvider
/// Builds cache regions for persisters that declare one.
///

pub trait CacheProvider: Send + Sync + fmt::Debug {
    fn build_cache(&self, region: &str) -> Result<Arc<dyn SecondLevelCache>, BoxError>;
}

// Wrap a region failure with the operation and key that triggered it.
pub(crate) fn remove_from(
    cache: &dyn SecondLevelCache,
    key: &Identifier,
) -> Result<(), CacheError> {
    cache.remove(key).map_err(|source| CacheError::Remove {
        region: cache.region().to_string(),
        key: key.to_string(),
        source,
    })
}

pub(crate) fn clear(cache: &dyn SecondLevelCache) -> Result<(), CacheError> {
    cache.clear().map_err(|source| CacheError::Clear {
        region: cache.region().to_string(),
        source,
    })
}

pub(crate) fn destroy(cache: &dyn SecondLevelCache) -> Result<(), CacheError> {
    cache.destroy().map_err(|source| CacheError::Destroy {
        region: cache.region().to_string(),
        source,
    })
}
