use crate::{
    cache::{CacheProvider, SecondLevelCache},
    error::BoxError,
    model::Identifier,
};
use parking_lot::{Mutex, RwLock};
use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

type CachedState = Arc<dyn Any + Send + Sync>;

///
/// MemoryCache
///
/// Process-local cache region backed by a hash map. Every operation after
/// `destroy` fails.
///

pub struct MemoryCache {
    region: String,
    entries: RwLock<Option<HashMap<Identifier, CachedState>>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            entries: RwLock::new(Some(HashMap::new())),
        }
    }

    pub fn put(&self, key: Identifier, state: CachedState) -> Result<(), BoxError> {
        let mut entries = self.entries.write();
        let entries = entries.as_mut().ok_or_else(|| self.destroyed())?;
        entries.insert(key, state);

        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &Identifier) -> Option<CachedState> {
        self.entries
            .read()
            .as_ref()
            .and_then(|entries| entries.get(key).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().as_ref().map_or(0, HashMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.entries.read().is_none()
    }

    fn destroyed(&self) -> BoxError {
        format!("cache region '{}' has been destroyed", self.region).into()
    }
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("region", &self.region)
            .field("entries", &self.len())
            .finish()
    }
}

impl SecondLevelCache for MemoryCache {
    fn region(&self) -> &str {
        &self.region
    }

    fn remove(&self, key: &Identifier) -> Result<(), BoxError> {
        let mut entries = self.entries.write();
        let entries = entries.as_mut().ok_or_else(|| self.destroyed())?;
        entries.remove(key);

        Ok(())
    }

    fn clear(&self) -> Result<(), BoxError> {
        let mut entries = self.entries.write();
        let entries = entries.as_mut().ok_or_else(|| self.destroyed())?;
        entries.clear();

        Ok(())
    }

    fn destroy(&self) -> Result<(), BoxError> {
        self.entries.write().take();

        Ok(())
    }
}

///
/// MemoryCacheProvider
/// Hands out one `MemoryCache` per region name, shared across persisters.
///

#[derive(Debug, Default)]
pub struct MemoryCacheProvider {
    regions: Mutex<BTreeMap<String, Arc<MemoryCache>>>,
}

impl MemoryCacheProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn region(&self, name: &str) -> Option<Arc<MemoryCache>> {
        self.regions.lock().get(name).cloned()
    }
}

impl CacheProvider for MemoryCacheProvider {
    fn build_cache(&self, region: &str) -> Result<Arc<dyn SecondLevelCache>, BoxError> {
        let cache = self
            .regions
            .lock()
            .entry(region.to_string())
            .or_insert_with(|| Arc::new(MemoryCache::new(region)))
            .clone();

        Ok(cache)
    }
}
