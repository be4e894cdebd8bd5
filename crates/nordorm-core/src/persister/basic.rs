use crate::{
    cache::{CacheError, CacheProvider, SecondLevelCache},
    error::BoxError,
    metadata::MetadataStore,
    model::{CollectionMapping, EntityMapping, Polymorphism, TypeKey},
    persister::{CollectionPersister, EntityPersister, PersisterFactory},
    settings::FactorySettings,
};
use std::{
    any::Any,
    fmt,
    sync::{Arc, OnceLock},
};
use tracing::debug;

///
/// BasicEntityPersister
///
/// Metadata-only persister built straight from an `EntityMapping`.
///

pub struct BasicEntityPersister {
    mapping: EntityMapping,
    cache: Option<Arc<dyn SecondLevelCache>>,
    superclass_name: OnceLock<String>,
}

impl BasicEntityPersister {
    #[must_use]
    pub fn new(mapping: EntityMapping, cache: Option<Arc<dyn SecondLevelCache>>) -> Self {
        Self {
            mapping,
            cache,
            superclass_name: OnceLock::new(),
        }
    }

    /// Entity name of the mapped superclass, resolved by `post_instantiate`.
    #[must_use]
    pub fn superclass_entity_name(&self) -> Option<&str> {
        self.superclass_name.get().map(String::as_str)
    }

    #[must_use]
    pub const fn mapping(&self) -> &EntityMapping {
        &self.mapping
    }
}

impl fmt::Debug for BasicEntityPersister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicEntityPersister")
            .field("entity_name", &self.mapping.entity_name)
            .field("mapped_type", &self.mapping.type_key)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl EntityPersister for BasicEntityPersister {
    fn entity_name(&self) -> &str {
        &self.mapping.entity_name
    }

    fn qualified_name(&self) -> &str {
        &self.mapping.qualified_name
    }

    fn mapped_type(&self) -> TypeKey {
        self.mapping.type_key
    }

    fn supertypes(&self) -> &[TypeKey] {
        &self.mapping.supertypes
    }

    fn mapped_superclass(&self) -> Option<TypeKey> {
        self.mapping.superclass
    }

    fn is_queryable(&self) -> bool {
        self.mapping.queryable
    }

    fn polymorphism(&self) -> Polymorphism {
        self.mapping.polymorphism
    }

    fn identifier_property_name(&self) -> Option<&str> {
        self.mapping.identifier_name.as_deref()
    }

    fn identifier_type(&self) -> &str {
        &self.mapping.identifier_type
    }

    fn property_type(&self, property: &str) -> Option<&str> {
        if self.mapping.identifier_name.as_deref() == Some(property) {
            return Some(&self.mapping.identifier_type);
        }

        self.mapping
            .properties
            .iter()
            .find(|candidate| candidate.name == property)
            .map(|candidate| candidate.type_name.as_str())
    }

    fn cache(&self) -> Option<&Arc<dyn SecondLevelCache>> {
        self.cache.as_ref()
    }

    fn post_instantiate(&self, metadata: &MetadataStore) -> Result<(), BoxError> {
        let Some(superclass) = self.mapping.superclass else {
            return Ok(());
        };
        let parent = metadata.entity_persister(superclass)?;
        self.superclass_name
            .get_or_init(|| parent.entity_name().to_string());

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

///
/// BasicCollectionPersister
///

pub struct BasicCollectionPersister {
    mapping: CollectionMapping,
    cache: Option<Arc<dyn SecondLevelCache>>,
}

impl BasicCollectionPersister {
    #[must_use]
    pub fn new(mapping: CollectionMapping, cache: Option<Arc<dyn SecondLevelCache>>) -> Self {
        Self { mapping, cache }
    }
}

impl fmt::Debug for BasicCollectionPersister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCollectionPersister")
            .field("role", &self.mapping.role)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl CollectionPersister for BasicCollectionPersister {
    fn role(&self) -> &str {
        &self.mapping.role
    }

    fn owner(&self) -> Option<TypeKey> {
        self.mapping.owner
    }

    fn element_type(&self) -> Option<&str> {
        self.mapping.element_type.as_deref()
    }

    fn cache(&self) -> Option<&Arc<dyn SecondLevelCache>> {
        self.cache.as_ref()
    }
}

///
/// BasicPersisterFactory
///
/// Default persister factory. Cache regions named by mappings are built
/// through the optional cache provider; without one, mappings stay uncached.
///

#[derive(Debug, Default)]
pub struct BasicPersisterFactory {
    cache_provider: Option<Arc<dyn CacheProvider>>,
}

impl BasicPersisterFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cache_provider(cache_provider: Arc<dyn CacheProvider>) -> Self {
        Self {
            cache_provider: Some(cache_provider),
        }
    }

    fn region_cache(
        &self,
        region: Option<&str>,
    ) -> Result<Option<Arc<dyn SecondLevelCache>>, BoxError> {
        let Some(region) = region else {
            return Ok(None);
        };
        let Some(provider) = &self.cache_provider else {
            debug!(region, "cache region declared without a cache provider");
            return Ok(None);
        };

        let cache = provider
            .build_cache(region)
            .map_err(|source| CacheError::Build {
                region: region.to_string(),
                source,
            })?;

        Ok(Some(cache))
    }
}

impl PersisterFactory for BasicPersisterFactory {
    fn build_entity_persister(
        &self,
        mapping: &EntityMapping,
        _settings: &FactorySettings,
    ) -> Result<Arc<dyn EntityPersister>, BoxError> {
        let cache = self.region_cache(mapping.cache_region.as_deref())?;

        Ok(Arc::new(BasicEntityPersister::new(mapping.clone(), cache)))
    }

    fn build_collection_persister(
        &self,
        mapping: &CollectionMapping,
        _settings: &FactorySettings,
    ) -> Result<Arc<dyn CollectionPersister>, BoxError> {
        let cache = self.region_cache(mapping.cache_region.as_deref())?;

        Ok(Arc::new(BasicCollectionPersister::new(mapping.clone(), cache)))
    }
}
