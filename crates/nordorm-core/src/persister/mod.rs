//! Persister boundary: runtime metadata objects built from mappings by an
//! external persister factory and owned by the metadata store.

mod basic;

pub use basic::{BasicCollectionPersister, BasicEntityPersister, BasicPersisterFactory};

use crate::{
    cache::SecondLevelCache,
    error::BoxError,
    metadata::MetadataStore,
    model::{CollectionMapping, EntityMapping, Polymorphism, TypeKey},
    settings::FactorySettings,
};
use std::{any::Any, fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// MappingError
/// Raised while turning mappings into the metadata store.
///

#[derive(Debug, ThisError)]
pub enum MappingError {
    #[error("type '{type_name}' is mapped more than once")]
    DuplicateType { type_name: String },

    #[error("entity name '{name}' is already registered to '{existing}'")]
    DuplicateName { name: String, existing: String },

    #[error("collection role '{0}' is mapped more than once")]
    DuplicateRole(String),

    #[error("failed to build persister for '{target}': {source}")]
    Build { target: String, source: BoxError },

    #[error("failed to link persister for '{entity}': {source}")]
    PostInstantiate { entity: String, source: BoxError },
}

///
/// EntityPersister
///
/// Metadata for one mapped type. The queryable marker, polymorphism mode,
/// supertypes, and mapped superclass replace runtime type introspection in
/// implementor scans.
///

pub trait EntityPersister: Send + Sync + fmt::Debug {
    /// Canonical mapped name.
    fn entity_name(&self) -> &str;

    /// Fully-qualified type identity alias.
    fn qualified_name(&self) -> &str;

    fn mapped_type(&self) -> TypeKey;

    /// Direct supertypes of the mapped type.
    fn supertypes(&self) -> &[TypeKey];

    /// Mapped superclass; `Some` means the entity is inherited.
    fn mapped_superclass(&self) -> Option<TypeKey>;

    fn is_queryable(&self) -> bool;

    fn polymorphism(&self) -> Polymorphism;

    fn identifier_property_name(&self) -> Option<&str>;

    fn identifier_type(&self) -> &str;

    fn property_type(&self, property: &str) -> Option<&str>;

    fn cache(&self) -> Option<&Arc<dyn SecondLevelCache>>;

    /// Second construction phase; every sibling persister is registered by now.
    fn post_instantiate(&self, metadata: &MetadataStore) -> Result<(), BoxError>;

    /// Concrete persister, for callers that know the implementation.
    fn as_any(&self) -> &dyn Any;
}

///
/// CollectionPersister
///

pub trait CollectionPersister: Send + Sync + fmt::Debug {
    fn role(&self) -> &str;

    fn owner(&self) -> Option<TypeKey>;

    fn element_type(&self) -> Option<&str>;

    /// Cache concurrency strategy for the role, if configured.
    fn cache(&self) -> Option<&Arc<dyn SecondLevelCache>>;
}

///
/// PersisterFactory
///

pub trait PersisterFactory: Send + Sync + fmt::Debug {
    fn build_entity_persister(
        &self,
        mapping: &EntityMapping,
        settings: &FactorySettings,
    ) -> Result<Arc<dyn EntityPersister>, BoxError>;

    fn build_collection_persister(
        &self,
        mapping: &CollectionMapping,
        settings: &FactorySettings,
    ) -> Result<Arc<dyn CollectionPersister>, BoxError>;
}
