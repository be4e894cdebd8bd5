//! Persistence metadata store: built once from the mapping configuration and
//! read without locking for the factory's lifetime.

mod imports;


pub use imports::ImportTable;

use crate::{
    model::{CollectionMapping, EntityMapping, Polymorphism, TypeKey},
    persister::{CollectionPersister, EntityPersister, MappingError, PersisterFactory},
    settings::FactorySettings,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};
use thiserror::Error as ThisError;

///
/// MetadataError
///

#[derive(Debug, ThisError)]
pub enum MetadataError {
    #[error("no persister for type '{0}'")]
    EntityTypeNotFound(String),

    #[error("no persister for entity '{0}'")]
    EntityNotFound(String),

    #[error("no persister for collection role '{0}'")]
    CollectionNotFound(String),

    #[error("named query '{0}' not found")]
    NamedQueryNotFound(String),

    #[error("entity '{entity}' has no property '{property}'")]
    PropertyNotFound { entity: String, property: String },
}

///
/// MetadataSource
/// Everything the store is built from, borrowed from the configuration snapshot.
///

pub struct MetadataSource<'a> {
    pub entities: &'a [EntityMapping],
    pub collections: &'a [CollectionMapping],
    pub named_queries: &'a BTreeMap<String, String>,
    pub imports: &'a BTreeMap<String, String>,
}

///
/// MetadataStore
///

#[derive(Debug)]
pub struct MetadataStore {
    entities: Vec<Arc<dyn EntityPersister>>,
    by_type: HashMap<TypeKey, Arc<dyn EntityPersister>>,
    by_name: HashMap<String, Arc<dyn EntityPersister>>,
    collections: BTreeMap<String, Arc<dyn CollectionPersister>>,
    ancestors: HashMap<TypeKey, HashSet<TypeKey>>,
    named_queries: BTreeMap<String, String>,
    imports: ImportTable,
}

impl MetadataStore {
    /// Build every persister, then link them. Linking runs only once the
    /// whole store is populated so persisters can resolve their siblings.
    pub fn build(
        source: &MetadataSource<'_>,
        persisters: &dyn PersisterFactory,
        settings: &FactorySettings,
    ) -> Result<Self, MappingError> {
        let mut store = Self {
            entities: Vec::with_capacity(source.entities.len()),
            by_type: HashMap::with_capacity(source.entities.len()),
            by_name: HashMap::with_capacity(source.entities.len() * 2),
            collections: BTreeMap::new(),
            ancestors: HashMap::new(),
            named_queries: source.named_queries.clone(),
            imports: ImportTable::new(source.imports.clone()),
        };

        for mapping in source.entities {
            let persister = persisters
                .build_entity_persister(mapping, settings)
                .map_err(|source| MappingError::Build {
                    target: mapping.entity_name.clone(),
                    source,
                })?;
            store.register_entity(persister)?;
        }

        for mapping in source.collections {
            let persister = persisters
                .build_collection_persister(mapping, settings)
                .map_err(|source| MappingError::Build {
                    target: mapping.role.clone(),
                    source,
                })?;
            store.register_collection(persister)?;
        }

        store.resolve_ancestors();

        for persister in &store.entities {
            persister
                .post_instantiate(&store)
                .map_err(|source| MappingError::PostInstantiate {
                    entity: persister.entity_name().to_string(),
                    source,
                })?;
        }

        Ok(store)
    }

    fn register_entity(&mut self, persister: Arc<dyn EntityPersister>) -> Result<(), MappingError> {
        let key = persister.mapped_type();
        if self.by_type.contains_key(&key) {
            return Err(MappingError::DuplicateType {
                type_name: key.name().to_string(),
            });
        }

        for alias in [persister.entity_name(), persister.qualified_name()] {
            if let Some(existing) = self.by_name.get(alias)
                && !Arc::ptr_eq(existing, &persister)
            {
                return Err(MappingError::DuplicateName {
                    name: alias.to_string(),
                    existing: existing.entity_name().to_string(),
                });
            }
        }

        self.by_name
            .insert(persister.entity_name().to_string(), Arc::clone(&persister));
        self.by_name
            .insert(persister.qualified_name().to_string(), Arc::clone(&persister));
        self.by_type.insert(key, Arc::clone(&persister));
        self.entities.push(persister);

        Ok(())
    }

    fn register_collection(
        &mut self,
        persister: Arc<dyn CollectionPersister>,
    ) -> Result<(), MappingError> {
        let role = persister.role().to_string();
        if self.collections.contains_key(&role) {
            return Err(MappingError::DuplicateRole(role));
        }
        self.collections.insert(role, persister);

        Ok(())
    }

    // Transitive supertypes per mapped type, following mapped supertypes.
    fn resolve_ancestors(&mut self) {
        let mut ancestors = HashMap::with_capacity(self.entities.len());

        for persister in &self.entities {
            let mut seen = HashSet::new();
            let mut pending: Vec<TypeKey> = persister.supertypes().to_vec();

            while let Some(ty) = pending.pop() {
                if !seen.insert(ty) {
                    continue;
                }
                if let Some(parent) = self.by_type.get(&ty) {
                    pending.extend_from_slice(parent.supertypes());
                }
            }
            ancestors.insert(persister.mapped_type(), seen);
        }

        self.ancestors = ancestors;
    }

    //
    // Lookups
    //

    pub fn entity_persister(&self, ty: TypeKey) -> Result<&Arc<dyn EntityPersister>, MetadataError> {
        self.by_type
            .get(&ty)
            .ok_or_else(|| MetadataError::EntityTypeNotFound(ty.name().to_string()))
    }

    pub fn entity_persister_by_name(
        &self,
        name: &str,
    ) -> Result<&Arc<dyn EntityPersister>, MetadataError> {
        self.find_entity_persister(name)
            .ok_or_else(|| MetadataError::EntityNotFound(name.to_string()))
    }

    /// Name lookup that reports absence as `None`.
    #[must_use]
    pub fn find_entity_persister(&self, name: &str) -> Option<&Arc<dyn EntityPersister>> {
        self.by_name.get(name)
    }

    pub fn collection_persister(
        &self,
        role: &str,
    ) -> Result<&Arc<dyn CollectionPersister>, MetadataError> {
        self.collections
            .get(role)
            .ok_or_else(|| MetadataError::CollectionNotFound(role.to_string()))
    }

    pub fn named_query(&self, name: &str) -> Result<&str, MetadataError> {
        self.named_queries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| MetadataError::NamedQueryNotFound(name.to_string()))
    }

    /// Resolve an import alias; unknown names come back unchanged.
    #[must_use]
    pub fn imported_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.imports.resolve(name)
    }

    #[must_use]
    pub fn is_assignable(&self, target: TypeKey, ty: TypeKey) -> bool {
        target == ty
            || self
                .ancestors
                .get(&ty)
                .is_some_and(|ancestors| ancestors.contains(&target))
    }

    /// Mapped names a query against `ty` must visit.
    ///
    /// An explicit-polymorphism entity matching `ty` exactly short-circuits
    /// the scan. Inherited subtypes are skipped when their mapped superclass
    /// is itself assignable to `ty`, since the superclass query covers them.
    pub fn implementors(&self, ty: TypeKey) -> Result<Vec<String>, MetadataError> {
        let mut results = Vec::new();

        for persister in self.entities.iter().filter(|p| p.is_queryable()) {
            let mapped = persister.mapped_type();
            let is_mapped_type = mapped == ty;

            if persister.polymorphism() == Polymorphism::Explicit {
                if is_mapped_type {
                    return Ok(vec![persister.entity_name().to_string()]);
                }
                continue;
            }

            if is_mapped_type {
                results.push(persister.entity_name().to_string());
            } else if self.is_assignable(ty, mapped) {
                let covered_by_superclass = match persister.mapped_superclass() {
                    Some(superclass) => {
                        let parent = self.entity_persister(superclass)?;
                        self.is_assignable(ty, parent.mapped_type())
                    }
                    None => false,
                };
                if !covered_by_superclass {
                    results.push(persister.entity_name().to_string());
                }
            }
        }

        Ok(results)
    }

    //
    // Listing
    //

    pub fn entity_persisters(&self) -> impl Iterator<Item = &Arc<dyn EntityPersister>> {
        self.entities.iter()
    }

    pub fn collection_persisters(&self) -> impl Iterator<Item = &Arc<dyn CollectionPersister>> {
        self.collections.values()
    }

    #[must_use]
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|p| p.entity_name()).collect()
    }

    #[must_use]
    pub fn collection_roles(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn named_query_names(&self) -> Vec<&str> {
        self.named_queries.keys().map(String::as_str).collect()
    }
}
