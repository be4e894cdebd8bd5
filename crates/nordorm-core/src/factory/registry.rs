use crate::{
    factory::{FactoryIdentity, FactoryReference, IdentityError, SessionFactory},
    settings::redact_properties,
};
use parking_lot::RwLock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Weak},
};
use thiserror::Error as ThisError;
use tracing::{debug, info};
use uuid::Uuid;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("session factory {0} already registered")]
    AlreadyRegistered(Uuid),
}

struct RegistryEntry {
    name: Option<String>,
    factory: Weak<SessionFactory>,
    properties: BTreeMap<String, String>,
}

// Names map to every uuid registered under them, oldest first.
#[derive(Default)]
struct RegistryState {
    by_uuid: HashMap<Uuid, RegistryEntry>,
    by_name: HashMap<String, Vec<Uuid>>,
}

impl RegistryState {
    fn remove(&mut self, uuid: Uuid) -> Option<RegistryEntry> {
        let entry = self.by_uuid.remove(&uuid)?;

        if let Some(name) = &entry.name
            && let Some(uuids) = self.by_name.get_mut(name)
        {
            uuids.retain(|candidate| *candidate != uuid);
            if uuids.is_empty() {
                self.by_name.remove(name);
            }
        }

        Some(entry)
    }

    // Entries whose factory was dropped without `close`.
    fn prune_dead(&mut self) {
        let dead: Vec<Uuid> = self
            .by_uuid
            .iter()
            .filter(|(_, entry)| entry.factory.strong_count() == 0)
            .map(|(uuid, _)| *uuid)
            .collect();

        for uuid in dead {
            self.remove(uuid);
            debug!(uuid = %uuid, "pruned dropped session factory");
        }
    }
}

///
/// FactoryRegistry
///
/// Explicit, injectable registry of live factories by uuid and by name.
/// Entries hold weak handles; a factory is kept alive by its owners only.
/// Names need not be unique; a name resolves to the most recent live
/// registration under it. Entries of factories dropped without `close` are
/// pruned on the next registration.
///

#[derive(Default)]
pub struct FactoryRegistry {
    state: RwLock<RegistryState>,
}

impl FactoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live factory. Properties are stored redacted.
    pub fn register(
        &self,
        identity: &FactoryIdentity,
        factory: &Arc<SessionFactory>,
        properties: &BTreeMap<String, String>,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let uuid = identity.uuid();
        state.prune_dead();

        if state.by_uuid.contains_key(&uuid) {
            return Err(RegistryError::AlreadyRegistered(uuid));
        }

        let properties = redact_properties(properties);
        info!(
            uuid = %uuid,
            name = identity.name().unwrap_or("<unnamed>"),
            properties = ?properties,
            "session factory registered"
        );

        if let Some(name) = identity.name() {
            state.by_name.entry(name.to_string()).or_default().push(uuid);
        }
        state.by_uuid.insert(
            uuid,
            RegistryEntry {
                name: identity.name().map(str::to_string),
                factory: Arc::downgrade(factory),
                properties,
            },
        );

        Ok(())
    }

    /// Remove a registration. Returns false (and does nothing) when absent.
    pub fn deregister(&self, identity: &FactoryIdentity) -> bool {
        let mut state = self.state.write();
        let uuid = identity.uuid();

        if state.remove(uuid).is_none() {
            debug!(uuid = %uuid, "deregister of unknown session factory ignored");
            return false;
        }
        info!(uuid = %uuid, "session factory deregistered");

        true
    }

    #[must_use]
    pub fn lookup_by_uuid(&self, uuid: &Uuid) -> Option<Arc<SessionFactory>> {
        self.state
            .read()
            .by_uuid
            .get(uuid)
            .and_then(|entry| entry.factory.upgrade())
    }

    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<SessionFactory>> {
        let state = self.state.read();

        state
            .by_name
            .get(name)?
            .iter()
            .rev()
            .filter_map(|uuid| state.by_uuid.get(uuid))
            .find_map(|entry| entry.factory.upgrade())
    }

    /// Resolve a reconstituted reference: uuid first (same process), then
    /// name (the factory was rebuilt elsewhere under the same name).
    pub fn resolve(
        &self,
        reference: &FactoryReference,
    ) -> Result<Arc<SessionFactory>, IdentityError> {
        if let Some(factory) = self.lookup_by_uuid(&reference.uuid) {
            return Ok(factory);
        }

        reference
            .name
            .as_deref()
            .and_then(|name| self.lookup_by_name(name))
            .ok_or_else(|| IdentityError::Unresolved {
                uuid: reference.uuid,
                name: reference.name.clone(),
            })
    }

    /// Redacted properties recorded at registration.
    #[must_use]
    pub fn properties(&self, uuid: &Uuid) -> Option<BTreeMap<String, String>> {
        self.state
            .read()
            .by_uuid
            .get(uuid)
            .map(|entry| entry.properties.clone())
    }

    #[must_use]
    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.state.read().by_uuid.contains_key(uuid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().by_uuid.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
