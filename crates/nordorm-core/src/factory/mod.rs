//! Session factory facade: the long-lived, thread-shared entry point that owns
//! the metadata store and translator cache and opens sessions.

mod builder;
mod identity;
mod registry;
pub mod timestamp;


pub use builder::SessionFactoryBuilder;
pub use identity::{FactoryIdentity, FactoryReference, IdentityError};
pub use registry::{FactoryRegistry, RegistryError};
pub use timestamp::Timestamper;

use crate::{
    cache,
    connection::{Connection, ConnectionGateway},
    error::FactoryError,
    metadata::{MetadataError, MetadataStore},
    model::{Identifier, TypeKey},
    obs::{EvictionScope, FactoryMetrics, MetricsEvent, MetricsSink, StatisticsReport},
    persister::{CollectionPersister, EntityPersister},
    query::{
        CachedTranslator, CompileContext, FilterTranslator, QueryCompiler, QueryError,
        QueryTranslator, TranslationKey, TranslatorCache,
    },
    session::{Interceptor, Session},
    settings::{Dialect, FactoryConfig, FactorySettings, redact_properties},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::{debug, info, warn};
use uuid::Uuid;

///
/// SessionFactory
///
/// Built once from a configuration snapshot and shared by `Arc` across
/// threads. Everything except the translator cache and the counters is
/// immutable after construction. After `close` every operation that touches
/// the cache, connections, sessions, or second-level caches fails with
/// `FactoryError::Closed`.
///

pub struct SessionFactory {
    identity: FactoryIdentity,
    settings: FactorySettings,
    metadata: MetadataStore,
    translators: TranslatorCache,
    compiler: Arc<dyn QueryCompiler>,
    gateway: ConnectionGateway,
    interceptor: Arc<dyn Interceptor>,
    registry: Arc<FactoryRegistry>,
    properties: BTreeMap<String, String>,
    metrics: FactoryMetrics,
    sink: Option<Arc<dyn MetricsSink>>,
    closed: AtomicBool,
}

impl SessionFactory {
    #[must_use]
    pub fn builder(config: FactoryConfig) -> SessionFactoryBuilder {
        SessionFactoryBuilder::new(config)
    }

    //
    // Identity
    //

    #[must_use]
    pub const fn identity(&self) -> &FactoryIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.identity.uuid()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.identity.name()
    }

    /// Serializable stand-in for this factory.
    #[must_use]
    pub fn reference(&self) -> FactoryReference {
        self.identity.reference()
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<FactoryRegistry> {
        &self.registry
    }

    //
    // Capabilities
    //

    #[must_use]
    pub const fn settings(&self) -> &FactorySettings {
        &self.settings
    }

    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        self.settings.dialect()
    }

    #[must_use]
    pub const fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    #[must_use]
    pub const fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    /// Configuration properties with connection strings and secrets redacted.
    #[must_use]
    pub fn properties(&self) -> BTreeMap<String, String> {
        redact_properties(&self.properties)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    //
    // Sessions
    //

    pub fn open_session(self: &Arc<Self>) -> Result<Session, FactoryError> {
        self.open_session_with(None, None)
    }

    pub fn open_session_with_connection(
        self: &Arc<Self>,
        connection: Box<dyn Connection>,
    ) -> Result<Session, FactoryError> {
        self.open_session_with(Some(connection), None)
    }

    pub fn open_session_with_interceptor(
        self: &Arc<Self>,
        interceptor: Arc<dyn Interceptor>,
    ) -> Result<Session, FactoryError> {
        self.open_session_with(None, Some(interceptor))
    }

    /// Open a unit of work. Without a caller connection the session is
    /// auto-close and acquires its own connection on first use.
    pub fn open_session_with(
        self: &Arc<Self>,
        connection: Option<Box<dyn Connection>>,
        interceptor: Option<Arc<dyn Interceptor>>,
    ) -> Result<Session, FactoryError> {
        self.ensure_open()?;

        let timestamp = timestamp::next();
        let interceptor = interceptor.unwrap_or_else(|| Arc::clone(&self.interceptor));
        interceptor.on_session_open(timestamp);

        let session = Session::new(Arc::clone(self), connection, interceptor, timestamp);
        self.record(MetricsEvent::SessionOpened { timestamp });
        debug!(
            timestamp,
            auto_close = session.is_auto_close(),
            "session opened"
        );

        Ok(session)
    }

    //
    // Metadata
    //

    pub fn persister(&self, ty: TypeKey) -> Result<&Arc<dyn EntityPersister>, FactoryError> {
        Ok(self.metadata.entity_persister(ty)?)
    }

    /// Look up by mapped or qualified name. With `throw_if_missing` false an
    /// unknown name yields `Ok(None)`.
    pub fn persister_by_name(
        &self,
        name: &str,
        throw_if_missing: bool,
    ) -> Result<Option<&Arc<dyn EntityPersister>>, FactoryError> {
        if throw_if_missing {
            Ok(Some(self.metadata.entity_persister_by_name(name)?))
        } else {
            Ok(self.metadata.find_entity_persister(name))
        }
    }

    pub fn collection_persister(
        &self,
        role: &str,
    ) -> Result<&Arc<dyn CollectionPersister>, FactoryError> {
        Ok(self.metadata.collection_persister(role)?)
    }

    pub fn named_query(&self, name: &str) -> Result<&str, FactoryError> {
        Ok(self.metadata.named_query(name)?)
    }

    #[must_use]
    pub fn imported_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.metadata.imported_name(name)
    }

    pub fn implementors(&self, ty: TypeKey) -> Result<Vec<String>, FactoryError> {
        Ok(self.metadata.implementors(ty)?)
    }

    pub fn identifier_type(&self, ty: TypeKey) -> Result<&str, FactoryError> {
        Ok(self.persister(ty)?.identifier_type())
    }

    pub fn identifier_property_name(&self, ty: TypeKey) -> Result<Option<&str>, FactoryError> {
        Ok(self.persister(ty)?.identifier_property_name())
    }

    pub fn property_type(&self, ty: TypeKey, property: &str) -> Result<&str, FactoryError> {
        let persister = self.persister(ty)?;

        persister.property_type(property).ok_or_else(|| {
            MetadataError::PropertyNotFound {
                entity: persister.entity_name().to_string(),
                property: property.to_string(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn entity_names(&self) -> Vec<&str> {
        self.metadata.entity_names()
    }

    #[must_use]
    pub fn collection_roles(&self) -> Vec<&str> {
        self.metadata.collection_roles()
    }

    pub fn all_entity_persisters(&self) -> impl Iterator<Item = &Arc<dyn EntityPersister>> {
        self.metadata.entity_persisters()
    }

    pub fn all_collection_persisters(
        &self,
    ) -> impl Iterator<Item = &Arc<dyn CollectionPersister>> {
        self.metadata.collection_persisters()
    }

    /// Return types of the first concrete query `query` expands to.
    pub fn return_types(&self, query: &str) -> Result<Vec<String>, FactoryError> {
        Ok(self.shallow_first_concrete(query)?.return_types())
    }

    /// Named parameters of the first concrete query `query` expands to.
    pub fn named_parameters(&self, query: &str) -> Result<BTreeSet<String>, FactoryError> {
        Ok(self.shallow_first_concrete(query)?.named_parameters())
    }

    fn shallow_first_concrete(
        &self,
        query: &str,
    ) -> Result<Arc<dyn QueryTranslator>, FactoryError> {
        let concrete = self
            .compiler
            .concrete_queries(query, &self.metadata)
            .map_err(|source| QueryError::Expand {
                query: query.to_string(),
                source,
            })?;
        let first = concrete
            .first()
            .ok_or_else(|| QueryError::NoConcreteQueries(query.to_string()))?;

        self.get_query(first, true)
    }

    //
    // Translators
    //

    /// Cached translator for `(query, shallow)`, compiled against the
    /// current settings on every call.
    pub fn get_query(
        &self,
        query: &str,
        shallow: bool,
    ) -> Result<Arc<dyn QueryTranslator>, FactoryError> {
        self.ensure_open()?;

        let (entry, _) = self
            .translators
            .get_or_insert_with(TranslationKey::query(query, shallow), || {
                CachedTranslator::Query(self.compiler.query_translator(self.settings.dialect()))
            });
        let CachedTranslator::Query(translator) = entry else {
            return Err(FactoryError::assertion(format!(
                "translator cache holds a filter translator under query key '{query}'"
            )));
        };

        translator
            .compile(&self.compile_context(), query, shallow)
            .map_err(|source| QueryError::Compile {
                query: query.to_string(),
                source,
            })?;

        Ok(translator)
    }

    /// Cached filter translator for `(role, filter, scalar)`, compiled on
    /// every call.
    pub fn get_filter(
        &self,
        filter: &str,
        role: &str,
        scalar: bool,
    ) -> Result<Arc<dyn FilterTranslator>, FactoryError> {
        self.ensure_open()?;

        let (entry, _) = self
            .translators
            .get_or_insert_with(TranslationKey::filter(role, filter, scalar), || {
                CachedTranslator::Filter(self.compiler.filter_translator(self.settings.dialect()))
            });
        let CachedTranslator::Filter(translator) = entry else {
            return Err(FactoryError::assertion(format!(
                "translator cache holds a query translator under filter key '{role}: {filter}'"
            )));
        };

        translator
            .compile(&self.compile_context(), role, filter, scalar)
            .map_err(|source| QueryError::CompileFilter {
                role: role.to_string(),
                filter: filter.to_string(),
                source,
            })?;

        Ok(translator)
    }

    fn compile_context(&self) -> CompileContext<'_> {
        CompileContext {
            metadata: &self.metadata,
            substitutions: self.settings.query_substitutions(),
            dialect: self.settings.dialect(),
        }
    }

    //
    // Second-level cache eviction
    //

    /// Evict one entity (`Some(id)`) or the whole region of `ty` (`None`).
    /// A no-op when the entity is not cached.
    pub fn evict(&self, ty: TypeKey, id: Option<&Identifier>) -> Result<(), FactoryError> {
        self.ensure_open()?;
        let persister = self.metadata.entity_persister(ty)?;

        self.evict_entity_persister(persister.as_ref(), id)
    }

    pub fn evict_entity_name(
        &self,
        name: &str,
        id: Option<&Identifier>,
    ) -> Result<(), FactoryError> {
        self.ensure_open()?;
        let persister = self.metadata.entity_persister_by_name(name)?;

        self.evict_entity_persister(persister.as_ref(), id)
    }

    fn evict_entity_persister(
        &self,
        persister: &dyn EntityPersister,
        id: Option<&Identifier>,
    ) -> Result<(), FactoryError> {
        let Some(region) = persister.cache() else {
            return Ok(());
        };

        let scope = evict_region(region.as_ref(), id)?;
        self.record(MetricsEvent::EntityEvicted {
            entity: persister.entity_name(),
            scope,
        });

        Ok(())
    }

    /// Evict one owner's collection (`Some(id)`) or the whole role region.
    pub fn evict_collection(
        &self,
        role: &str,
        id: Option<&Identifier>,
    ) -> Result<(), FactoryError> {
        self.ensure_open()?;
        let persister = self.metadata.collection_persister(role)?;
        let Some(region) = persister.cache() else {
            return Ok(());
        };

        let scope = evict_region(region.as_ref(), id)?;
        self.record(MetricsEvent::CollectionEvicted { role, scope });

        Ok(())
    }

    //
    // Connections
    //

    pub fn open_connection(&self) -> Result<Box<dyn Connection>, FactoryError> {
        self.ensure_open()?;
        let connection = self.gateway.open()?;
        self.record(MetricsEvent::ConnectionOpened);

        Ok(connection)
    }

    pub fn close_connection(&self, connection: Box<dyn Connection>) -> Result<(), FactoryError> {
        self.ensure_open()?;
        self.gateway.close(connection)?;
        self.record(MetricsEvent::ConnectionClosed);

        Ok(())
    }

    //
    // Observability
    //

    #[must_use]
    pub fn statistics(&self) -> StatisticsReport {
        StatisticsReport::collect(self.name(), &self.metrics, self.translators.stats())
    }

    pub(crate) fn record(&self, event: MetricsEvent<'_>) {
        self.metrics.record(event);
        if let Some(sink) = &self.sink {
            sink.record(event);
        }
    }

    //
    // Lifecycle
    //

    /// Tear the factory down: destroy every second-level cache region, shut
    /// the connection provider down, and deregister the identity. Every step
    /// runs even if an earlier one fails; the first failure is returned.
    /// Deregistration runs last and unconditionally, including on unwind.
    /// Closing an already-closed factory is a no-op.
    pub fn close(&self) -> Result<(), FactoryError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!(uuid = %self.uuid(), "session factory already closed");
            return Ok(());
        }

        let _deregister = DeregisterOnDrop {
            registry: &self.registry,
            identity: &self.identity,
        };
        info!(
            uuid = %self.uuid(),
            name = self.name().unwrap_or("<unnamed>"),
            "closing session factory"
        );

        let mut first_error = None;

        for persister in self.metadata.entity_persisters() {
            if let Some(region) = persister.cache() {
                keep_first(&mut first_error, cache::destroy(region.as_ref()));
            }
        }
        for persister in self.metadata.collection_persisters() {
            if let Some(region) = persister.cache() {
                keep_first(&mut first_error, cache::destroy(region.as_ref()));
            }
        }
        keep_first(&mut first_error, self.gateway.shutdown());

        first_error.map_or(Ok(()), Err)
    }

    fn ensure_open(&self) -> Result<(), FactoryError> {
        if self.is_closed() {
            return Err(FactoryError::Closed {
                name: self
                    .name()
                    .map_or_else(|| self.uuid().to_string(), str::to_string),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFactory")
            .field("uuid", &self.uuid())
            .field("name", &self.name())
            .field("entities", &self.metadata.entity_names().len())
            .field("collections", &self.metadata.collection_roles().len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// Deregisters the factory identity when dropped, so a partially failed
// close never leaves a dangling registration.
struct DeregisterOnDrop<'a> {
    registry: &'a FactoryRegistry,
    identity: &'a FactoryIdentity,
}

impl Drop for DeregisterOnDrop<'_> {
    fn drop(&mut self) {
        self.registry.deregister(self.identity);
    }
}

fn keep_first<E: Into<FactoryError>>(slot: &mut Option<FactoryError>, result: Result<(), E>) {
    if let Err(err) = result {
        let err = err.into();
        warn!(error = %err, "session factory close step failed");
        slot.get_or_insert(err);
    }
}

fn evict_region(
    region: &dyn cache::SecondLevelCache,
    id: Option<&Identifier>,
) -> Result<EvictionScope, FactoryError> {
    match id {
        Some(id) => {
            cache::remove_from(region, id)?;
            Ok(EvictionScope::Entry)
        }
        None => {
            cache::clear(region)?;
            Ok(EvictionScope::Region)
        }
    }
}
