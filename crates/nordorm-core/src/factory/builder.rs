use crate::{
    cache::CacheProvider,
    connection::{ConnectionGateway, ConnectionProvider},
    error::FactoryError,
    factory::{FactoryIdentity, FactoryRegistry, SessionFactory},
    metadata::{MetadataSource, MetadataStore},
    model::{CollectionMapping, EntityMapping},
    obs::{FactoryMetrics, MetricsSink},
    persister::{BasicPersisterFactory, PersisterFactory},
    query::{QueryCompiler, TranslatorCache},
    session::{EmptyInterceptor, Interceptor},
    settings::{
        ConfigError, ConnectionTransactionFactory, Dialect, FactoryConfig, FactorySettings,
        TransactionFactory,
    },
};
use std::sync::{Arc, atomic::AtomicBool};
use tracing::{debug, info};
use uuid::Uuid;

///
/// SessionFactoryBuilder
///
/// Collects the configuration snapshot, the mappings, and the code-level
/// capabilities a factory is built from. Dialect, connection provider, and
/// query compiler are required; everything else has a default.
///

pub struct SessionFactoryBuilder {
    config: FactoryConfig,
    entities: Vec<EntityMapping>,
    collections: Vec<CollectionMapping>,
    dialect: Option<Arc<dyn Dialect>>,
    connection_provider: Option<Arc<dyn ConnectionProvider>>,
    transaction_factory: Option<Arc<dyn TransactionFactory>>,
    persister_factory: Option<Arc<dyn PersisterFactory>>,
    compiler: Option<Arc<dyn QueryCompiler>>,
    interceptor: Option<Arc<dyn Interceptor>>,
    registry: Option<Arc<FactoryRegistry>>,
    uuid: Option<Uuid>,
    metrics_sink: Option<Arc<dyn MetricsSink>>,
}

impl SessionFactoryBuilder {
    #[must_use]
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config,
            entities: Vec::new(),
            collections: Vec::new(),
            dialect: None,
            connection_provider: None,
            transaction_factory: None,
            persister_factory: None,
            compiler: None,
            interceptor: None,
            registry: None,
            uuid: None,
            metrics_sink: None,
        }
    }

    #[must_use]
    pub fn entity(mut self, mapping: EntityMapping) -> Self {
        self.entities.push(mapping);
        self
    }

    #[must_use]
    pub fn entities(mut self, mappings: impl IntoIterator<Item = EntityMapping>) -> Self {
        self.entities.extend(mappings);
        self
    }

    #[must_use]
    pub fn collection(mut self, mapping: CollectionMapping) -> Self {
        self.collections.push(mapping);
        self
    }

    #[must_use]
    pub fn dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    #[must_use]
    pub fn connection_provider(mut self, provider: Arc<dyn ConnectionProvider>) -> Self {
        self.connection_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn transaction_factory(mut self, factory: Arc<dyn TransactionFactory>) -> Self {
        self.transaction_factory = Some(factory);
        self
    }

    #[must_use]
    pub fn persister_factory(mut self, factory: Arc<dyn PersisterFactory>) -> Self {
        self.persister_factory = Some(factory);
        self
    }

    /// Use the basic persister factory with cache regions built by `provider`.
    #[must_use]
    pub fn cache_provider(self, provider: Arc<dyn CacheProvider>) -> Self {
        self.persister_factory(Arc::new(BasicPersisterFactory::with_cache_provider(
            provider,
        )))
    }

    #[must_use]
    pub fn compiler(mut self, compiler: Arc<dyn QueryCompiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Default interceptor for sessions opened without one.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: Arc<FactoryRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Fix the factory uuid instead of generating one.
    #[must_use]
    pub const fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    /// Extra sink receiving every metrics event next to the built-in counters.
    #[must_use]
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics_sink = Some(sink);
        self
    }

    /// Build the metadata store and the factory, then register its identity.
    /// Construction is atomic: on any failure nothing stays registered.
    pub fn build(self) -> Result<Arc<SessionFactory>, FactoryError> {
        let dialect = self
            .dialect
            .ok_or(ConfigError::MissingCapability("dialect"))?;
        let connection_provider = self
            .connection_provider
            .ok_or(ConfigError::MissingCapability("connection provider"))?;
        let compiler = self
            .compiler
            .ok_or(ConfigError::MissingCapability("query compiler"))?;
        let transaction_factory = self
            .transaction_factory
            .unwrap_or_else(|| Arc::new(ConnectionTransactionFactory));
        let persister_factory = self
            .persister_factory
            .unwrap_or_else(|| Arc::new(BasicPersisterFactory::new()));
        let interceptor = self
            .interceptor
            .unwrap_or_else(|| Arc::new(EmptyInterceptor));
        let registry = self.registry.unwrap_or_else(|| {
            debug!("no registry supplied, using a private one");
            Arc::new(FactoryRegistry::new())
        });

        let settings = FactorySettings::new(
            &self.config,
            dialect,
            Arc::clone(&connection_provider),
            transaction_factory,
        )?;

        let uuid = self.uuid.unwrap_or_else(Uuid::new_v4);
        if uuid.is_nil() {
            return Err(FactoryError::assertion(
                "could not generate a session factory uuid",
            ));
        }
        let identity = FactoryIdentity::new(uuid, self.config.name.clone());

        let metadata = MetadataStore::build(
            &MetadataSource {
                entities: &self.entities,
                collections: &self.collections,
                named_queries: &self.config.named_queries,
                imports: &self.config.imports,
            },
            persister_factory.as_ref(),
            &settings,
        )?;

        let translators = TranslatorCache::new(settings.translator_cache_capacity());
        let factory = Arc::new(SessionFactory {
            identity,
            metadata,
            translators,
            compiler,
            gateway: ConnectionGateway::new(connection_provider),
            interceptor,
            registry: Arc::clone(&registry),
            properties: self.config.properties,
            metrics: FactoryMetrics::new(),
            sink: self.metrics_sink,
            closed: AtomicBool::new(false),
            settings,
        });

        registry
            .register(factory.identity(), &factory, &factory.properties)
            .map_err(|err| FactoryError::assertion(err.to_string()))?;

        info!(
            uuid = %uuid,
            name = factory.name().unwrap_or("<unnamed>"),
            entities = factory.metadata().entity_names().len(),
            collections = factory.metadata().collection_roles().len(),
            "session factory built"
        );

        Ok(factory)
    }
}
