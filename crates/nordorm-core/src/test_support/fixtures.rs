use crate::{
    factory::{FactoryRegistry, SessionFactory, SessionFactoryBuilder},
    model::{CollectionMapping, EntityMapping, TypeKey},
    settings::FactoryConfig,
    test_support::{RecordingCacheProvider, TestCompiler, TestConnectionProvider, TestDialect},
};
use std::sync::Arc;

// Mapped types. `Animal` is a mapped superclass of `Dog` and `Cat`; `Pet`
// is an unmapped interface; `Robot` opts out of implicit polymorphism and
// `AuditLog` is not queryable.
pub struct Customer;
pub struct Order;
pub struct Animal;
pub struct Dog;
pub struct Cat;
pub struct Robot;
pub struct AuditLog;
pub struct Unmapped;

pub trait Pet {}

pub const CUSTOMER_QUALIFIED: &str = "App.Customer, App";
pub const CUSTOMER_ORDERS: &str = "Customer.Orders";
pub const ANIMAL_TAGS: &str = "Animal.Tags";
pub const CUSTOMERS_BY_NAME: &str = "from Customer where name = :name";

#[must_use]
pub fn customer() -> EntityMapping {
    EntityMapping::new::<Customer>("Customer", CUSTOMER_QUALIFIED)
        .property("name", "string")
        .property("email", "string")
        .cached("customer")
}

#[must_use]
pub fn order() -> EntityMapping {
    EntityMapping::new::<Order>("Order", "App.Order, App")
        .identifier("number", "u64")
        .property("total", "decimal")
        .cached("order")
}

#[must_use]
pub fn animal() -> EntityMapping {
    EntityMapping::new::<Animal>("Animal", "App.Animal, App").property("name", "string")
}

#[must_use]
pub fn dog() -> EntityMapping {
    EntityMapping::new::<Dog>("Dog", "App.Dog, App")
        .extends::<Animal>()
        .implements::<dyn Pet>()
}

#[must_use]
pub fn cat() -> EntityMapping {
    EntityMapping::new::<Cat>("Cat", "App.Cat, App")
        .extends::<Animal>()
        .implements::<dyn Pet>()
}

#[must_use]
pub fn robot() -> EntityMapping {
    EntityMapping::new::<Robot>("Robot", "App.Robot, App")
        .implements::<dyn Pet>()
        .explicit_polymorphism()
}

#[must_use]
pub fn audit_log() -> EntityMapping {
    EntityMapping::new::<AuditLog>("AuditLog", "App.AuditLog, App").not_queryable()
}

#[must_use]
pub fn entity_mappings() -> Vec<EntityMapping> {
    vec![customer(), order(), animal(), dog(), cat(), robot(), audit_log()]
}

#[must_use]
pub fn customer_orders() -> CollectionMapping {
    CollectionMapping::new(CUSTOMER_ORDERS)
        .owned_by::<Customer>()
        .element("Order")
        .cached("customer.orders")
}

#[must_use]
pub fn animal_tags() -> CollectionMapping {
    CollectionMapping::new(ANIMAL_TAGS)
        .owned_by::<Animal>()
        .element("string")
}

#[must_use]
pub fn config() -> FactoryConfig {
    FactoryConfig::default()
        .named("main")
        .named_query("customersByName", CUSTOMERS_BY_NAME)
        .import("Client", "Customer")
        .import("Pets", "Pet")
        .substitution("yes", "1")
        .property("connection_string", "Server=db;Password=hunter2")
        .property("dialect", "test")
}

///
/// Harness
///
/// Collaborators of one test factory, kept so tests can inspect them.
///

pub struct Harness {
    pub provider: Arc<TestConnectionProvider>,
    pub caches: Arc<RecordingCacheProvider>,
    pub compiler: Arc<TestCompiler>,
    pub registry: Arc<FactoryRegistry>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_caches(RecordingCacheProvider::default())
    }

    #[must_use]
    pub fn with_caches(caches: RecordingCacheProvider) -> Self {
        Self {
            provider: Arc::new(TestConnectionProvider::default()),
            caches: Arc::new(caches),
            compiler: Arc::new(
                TestCompiler::default().with_interface("Pet", TypeKey::of::<dyn Pet>()),
            ),
            registry: Arc::new(FactoryRegistry::new()),
        }
    }

    /// Builder carrying every fixture mapping and collaborator.
    #[must_use]
    pub fn builder(&self, config: FactoryConfig) -> SessionFactoryBuilder {
        SessionFactory::builder(config)
            .entities(entity_mappings())
            .collection(customer_orders())
            .collection(animal_tags())
            .dialect(Arc::new(TestDialect))
            .connection_provider(self.provider.clone())
            .cache_provider(self.caches.clone())
            .compiler(self.compiler.clone())
            .registry(self.registry.clone())
    }

    #[must_use]
    pub fn build(&self) -> Arc<SessionFactory> {
        self.builder(config())
            .build()
            .expect("fixture factory should build")
    }
}
