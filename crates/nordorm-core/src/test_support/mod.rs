//! Shared fakes for core tests: a dialect, a connection provider with failure
//! injection, recording cache regions, and a toy query compiler that
//! understands `from <Entity>` and `select <Entity>.<property> from <Entity>`.

pub mod fixtures;

use crate::{
    cache::{CacheProvider, SecondLevelCache},
    connection::{Connection, ConnectionProvider},
    error::BoxError,
    metadata::MetadataStore,
    model::{Identifier, TypeKey},
    obs::{MetricsEvent, MetricsSink},
    query::{CompileContext, FilterTranslator, QueryCompiler, QueryTranslator},
    session::Interceptor,
    settings::Dialect,
};
use parking_lot::Mutex;
use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

///
/// TestDialect
///

#[derive(Debug, Default)]
pub struct TestDialect;

impl Dialect for TestDialect {
    fn name(&self) -> &'static str {
        "test"
    }
}

///
/// TestConnection
///

#[derive(Debug)]
pub struct TestConnection {
    pub id: u64,
}

impl Connection for TestConnection {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

///
/// TestConnectionProvider
/// Counts acquire/release calls; every step can be made to fail.
///

#[derive(Debug, Default)]
pub struct TestConnectionProvider {
    next_id: AtomicU64,
    acquired: AtomicUsize,
    released: AtomicUsize,
    fail_acquire: AtomicBool,
    fail_release: AtomicBool,
    fail_shutdown: AtomicBool,
    closed: AtomicBool,
}

impl TestConnectionProvider {
    pub fn outstanding(&self) -> usize {
        self.acquired.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }

    pub fn fail_release(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }

    pub fn fail_shutdown(&self, fail: bool) {
        self.fail_shutdown.store(fail, Ordering::SeqCst);
    }

    /// A connection this provider never handed out.
    pub fn foreign_connection() -> Box<dyn Connection> {
        Box::new(TestConnection { id: u64::MAX })
    }
}

impl ConnectionProvider for TestConnectionProvider {
    fn acquire(&self) -> Result<Box<dyn Connection>, BoxError> {
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err("pool exhausted".into());
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(TestConnection { id }))
    }

    fn release(&self, _connection: Box<dyn Connection>) -> Result<(), BoxError> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err("socket reset".into());
        }
        self.released.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    fn close(&self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_shutdown.load(Ordering::SeqCst) {
            return Err("provider shutdown timed out".into());
        }

        Ok(())
    }
}

///
/// RecordingCache
/// Second-level cache region that records every call made to it.
///

#[derive(Debug)]
pub struct RecordingCache {
    region: String,
    removed: Mutex<Vec<Identifier>>,
    clears: AtomicUsize,
    destroys: AtomicUsize,
    fail_destroy: bool,
}

impl RecordingCache {
    pub fn new(region: &str, fail_destroy: bool) -> Self {
        Self {
            region: region.to_string(),
            removed: Mutex::new(Vec::new()),
            clears: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            fail_destroy,
        }
    }

    pub fn removed(&self) -> Vec<Identifier> {
        self.removed.lock().clone()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }
}

impl SecondLevelCache for RecordingCache {
    fn region(&self) -> &str {
        &self.region
    }

    fn remove(&self, key: &Identifier) -> Result<(), BoxError> {
        self.removed.lock().push(key.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), BoxError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) -> Result<(), BoxError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if self.fail_destroy {
            return Err("region locked".into());
        }

        Ok(())
    }
}

///
/// RecordingCacheProvider
///

#[derive(Debug, Default)]
pub struct RecordingCacheProvider {
    regions: Mutex<BTreeMap<String, Arc<RecordingCache>>>,
    failing: BTreeSet<String>,
}

impl RecordingCacheProvider {
    /// Regions named here fail on destroy.
    pub fn failing_destroy(regions: &[&str]) -> Self {
        Self {
            regions: Mutex::new(BTreeMap::new()),
            failing: regions.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn region(&self, name: &str) -> Option<Arc<RecordingCache>> {
        self.regions.lock().get(name).cloned()
    }
}

impl CacheProvider for RecordingCacheProvider {
    fn build_cache(&self, region: &str) -> Result<Arc<dyn SecondLevelCache>, BoxError> {
        let cache = Arc::new(RecordingCache::new(region, self.failing.contains(region)));
        self.regions
            .lock()
            .insert(region.to_string(), Arc::clone(&cache));

        Ok(cache)
    }
}

///
/// TestQueryTranslator
///
/// Toy translator. The return type of `from X` is the entity name, or the
/// identifier type when compiled shallow; `select X.p from X` returns the
/// type of property `p`. Words starting with `:` are named parameters.
///

#[derive(Debug, Default)]
pub struct TestQueryTranslator {
    compiled: Mutex<Compiled>,
    compiles: Arc<AtomicUsize>,
}

#[derive(Clone, Debug, Default)]
struct Compiled {
    return_types: Vec<String>,
    parameters: BTreeSet<String>,
}

impl TestQueryTranslator {
    /// Translator whose compile calls bump a shared counter.
    pub fn counting(compiles: Arc<AtomicUsize>) -> Self {
        Self {
            compiled: Mutex::default(),
            compiles,
        }
    }
}

impl QueryTranslator for TestQueryTranslator {
    fn compile(
        &self,
        context: &CompileContext<'_>,
        query: &str,
        shallow: bool,
    ) -> Result<(), BoxError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);

        let words = substitute(query, context);
        let entity_name = target_entity(&words).ok_or("query has no from clause")?;
        let persister = context
            .metadata
            .entity_persister_by_name(context.metadata.imported_name(entity_name))?;

        let return_type = match projection(&words) {
            Some(property) => persister
                .property_type(property)
                .ok_or_else(|| format!("unknown property '{property}'"))?
                .to_string(),
            None if shallow => persister.identifier_type().to_string(),
            None => persister.entity_name().to_string(),
        };

        *self.compiled.lock() = Compiled {
            return_types: vec![return_type],
            parameters: parameters(&words),
        };

        Ok(())
    }

    fn return_types(&self) -> Vec<String> {
        self.compiled.lock().return_types.clone()
    }

    fn named_parameters(&self) -> BTreeSet<String> {
        self.compiled.lock().parameters.clone()
    }
}

///
/// TestFilterTranslator
/// Returns the element type of the role, or `i64` for scalar filters.
///

#[derive(Debug, Default)]
pub struct TestFilterTranslator {
    compiled: Mutex<Compiled>,
    compiles: Arc<AtomicUsize>,
}

impl FilterTranslator for TestFilterTranslator {
    fn compile(
        &self,
        context: &CompileContext<'_>,
        role: &str,
        filter: &str,
        scalar: bool,
    ) -> Result<(), BoxError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);

        let persister = context.metadata.collection_persister(role)?;
        let words = substitute(filter, context);
        let return_type = if scalar {
            "i64".to_string()
        } else {
            persister.element_type().unwrap_or("object").to_string()
        };

        *self.compiled.lock() = Compiled {
            return_types: vec![return_type],
            parameters: parameters(&words),
        };

        Ok(())
    }

    fn return_types(&self) -> Vec<String> {
        self.compiled.lock().return_types.clone()
    }

    fn named_parameters(&self) -> BTreeSet<String> {
        self.compiled.lock().parameters.clone()
    }
}

///
/// TestCompiler
///
/// Hands out fresh toy translators and expands `from <Interface>` into one
/// query per implementor. Interfaces are registered by name.
///

#[derive(Debug, Default)]
pub struct TestCompiler {
    interfaces: BTreeMap<String, TypeKey>,
    built: AtomicUsize,
    compiles: Arc<AtomicUsize>,
}

impl TestCompiler {
    pub fn with_interface(mut self, name: &str, ty: TypeKey) -> Self {
        self.interfaces.insert(name.to_string(), ty);
        self
    }

    /// Translators constructed so far (cache misses).
    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    /// Compile calls across every translator this compiler handed out.
    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl QueryCompiler for TestCompiler {
    fn query_translator(&self, _dialect: &Arc<dyn Dialect>) -> Arc<dyn QueryTranslator> {
        self.built.fetch_add(1, Ordering::SeqCst);
        Arc::new(TestQueryTranslator::counting(Arc::clone(&self.compiles)))
    }

    fn filter_translator(&self, _dialect: &Arc<dyn Dialect>) -> Arc<dyn FilterTranslator> {
        self.built.fetch_add(1, Ordering::SeqCst);
        Arc::new(TestFilterTranslator {
            compiled: Mutex::default(),
            compiles: Arc::clone(&self.compiles),
        })
    }

    fn concrete_queries(
        &self,
        query: &str,
        metadata: &MetadataStore,
    ) -> Result<Vec<String>, BoxError> {
        let words: Vec<String> = query.split_whitespace().map(str::to_string).collect();
        let raw = target_entity(&words).ok_or("query has no from clause")?;
        let name = metadata.imported_name(raw);

        let ty = match metadata.find_entity_persister(name) {
            Some(persister) => persister.mapped_type(),
            None => *self
                .interfaces
                .get(name)
                .ok_or_else(|| format!("unknown type '{name}'"))?,
        };

        let queries = metadata
            .implementors(ty)?
            .into_iter()
            .map(|implementor| {
                words
                    .iter()
                    .map(|word| {
                        if word == raw {
                            implementor.as_str()
                        } else {
                            word.as_str()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        Ok(queries)
    }
}

fn substitute(query: &str, context: &CompileContext<'_>) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| {
            context
                .substitutions
                .get(word)
                .cloned()
                .unwrap_or_else(|| word.to_string())
        })
        .collect()
}

fn target_entity(words: &[String]) -> Option<&str> {
    words
        .iter()
        .position(|word| word.eq_ignore_ascii_case("from"))
        .and_then(|at| words.get(at + 1))
        .map(String::as_str)
}

// `select X.p from X` projects property `p`.
fn projection(words: &[String]) -> Option<&str> {
    let first = words.first()?;
    if !first.eq_ignore_ascii_case("select") {
        return None;
    }

    words
        .get(1)
        .and_then(|selected| selected.split_once('.'))
        .map(|(_, property)| property)
}

fn parameters(words: &[String]) -> BTreeSet<String> {
    words
        .iter()
        .filter_map(|word| word.strip_prefix(':'))
        .map(|name| {
            name.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_')
                .to_string()
        })
        .collect()
}

///
/// RecordingInterceptor
///

#[derive(Debug, Default)]
pub struct RecordingInterceptor {
    opened: Mutex<Vec<u64>>,
    closed: Mutex<Vec<u64>>,
}

impl RecordingInterceptor {
    pub fn opened(&self) -> Vec<u64> {
        self.opened.lock().clone()
    }

    pub fn closed(&self) -> Vec<u64> {
        self.closed.lock().clone()
    }
}

impl Interceptor for RecordingInterceptor {
    fn on_session_open(&self, timestamp: u64) {
        self.opened.lock().push(timestamp);
    }

    fn on_session_close(&self, timestamp: u64) {
        self.closed.lock().push(timestamp);
    }
}

///
/// RecordingSink
/// Keeps the debug rendering of every event it receives.
///

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        self.events.lock().push(format!("{event:?}"));
    }
}
