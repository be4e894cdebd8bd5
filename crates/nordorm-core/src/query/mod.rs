//! Query translation boundary and the translator cache.
//!
//! Compilation internals are external: a `QueryCompiler` hands out translator
//! objects, and the factory compiles them against the caller's query text on
//! every request, cache hit or not.

mod cache;

pub use cache::{
    CacheLookup, CachedTranslator, TranslationKey, TranslatorCache, TranslatorCacheStats,
};

use crate::{
    error::BoxError,
    metadata::MetadataStore,
    settings::{Dialect, QuerySubstitutions},
};
use std::{collections::BTreeSet, fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("query does not refer to any persistent types: {0}")]
    NoConcreteQueries(String),

    #[error("failed to expand query '{query}': {source}")]
    Expand { query: String, source: BoxError },

    #[error("failed to compile query '{query}': {source}")]
    Compile { query: String, source: BoxError },

    #[error("failed to compile filter '{filter}' on collection '{role}': {source}")]
    CompileFilter {
        role: String,
        filter: String,
        source: BoxError,
    },
}

///
/// CompileContext
/// Factory state a translator compiles against.
///

#[derive(Clone, Copy, Debug)]
pub struct CompileContext<'a> {
    pub metadata: &'a MetadataStore,
    pub substitutions: &'a QuerySubstitutions,
    pub dialect: &'a Arc<dyn Dialect>,
}

///
/// QueryTranslator
///
/// Compiled form of one query string. `compile` is called on every request
/// and must be idempotent for equal inputs; implementations serialize their
/// own internal state.
///

pub trait QueryTranslator: Send + Sync + fmt::Debug {
    fn compile(
        &self,
        context: &CompileContext<'_>,
        query: &str,
        shallow: bool,
    ) -> Result<(), BoxError>;

    fn return_types(&self) -> Vec<String>;

    fn named_parameters(&self) -> BTreeSet<String>;
}

///
/// FilterTranslator
/// Compiled filter applied to the elements of one collection role.
///

pub trait FilterTranslator: Send + Sync + fmt::Debug {
    fn compile(
        &self,
        context: &CompileContext<'_>,
        role: &str,
        filter: &str,
        scalar: bool,
    ) -> Result<(), BoxError>;

    fn return_types(&self) -> Vec<String>;

    fn named_parameters(&self) -> BTreeSet<String>;
}

///
/// QueryCompiler
///

pub trait QueryCompiler: Send + Sync + fmt::Debug {
    fn query_translator(&self, dialect: &Arc<dyn Dialect>) -> Arc<dyn QueryTranslator>;

    fn filter_translator(&self, dialect: &Arc<dyn Dialect>) -> Arc<dyn FilterTranslator>;

    /// Expand a possibly polymorphic query into one query per concrete target.
    fn concrete_queries(
        &self,
        query: &str,
        metadata: &MetadataStore,
    ) -> Result<Vec<String>, BoxError>;
}
