use crate::settings::{DEFAULT_TRANSLATOR_CACHE_CAPACITY, IsolationLevel};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

/// Placeholder written in place of sensitive property values.
pub const REDACTED: &str = "<redacted>";

const SENSITIVE_KEY_FRAGMENTS: &[&str] = &["connection_string", "connectionstring", "password"];

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid factory config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("translator cache capacity must be greater than zero")]
    ZeroCacheCapacity,

    #[error("missing required capability: {0}")]
    MissingCapability(&'static str),
}

///
/// FactoryConfig
///
/// Serializable configuration snapshot consumed once at construction.
/// Code-level capabilities (dialect, providers, compilers) are supplied
/// separately through the factory builder.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    pub name: Option<String>,
    pub default_schema: Option<String>,
    pub isolation_level: Option<IsolationLevel>,
    pub outer_join_fetch: bool,
    pub translator_cache_capacity: usize,
    pub query_substitutions: BTreeMap<String, String>,
    pub named_queries: BTreeMap<String, String>,
    pub imports: BTreeMap<String, String>,
    pub properties: BTreeMap<String, String>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            name: None,
            default_schema: None,
            isolation_level: None,
            outer_join_fetch: true,
            translator_cache_capacity: DEFAULT_TRANSLATOR_CACHE_CAPACITY,
            query_substitutions: BTreeMap::new(),
            named_queries: BTreeMap::new(),
            imports: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }
}

impl FactoryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn named_query(mut self, name: impl Into<String>, query: impl Into<String>) -> Self {
        self.named_queries.insert(name.into(), query.into());
        self
    }

    #[must_use]
    pub fn import(mut self, short_name: impl Into<String>, full_name: impl Into<String>) -> Self {
        self.imports.insert(short_name.into(), full_name.into());
        self
    }

    #[must_use]
    pub fn substitution(mut self, token: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.query_substitutions
            .insert(token.into(), replacement.into());
        self
    }

    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn translator_cache_capacity(mut self, capacity: usize) -> Self {
        self.translator_cache_capacity = capacity;
        self
    }
}

/// True when a property key looks like it carries a connection string or secret.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let key: String = key
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| key.contains(fragment))
}

/// Copy of `properties` safe to log or expose through diagnostics.
#[must_use]
pub fn redact_properties(properties: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    properties
        .iter()
        .map(|(key, value)| {
            let value = if is_sensitive_key(key) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}
