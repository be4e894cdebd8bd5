use crate::{obs::FactoryMetrics, query::TranslatorCacheStats};
use serde::{Deserialize, Serialize};

///
/// StatisticsReport
/// Point-in-time snapshot of one factory's counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub factory_name: Option<String>,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub entity_evictions: u64,
    pub collection_evictions: u64,
    pub last_session_timestamp: u64,
    pub translator_hits: u64,
    pub translator_misses: u64,
    pub translator_cache_size: usize,
    pub translator_cache_capacity: usize,
}

impl StatisticsReport {
    pub(crate) fn collect(
        factory_name: Option<&str>,
        metrics: &FactoryMetrics,
        translators: TranslatorCacheStats,
    ) -> Self {
        Self {
            factory_name: factory_name.map(str::to_string),
            sessions_opened: FactoryMetrics::load(&metrics.sessions_opened),
            sessions_closed: FactoryMetrics::load(&metrics.sessions_closed),
            connections_opened: FactoryMetrics::load(&metrics.connections_opened),
            connections_closed: FactoryMetrics::load(&metrics.connections_closed),
            entity_evictions: FactoryMetrics::load(&metrics.entity_evictions),
            collection_evictions: FactoryMetrics::load(&metrics.collection_evictions),
            last_session_timestamp: FactoryMetrics::load(&metrics.last_session_timestamp),
            translator_hits: translators.hits,
            translator_misses: translators.misses,
            translator_cache_size: translators.size,
            translator_cache_capacity: translators.capacity,
        }
    }

    /// Sessions opened but not yet closed.
    #[must_use]
    pub const fn open_sessions(&self) -> u64 {
        self.sessions_opened.saturating_sub(self.sessions_closed)
    }
}
