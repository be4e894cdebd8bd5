use std::sync::atomic::{AtomicU64, Ordering};

///
/// EvictionScope
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EvictionScope {
    /// One cached entry, by identifier.
    Entry,
    /// The whole region of a type or role.
    Region,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    SessionOpened { timestamp: u64 },
    SessionClosed,
    ConnectionOpened,
    ConnectionClosed,
    EntityEvicted { entity: &'a str, scope: EvictionScope },
    CollectionEvicted { role: &'a str, scope: EvictionScope },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// FactoryMetrics
///
/// Default sink owned by every factory. Relaxed atomics are enough; the
/// counters are never used for correctness.
///

#[derive(Debug, Default)]
pub struct FactoryMetrics {
    pub(crate) sessions_opened: AtomicU64,
    pub(crate) sessions_closed: AtomicU64,
    pub(crate) connections_opened: AtomicU64,
    pub(crate) connections_closed: AtomicU64,
    pub(crate) entity_evictions: AtomicU64,
    pub(crate) collection_evictions: AtomicU64,
    pub(crate) last_session_timestamp: AtomicU64,
}

impl FactoryMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn load(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl MetricsSink for FactoryMetrics {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::SessionOpened { timestamp } => {
                Self::bump(&self.sessions_opened);
                self.last_session_timestamp
                    .fetch_max(timestamp, Ordering::Relaxed);
            }
            MetricsEvent::SessionClosed => Self::bump(&self.sessions_closed),
            MetricsEvent::ConnectionOpened => Self::bump(&self.connections_opened),
            MetricsEvent::ConnectionClosed => Self::bump(&self.connections_closed),
            MetricsEvent::EntityEvicted { .. } => Self::bump(&self.entity_evictions),
            MetricsEvent::CollectionEvicted { .. } => Self::bump(&self.collection_evictions),
        }
    }
}
