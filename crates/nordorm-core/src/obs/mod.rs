//! Observability: per-factory counters and the sink they flow through.
//!
//! Factory logic records `MetricsEvent`s only; it never touches counters
//! directly.

mod report;
mod sink;

pub use report::StatisticsReport;
pub use sink::{EvictionScope, FactoryMetrics, MetricsEvent, MetricsSink};
