//! Observability: compiler activity counters and the sink boundary.
//!
//! Compilation logic MUST NOT touch `obs::metrics` directly; all
//! instrumentation flows through `MetricsEvent` and `MetricsSink`.
//! Nothing here participates in compilation semantics.

pub(crate) mod metrics;
pub(crate) mod sink;

pub use metrics::CompilerCounters;
pub use sink::{
    MetricsEvent, MetricsSink, RewriteKind, metrics_report, metrics_reset_all, with_metrics_sink,
};

pub(crate) use sink::record;
