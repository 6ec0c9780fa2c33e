//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Structured logs go through `tracing` at the call sites; counters go
//! through the sink boundary defined here.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntitySummary, EventOps, EventReport, EventState};
pub use sink::{
    AccessOutcome, CursorOutcome, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
