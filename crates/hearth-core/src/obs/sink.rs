//! Metrics sink boundary.
//!
//! Pagination and access logic MUST NOT touch obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between request logic and the
//! process-local metrics state.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// CursorOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CursorOutcome {
    Accepted,
    /// Token could not be decoded at all.
    Rejected,
    /// Token decoded but belongs to another collection or sort.
    Incompatible,
}

///
/// AccessOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessOutcome {
    Bypassed,
    Branches(u64),
    DeniedAll,
    Skipped,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    Cursor {
        outcome: CursorOutcome,
    },
    ConnectionResolved {
        entity_type: &'a str,
        edges: u64,
    },
    BufferFlush {
        entity_type: &'a str,
        requested: u64,
        loaded: u64,
    },
    Access {
        outcome: AccessOutcome,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::Cursor { outcome } => metrics::with_state_mut(|m| match outcome {
                CursorOutcome::Accepted => {
                    m.ops.cursors_accepted = m.ops.cursors_accepted.saturating_add(1);
                }
                CursorOutcome::Rejected => {
                    m.ops.cursors_rejected = m.ops.cursors_rejected.saturating_add(1);
                }
                CursorOutcome::Incompatible => {
                    m.ops.cursors_incompatible = m.ops.cursors_incompatible.saturating_add(1);
                }
            }),

            MetricsEvent::ConnectionResolved { entity_type, edges } => {
                metrics::with_state_mut(|m| {
                    m.ops.connections_resolved = m.ops.connections_resolved.saturating_add(1);
                    m.ops.edges_returned = m.ops.edges_returned.saturating_add(edges);

                    let entry = m.entities.entry(entity_type.to_string()).or_default();
                    entry.connections_resolved = entry.connections_resolved.saturating_add(1);
                    entry.edges_returned = entry.edges_returned.saturating_add(edges);
                });
            }

            MetricsEvent::BufferFlush {
                entity_type,
                requested,
                loaded,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.buffer_flushes = m.ops.buffer_flushes.saturating_add(1);
                    m.ops.buffer_ids_requested =
                        m.ops.buffer_ids_requested.saturating_add(requested);
                    m.ops.buffer_entities_loaded =
                        m.ops.buffer_entities_loaded.saturating_add(loaded);

                    let entry = m.entities.entry(entity_type.to_string()).or_default();
                    entry.buffer_flushes = entry.buffer_flushes.saturating_add(1);
                    entry.entities_loaded = entry.entities_loaded.saturating_add(loaded);
                });
            }

            MetricsEvent::Access { outcome } => metrics::with_state_mut(|m| match outcome {
                AccessOutcome::Bypassed => {
                    m.ops.access_bypassed = m.ops.access_bypassed.saturating_add(1);
                }
                AccessOutcome::Branches(count) => {
                    m.ops.access_branches = m.ops.access_branches.saturating_add(count);
                }
                AccessOutcome::DeniedAll => {
                    m.ops.access_denied_all = m.ops.access_denied_all.saturating_add(1);
                }
                AccessOutcome::Skipped => {
                    m.ops.access_skipped = m.ops.access_skipped.saturating_add(1);
                }
            }),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous sink is restored on every exit path, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
