use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for pagination, loading, and access
/// filtering. Process-local; reset between tests.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Cursor replay
    pub cursors_accepted: u64,
    pub cursors_rejected: u64,
    pub cursors_incompatible: u64,

    // Connections
    pub connections_resolved: u64,
    pub edges_returned: u64,

    // Entity buffer
    pub buffer_flushes: u64,
    pub buffer_ids_requested: u64,
    pub buffer_entities_loaded: u64,

    // Access filtering
    pub access_bypassed: u64,
    pub access_branches: u64,
    pub access_denied_all: u64,
    pub access_skipped: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub connections_resolved: u64,
    pub edges_returned: u64,
    pub buffer_flushes: u64,
    pub entities_loaded: u64,
}

///
/// EventReport
/// Point-in-time snapshot returned to callers.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: Option<EventState>,
    pub entity_counters: Vec<EntitySummary>,
}

///
/// EntitySummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntitySummary {
    pub entity_type: String,
    pub connections_resolved: u64,
    pub edges_returned: u64,
    pub buffer_flushes: u64,
    pub entities_loaded: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Build a metrics report; entities are ordered by edges returned, then name.
#[must_use]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut entity_counters: Vec<EntitySummary> = snap
        .entities
        .iter()
        .map(|(entity_type, c)| EntitySummary {
            entity_type: entity_type.clone(),
            connections_resolved: c.connections_resolved,
            edges_returned: c.edges_returned,
            buffer_flushes: c.buffer_flushes,
            entities_loaded: c.entities_loaded,
        })
        .collect();

    entity_counters.sort_by(|a, b| {
        b.edges_returned
            .cmp(&a.edges_returned)
            .then_with(|| a.entity_type.cmp(&b.entity_type))
    });

    EventReport {
        counters: Some(snap),
        entity_counters,
    }
}
