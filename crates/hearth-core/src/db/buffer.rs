//! Module: buffer
//! Responsibility: request-scoped, batched entity hydration.
//! Does not own: id queries or pagination.
//! Boundary: connections queue ids here during preparation and read
//! entities back once every connection in the request has queued.
//!
//! Collect-then-flush: ids queue per entity type; the first resolve of a
//! type flushes its whole queue in one `load_multiple` call and memoizes
//! the result (including misses) for the rest of the request.

use crate::{
    db::store::{Entity, EntityStore, StoreError},
    key::Key,
    obs::sink::{MetricsEvent, record},
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
    rc::Rc,
};

///
/// Deferred
///
/// Handle to a set of queued ids; resolved against the buffer it came from.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deferred {
    entity_type: String,
    ids: Vec<Key>,
}

impl Deferred {
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub fn ids(&self) -> &[Key] {
        &self.ids
    }
}

// Loaded slot; `None` records a confirmed miss.
type Slot<E> = Option<Rc<E>>;

///
/// EntityBuffer
///

pub struct EntityBuffer<'s, S: EntityStore> {
    store: &'s S,
    pending: RefCell<BTreeMap<String, BTreeSet<Key>>>,
    cache: RefCell<HashMap<String, HashMap<Key, Slot<S::Entity>>>>,
}

impl<'s, S: EntityStore> EntityBuffer<'s, S> {
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            pending: RefCell::new(BTreeMap::new()),
            cache: RefCell::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &'s S {
        self.store
    }

    /// Queue ids for loading. Ids already resolved in this request are not re-queued.
    pub fn add(&self, entity_type: &str, ids: &[Key]) -> Deferred {
        let cache = self.cache.borrow();
        let known = cache.get(entity_type);

        let mut pending = self.pending.borrow_mut();
        let queue = pending.entry(entity_type.to_string()).or_default();
        for id in ids {
            if !known.is_some_and(|slots| slots.contains_key(id)) {
                queue.insert(id.clone());
            }
        }

        Deferred {
            entity_type: entity_type.to_string(),
            ids: ids.to_vec(),
        }
    }

    /// Materialize a deferred load, flushing its entity type first if needed.
    ///
    /// Entities come back in the deferred's id order; ids the store did
    /// not return are skipped.
    pub fn resolve(&self, deferred: &Deferred) -> Result<Vec<Rc<S::Entity>>, StoreError> {
        self.flush(&deferred.entity_type)?;

        let cache = self.cache.borrow();
        let Some(slots) = cache.get(&deferred.entity_type) else {
            return Ok(Vec::new());
        };

        Ok(deferred
            .ids
            .iter()
            .filter_map(|id| slots.get(id).cloned().flatten())
            .collect())
    }

    /// Read one already-resolved entity without triggering a load.
    #[must_use]
    pub fn cached(&self, entity_type: &str, id: &Key) -> Option<Rc<S::Entity>> {
        self.cache
            .borrow()
            .get(entity_type)
            .and_then(|slots| slots.get(id).cloned().flatten())
    }

    // The queue is cleared only after a successful load, so a failed flush
    // leaves every queued id for the next resolve to retry.
    fn flush(&self, entity_type: &str) -> Result<(), StoreError> {
        let ids: Vec<Key> = match self.pending.borrow().get(entity_type) {
            Some(queued) if !queued.is_empty() => queued.iter().cloned().collect(),
            _ => return Ok(()),
        };

        let loaded = self.store.load_multiple(entity_type, &ids)?;
        self.pending.borrow_mut().remove(entity_type);

        tracing::trace!(
            entity_type,
            requested = ids.len(),
            loaded = loaded.len(),
            "entity buffer flush"
        );
        record(MetricsEvent::BufferFlush {
            entity_type,
            requested: ids.len() as u64,
            loaded: loaded.len() as u64,
        });

        let mut cache = self.cache.borrow_mut();
        let slots = cache.entry(entity_type.to_string()).or_default();
        for entity in loaded {
            slots.insert(entity.key(), Some(Rc::new(entity)));
        }
        for id in ids {
            slots.entry(id).or_insert(None);
        }

        Ok(())
    }
}

///
/// TESTS
///
