use crate::{
    db::{
        access::Account,
        direction::Direction,
        predicate::{FieldPresence, Row, eval},
        store::{Entity, EntityQuery, EntityStore, OrderTerm, StoreError},
    },
    key::Key,
    value::Value,
};
use std::{
    cell::Cell,
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

/// Field name under which a document exposes its own key.
pub const ID_FIELD: &str = "id";

///
/// Document
///
/// Field map with a key. Serves both as a stored entity and as a search
/// index row.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Document {
    key: Key,
    fields: BTreeMap<String, Value>,
}

impl Document {
    #[must_use]
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl Row for Document {
    fn field(&self, name: &str) -> FieldPresence {
        match self.fields.get(name) {
            Some(value) => FieldPresence::Present(value.clone()),
            None if name == ID_FIELD => FieldPresence::Present(self.key.to_value()),
            None => FieldPresence::Missing,
        }
    }
}

impl Entity for Document {
    fn key(&self) -> Key {
        self.key.clone()
    }
}

/// Entity-level view check applied when a query requests an access check.
pub type ViewPolicy = Box<dyn Fn(&Document, &Account) -> bool>;

///
/// MemoryStore
///
/// Reference in-process `EntityStore`. Counts physical load calls so
/// batching behavior is observable.
///

#[derive(Default)]
pub struct MemoryStore {
    tables: HashMap<String, BTreeMap<Key, Document>>,
    policies: HashMap<String, ViewPolicy>,
    load_calls: Cell<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&mut self, entity_type: impl Into<String>, document: Document) {
        self.tables
            .entry(entity_type.into())
            .or_default()
            .insert(document.key.clone(), document);
    }

    /// Remove a document; returns it when present.
    pub fn remove(&mut self, entity_type: &str, key: &Key) -> Option<Document> {
        self.tables.get_mut(entity_type)?.remove(key)
    }

    /// Register the view policy used for access-checked queries on a type.
    pub fn set_view_policy(&mut self, entity_type: impl Into<String>, policy: ViewPolicy) {
        self.policies.insert(entity_type.into(), policy);
    }

    /// Number of `load_multiple` calls served so far.
    #[must_use]
    pub fn load_calls(&self) -> usize {
        self.load_calls.get()
    }

    fn table(&self, entity_type: &str) -> Result<&BTreeMap<Key, Document>, StoreError> {
        self.tables
            .get(entity_type)
            .ok_or_else(|| StoreError::UnknownEntityType(entity_type.to_string()))
    }
}

impl EntityStore for MemoryStore {
    type Entity = Document;

    fn query_ids(&self, query: &EntityQuery) -> Result<Vec<Key>, StoreError> {
        // An entity type with no rows yet is an empty collection, not an error.
        let Some(table) = self.tables.get(query.entity_type()) else {
            return Ok(Vec::new());
        };
        let policy = self.policies.get(query.entity_type());

        let mut rows: Vec<&Document> = table
            .values()
            .filter(|doc| eval(*doc, query.predicate()))
            .filter(|doc| match (query.access_account(), policy) {
                (Some(account), Some(policy)) => policy(doc, account),
                _ => true,
            })
            .collect();

        rows.sort_by(|a, b| compare_rows(a, b, query.order()));

        let limit = query.limit_value().unwrap_or(usize::MAX);

        Ok(rows.into_iter().take(limit).map(|doc| doc.key.clone()).collect())
    }

    fn load_multiple(
        &self,
        entity_type: &str,
        ids: &[Key],
    ) -> Result<Vec<Self::Entity>, StoreError> {
        self.load_calls.set(self.load_calls.get() + 1);
        let table = self.table(entity_type)?;

        Ok(ids.iter().filter_map(|id| table.get(id).cloned()).collect())
    }
}

// Missing fields sort as null; the key breaks any remaining tie.
fn compare_rows(a: &Document, b: &Document, order: &[OrderTerm]) -> Ordering {
    for term in order {
        let left = field_or_null(a, &term.field);
        let right = field_or_null(b, &term.field);

        let ord = match term.direction {
            Direction::Asc => left.canonical_cmp(&right),
            Direction::Desc => right.canonical_cmp(&left),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.key.cmp(&b.key)
}

fn field_or_null(doc: &Document, field: &str) -> Value {
    match doc.field(field) {
        FieldPresence::Present(value) => value,
        FieldPresence::Missing => Value::Null,
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::predicate::Predicate;

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        for (id, created, uid) in [(1, 30, 5), (2, 10, 6), (3, 20, 5), (4, 10, 7)] {
            store.insert(
                "node",
                Document::new(Key::Int(id))
                    .with("created", i64::from(created))
                    .with("uid", i64::from(uid)),
            );
        }
        store
    }

    #[test]
    fn query_ids_filters_orders_and_limits() {
        let store = seeded();
        let query = EntityQuery::new("node")
            .filter(Predicate::eq("uid", 5i64))
            .order_by("created", Direction::Desc);

        assert_eq!(
            store.query_ids(&query).expect("query"),
            vec![Key::Int(1), Key::Int(3)]
        );

        let query = EntityQuery::new("node")
            .order_by("created", Direction::Asc)
            .order_by(ID_FIELD, Direction::Asc)
            .limit(3);
        assert_eq!(
            store.query_ids(&query).expect("query"),
            vec![Key::Int(2), Key::Int(4), Key::Int(3)]
        );
    }

    #[test]
    fn query_on_unknown_type_is_empty() {
        let store = seeded();
        let ids = store
            .query_ids(&EntityQuery::new("comment"))
            .expect("unknown type query");
        assert!(ids.is_empty());
    }

    #[test]
    fn access_checked_queries_apply_the_view_policy() {
        let mut store = seeded();
        store.set_view_policy(
            "node",
            Box::new(|doc, account| doc.get("uid") == Some(&Value::Int(account.id()))),
        );

        let unchecked = store.query_ids(&EntityQuery::new("node")).expect("query");
        assert_eq!(unchecked.len(), 4);

        let checked = store
            .query_ids(&EntityQuery::new("node").access_check(Account::new(6)))
            .expect("query");
        assert_eq!(checked, vec![Key::Int(2)]);
    }

    #[test]
    fn load_multiple_skips_unknown_ids_and_counts_calls() {
        let store = seeded();
        let docs = store
            .load_multiple("node", &[Key::Int(3), Key::Int(99), Key::Int(1)])
            .expect("load");

        let keys: Vec<_> = docs.iter().map(Entity::key).collect();
        assert_eq!(keys, vec![Key::Int(3), Key::Int(1)]);
        assert_eq!(store.load_calls(), 1);

        let err = store
            .load_multiple("comment", &[Key::Int(1)])
            .expect_err("unknown type should fail");
        assert!(matches!(err, StoreError::UnknownEntityType(_)));
    }

    #[test]
    fn document_exposes_its_key_as_id_field() {
        let doc = Document::new("abc").with("title", "x");
        assert_eq!(
            doc.field(ID_FIELD),
            FieldPresence::Present(Value::Text("abc".to_string()))
        );
    }
}
