use crate::{
    config::{ConfigScalar, ConnectionConfig, PaginationConfig},
    db::{
        access::Account,
        buffer::EntityBuffer,
        connection::{
            Connection, ConnectionDefinition, ConnectionError, ConnectionQueryHelper,
            ConnectionRegistry, ConnectionTarget, PageDirection, PageWindow, PaginationArgs,
            RegistryError, SortKey,
        },
        cursor::Cursor,
        predicate::Predicate,
        store::{Document, Entity, EntityQuery, EntityStore, MemoryStore, StoreError},
    },
    key::Key,
    value::Value,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

const CREATED_AT: &str = "CREATED_AT";

fn text(id: &str) -> Key {
    Key::Text(id.to_string())
}

fn nodes() -> ConnectionDefinition {
    ConnectionDefinition::new("nodes", "node")
        .sort(CREATED_AT, "created")
        .sort("TITLE", "title")
}

// a..e with created values 10, 20, 15, 25, 5.
fn seeded() -> MemoryStore {
    let mut store = MemoryStore::new();
    for (id, created) in [("a", 10i64), ("b", 20), ("c", 15), ("d", 25), ("e", 5)] {
        store.insert(
            "node",
            Document::new(text(id))
                .with("created", created)
                .with("title", id.to_uppercase()),
        );
    }
    store
}

fn page<S: EntityStore>(
    store: &S,
    definition: &ConnectionDefinition,
    args: &PaginationArgs,
) -> Connection<S::Entity> {
    let helper =
        ConnectionQueryHelper::new(definition, ConnectionTarget::Root, &args.sort_key, None)
            .expect("helper");
    let window = args.window(&PaginationConfig::default()).expect("window");
    let buffer = EntityBuffer::new(store);

    helper.resolve(&buffer, &window).expect("resolve")
}

fn ids<E: Entity>(connection: &Connection<E>) -> Vec<Key> {
    connection.nodes().map(|node| node.key()).collect()
}

#[test]
fn forward_pages_resume_strictly_after_the_cursor() {
    let store = seeded();
    let definition = nodes();

    let first = page(&store, &definition, &PaginationArgs::new(CREATED_AT).first(2));
    assert_eq!(ids(&first), vec![text("e"), text("a")]);
    assert!(first.page_info.has_next_page);
    assert!(!first.page_info.has_previous_page);

    let end = first.page_info.end_cursor.clone().expect("end cursor");
    assert_eq!(
        Cursor::try_decode(&end).expect("decode"),
        Cursor::new("node", text("a"), CREATED_AT, Value::Int(10))
    );

    let second = page(
        &store,
        &definition,
        &PaginationArgs::new(CREATED_AT).first(2).after(end),
    );
    assert_eq!(ids(&second), vec![text("c"), text("b")]);
    assert!(second.page_info.has_next_page);
    assert!(second.page_info.has_previous_page);

    let third = page(
        &store,
        &definition,
        &PaginationArgs::new(CREATED_AT)
            .first(2)
            .after(second.page_info.end_cursor.expect("end")),
    );
    assert_eq!(ids(&third), vec![text("d")]);
    assert!(!third.page_info.has_next_page);
}

#[test]
fn backward_pages_come_back_in_presentation_order() {
    let store = seeded();
    let definition = nodes();

    let tail = page(&store, &definition, &PaginationArgs::new(CREATED_AT).last(2));
    assert_eq!(ids(&tail), vec![text("b"), text("d")]);
    assert!(tail.page_info.has_previous_page);
    assert!(!tail.page_info.has_next_page);

    let before = page(
        &store,
        &definition,
        &PaginationArgs::new(CREATED_AT)
            .last(2)
            .before(tail.page_info.start_cursor.expect("start")),
    );
    assert_eq!(ids(&before), vec![text("a"), text("c")]);
    assert!(before.page_info.has_previous_page);
    assert!(before.page_info.has_next_page);
}

#[test]
fn reverse_flips_the_primary_order() {
    let store = seeded();
    let reversed = page(
        &store,
        &nodes(),
        &PaginationArgs::new(CREATED_AT).first(3).reversed(),
    );

    assert_eq!(ids(&reversed), vec![text("d"), text("b"), text("c")]);
}

#[test]
fn unusable_cursors_fall_back_to_the_first_page() {
    let store = seeded();
    let definition = nodes();
    let first = ids(&page(
        &store,
        &definition,
        &PaginationArgs::new(CREATED_AT).first(2),
    ));

    let garbage = page(
        &store,
        &definition,
        &PaginationArgs::new(CREATED_AT).first(2).after("%%not-a-cursor%%"),
    );
    assert_eq!(ids(&garbage), first);
    assert!(!garbage.page_info.has_previous_page);

    // Minted for another sort key.
    let foreign = Cursor::new("node", text("a"), "TITLE", Value::Text("A".to_string()));
    let mismatched = page(
        &store,
        &definition,
        &PaginationArgs::new(CREATED_AT)
            .first(2)
            .after(foreign.encode()),
    );
    assert_eq!(ids(&mismatched), first);
}

#[test]
fn edge_cursors_carry_the_loaded_sort_value() {
    let store = seeded();
    let by_title = page(&store, &nodes(), &PaginationArgs::new("TITLE").first(1));

    let edge = &by_title.edges[0];
    assert_eq!(edge.cursor.sort_key(), "TITLE");
    assert_eq!(edge.cursor.sort_value(), &Value::Text("A".to_string()));
    assert_eq!(by_title.page_info.start_cursor, Some(edge.cursor_token()));
    assert_eq!(by_title.page_info.start_cursor, by_title.page_info.end_cursor);
}

#[test]
fn unsupported_sort_keys_fail_before_any_io() {
    let store = seeded();
    let definition = nodes();

    let err = ConnectionQueryHelper::new(
        &definition,
        ConnectionTarget::Root,
        &SortKey::new("POPULARITY"),
        None,
    )
    .expect_err("unsupported");

    assert!(matches!(
        err,
        ConnectionError::UnsupportedSortKey { ref sort_key, .. } if sort_key == "POPULARITY"
    ));
    assert_eq!(store.load_calls(), 0);
}

#[test]
fn prepared_connections_share_one_load() {
    let store = seeded();
    let definition = nodes();
    let buffer = EntityBuffer::new(&store);

    let by_date = ConnectionQueryHelper::new(
        &definition,
        ConnectionTarget::Root,
        &SortKey::new(CREATED_AT),
        None,
    )
    .expect("helper");
    let by_title =
        ConnectionQueryHelper::new(&definition, ConnectionTarget::Root, &SortKey::new("TITLE"), None)
            .expect("helper");

    let left = by_date
        .prepare(&buffer, &PageWindow::forward(3))
        .expect("prepare");
    let right = by_title
        .prepare(&buffer, &PageWindow::forward(3))
        .expect("prepare");
    assert_eq!(store.load_calls(), 0);

    let left = left.finish(&buffer).expect("finish");
    let right = right.finish(&buffer).expect("finish");

    assert_eq!(store.load_calls(), 1);
    assert_eq!(ids(&left), vec![text("e"), text("a"), text("c")]);
    assert_eq!(ids(&right), vec![text("a"), text("b"), text("c")]);
}

#[test]
fn parent_connections_scope_to_the_parent() {
    let mut store = MemoryStore::new();
    for (id, parent, created) in [(1i64, 7i64, 3i64), (2, 8, 1), (3, 7, 2)] {
        store.insert(
            "comment",
            Document::new(Key::Int(id))
                .with("entity_id", parent)
                .with("created", created),
        );
    }
    let definition = ConnectionDefinition::new("comments", "comment")
        .parent_field("entity_id")
        .sort(CREATED_AT, "created");

    let helper = ConnectionQueryHelper::new(
        &definition,
        ConnectionTarget::Parent(Key::Int(7)),
        &SortKey::new(CREATED_AT),
        None,
    )
    .expect("helper");
    let buffer = EntityBuffer::new(&store);
    let comments = helper
        .resolve(&buffer, &PageWindow::forward(10))
        .expect("resolve");

    assert_eq!(ids(&comments), vec![Key::Int(3), Key::Int(1)]);

    let err = ConnectionQueryHelper::new(
        &definition,
        ConnectionTarget::Root,
        &SortKey::new(CREATED_AT),
        None,
    )
    .expect_err("parent required");
    assert!(matches!(err, ConnectionError::MissingParent(_)));
}

#[test]
fn access_checked_connections_pass_the_account_to_the_store() {
    let mut store = seeded();
    store.set_view_policy(
        "node",
        Box::new(|doc: &Document, account: &Account| {
            account.id() == 1 || doc.get("created") != Some(&Value::Int(5))
        }),
    );
    let viewer = Account::new(2);

    let checked = nodes();
    let helper = ConnectionQueryHelper::new(
        &checked,
        ConnectionTarget::Root,
        &SortKey::new(CREATED_AT),
        Some(viewer.clone()),
    )
    .expect("helper");
    assert!(helper.build_query().access_account().is_some());

    let buffer = EntityBuffer::new(&store);
    let visible = helper
        .resolve(&buffer, &PageWindow::forward(2))
        .expect("resolve");
    assert_eq!(ids(&visible), vec![text("a"), text("c")]);

    let unchecked = nodes().access_check(false);
    let helper = ConnectionQueryHelper::new(
        &unchecked,
        ConnectionTarget::Root,
        &SortKey::new(CREATED_AT),
        Some(viewer),
    )
    .expect("helper");
    assert!(helper.build_query().access_account().is_none());
}

#[test]
fn base_filters_apply_to_every_page() {
    let store = seeded();
    let definition = nodes().filter(Predicate::gte("created", 15i64));

    let all = page(&store, &definition, &PaginationArgs::new(CREATED_AT).first(10));
    assert_eq!(ids(&all), vec![text("c"), text("b"), text("d")]);
}

// Drops one id at load time, as if it was deleted between query and load.
struct Vanishing {
    inner: MemoryStore,
    gone: Key,
}

impl EntityStore for Vanishing {
    type Entity = Document;

    fn query_ids(&self, query: &EntityQuery) -> Result<Vec<Key>, StoreError> {
        self.inner.query_ids(query)
    }

    fn load_multiple(
        &self,
        entity_type: &str,
        ids: &[Key],
    ) -> Result<Vec<Self::Entity>, StoreError> {
        let kept: Vec<Key> = ids.iter().filter(|id| **id != self.gone).cloned().collect();
        self.inner.load_multiple(entity_type, &kept)
    }
}

#[test]
fn vanished_entities_are_skipped() {
    let store = Vanishing {
        inner: seeded(),
        gone: text("a"),
    };

    let first = page(&store, &nodes(), &PaginationArgs::new(CREATED_AT).first(3));
    assert_eq!(ids(&first), vec![text("e"), text("c")]);
    assert!(first.page_info.has_next_page);
}

#[test]
fn window_validation() {
    let limits = PaginationConfig {
        default_page_size: 4,
        max_page_size: 8,
    };
    let args = || PaginationArgs::new(CREATED_AT);

    assert!(matches!(
        args().first(1).last(1).window(&limits),
        Err(ConnectionError::FirstAndLast)
    ));
    assert!(matches!(
        args().first(1).before("x").window(&limits),
        Err(ConnectionError::FirstWithBefore)
    ));
    assert!(matches!(
        args().last(1).after("x").window(&limits),
        Err(ConnectionError::LastWithAfter)
    ));
    assert!(matches!(
        args().first(9).window(&limits),
        Err(ConnectionError::PageSizeExceeded { requested: 9, max: 8 })
    ));

    let default = args().window(&limits).expect("default");
    assert_eq!(default.direction, PageDirection::Forward);
    assert_eq!(default.limit, 4);

    let before_only = args().before("tok").window(&limits).expect("before");
    assert_eq!(before_only.direction, PageDirection::Backward);
    assert_eq!(before_only.cursor.as_deref(), Some("tok"));
}

#[test]
fn registry_rejects_duplicates_and_unknown_names() {
    let mut registry = ConnectionRegistry::new();
    registry.register(nodes()).expect("register");

    assert!(matches!(
        registry.register(nodes()),
        Err(RegistryError::ConnectionAlreadyRegistered(name)) if name == "nodes"
    ));
    assert!(matches!(
        registry.get("groups"),
        Err(RegistryError::ConnectionNotFound(_))
    ));
    assert_eq!(registry.get("nodes").expect("get").entity_type(), "node");
}

#[test]
fn registry_builds_definitions_from_config() {
    let config = ConnectionConfig {
        name: "published_topics".to_string(),
        entity_type: "node".to_string(),
        parent_field: None,
        sorts: BTreeMap::from([(CREATED_AT.to_string(), "created".to_string())]),
        conditions: BTreeMap::from([
            ("status".to_string(), ConfigScalar::Int(1)),
            ("type".to_string(), ConfigScalar::Text("topic".to_string())),
        ]),
        access_check: true,
    };

    let registry = ConnectionRegistry::from_config(&[config]).expect("registry");
    let definition = registry.get("published_topics").expect("definition");

    assert_eq!(
        definition.sort_field(&SortKey::new(CREATED_AT)).expect("sort"),
        "created"
    );
    assert_eq!(
        definition.base_filter(),
        &Predicate::And(vec![
            Predicate::eq("status", 1i64),
            Predicate::eq("type", "topic"),
        ])
    );
}

///
/// Walk a collection with many duplicate sort values page by page and
/// check every row appears exactly once, in `(sort, id)` order.
///
fn walk(
    store: &MemoryStore,
    definition: &ConnectionDefinition,
    size: u32,
    backward: bool,
    reverse: bool,
) -> Vec<Key> {
    let helper = ConnectionQueryHelper::new(
        definition,
        ConnectionTarget::Root,
        &SortKey::new(CREATED_AT),
        None,
    )
    .expect("helper");

    let mut seen = Vec::new();
    let mut token = None;
    loop {
        let window = PageWindow {
            direction: if backward {
                PageDirection::Backward
            } else {
                PageDirection::Forward
            },
            limit: size,
            cursor: token.clone(),
            reverse,
        };
        let buffer = EntityBuffer::new(store);
        let page = helper.resolve(&buffer, &window).expect("page");

        let mut keys = ids(&page);
        if backward {
            keys.extend(seen);
            seen = keys;
            if !page.page_info.has_previous_page {
                break;
            }
            token = page.page_info.start_cursor;
        } else {
            seen.extend(keys);
            if !page.page_info.has_next_page {
                break;
            }
            token = page.page_info.end_cursor;
        }
    }

    seen
}

// Rows without the sort field order as null, before every value.
fn sparse_store(rows: &[(i64, Option<i64>)]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (id, created) in rows {
        let mut doc = Document::new(Key::Int(*id));
        if let Some(created) = created {
            doc = doc.with("created", *created);
        }
        store.insert("node", doc);
    }
    store
}

#[test]
fn rows_without_the_sort_field_are_paged_like_nulls() {
    let store = sparse_store(&[(1, None), (2, None), (3, None), (4, Some(5))]);
    let definition = nodes();
    let ints = |ids: &[i64]| ids.iter().map(|id| Key::Int(*id)).collect::<Vec<_>>();

    assert_eq!(walk(&store, &definition, 1, false, false), ints(&[1, 2, 3, 4]));
    assert_eq!(walk(&store, &definition, 1, true, false), ints(&[1, 2, 3, 4]));
    assert_eq!(walk(&store, &definition, 1, false, true), ints(&[4, 1, 2, 3]));
    assert_eq!(walk(&store, &definition, 2, true, true), ints(&[4, 1, 2, 3]));
}

proptest! {
    #[test]
    fn paging_visits_every_row_once_in_total_order(
        values in prop::collection::vec(prop::option::of(0i64..4), 0..24),
        size in 1u32..6,
        reverse in any::<bool>(),
    ) {
        let rows: Vec<(i64, Option<i64>)> = values
            .iter()
            .enumerate()
            .map(|(id, created)| (i64::try_from(id).expect("small index"), *created))
            .collect();
        let store = sparse_store(&rows);

        // `None` sorts first, matching a missing field ordered as null.
        let mut expected = rows.clone();
        if reverse {
            expected.sort_unstable_by(|(a_id, a), (b_id, b)| b.cmp(a).then(a_id.cmp(b_id)));
        } else {
            expected.sort_unstable_by(|(a_id, a), (b_id, b)| a.cmp(b).then(a_id.cmp(b_id)));
        }
        let expected: Vec<Key> = expected.into_iter().map(|(id, _)| Key::Int(id)).collect();

        let definition = nodes();
        prop_assert_eq!(walk(&store, &definition, size, false, reverse), expected.clone());
        prop_assert_eq!(walk(&store, &definition, size, true, reverse), expected);
    }
}
