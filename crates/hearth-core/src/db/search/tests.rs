use crate::{
    db::{
        predicate::Predicate,
        search::{Conjunction, IndexSchema, MemoryIndex, SearchConditions},
        store::Document,
    },
    key::Key,
};

#[test]
fn untouched_group_is_omitted() {
    let mut conditions = SearchConditions::new();
    conditions.add(Predicate::eq("type", "topic"));
    let _ = conditions.scope("content_access", Conjunction::Or);

    assert!(conditions.has_group("content_access"));
    assert_eq!(conditions.group_predicate("content_access"), None);
    assert_eq!(conditions.to_predicate(), Predicate::eq("type", "topic"));
}

#[test]
fn contributed_empty_group_matches_nothing() {
    let mut conditions = SearchConditions::new();
    conditions
        .scope("content_access", Conjunction::Or)
        .mark_contributed();

    assert_eq!(conditions.to_predicate(), Predicate::False);
}

#[test]
fn bypass_renders_true_and_drops_later_pushes() {
    let mut conditions = SearchConditions::new();

    {
        let mut scope = conditions.scope("content_access", Conjunction::Or);
        scope.push(Predicate::eq("uid", 3i64));
        scope.bypass();
        scope.push(Predicate::eq("type", "topic"));
        assert_eq!(scope.conditions(), &[Predicate::True]);
    }

    assert!(conditions.is_bypassed("content_access"));
    assert_eq!(
        conditions.group_predicate("content_access"),
        Some(Predicate::True)
    );

    // A sibling contributor reopening the same group sees the flag.
    let sibling = conditions.scope("content_access", Conjunction::Or);
    assert!(sibling.is_bypassed());
}

#[test]
fn groups_are_isolated_from_each_other() {
    let mut conditions = SearchConditions::new();
    conditions
        .scope("content_access", Conjunction::Or)
        .push(Predicate::eq("uid", 1i64));
    conditions
        .scope("language", Conjunction::And)
        .push(Predicate::eq("langcode", "en"));
    conditions.scope("content_access", Conjunction::Or).bypass();

    assert!(!conditions.is_bypassed("language"));
    assert_eq!(
        conditions.to_predicate(),
        Predicate::And(vec![
            Predicate::True,
            Predicate::And(vec![Predicate::eq("langcode", "en")]),
        ])
    );
}

#[test]
fn memory_index_filters_by_lowered_predicate() {
    let mut index = MemoryIndex::new(IndexSchema::new(["type", "status"]));
    index.index(Document::new(Key::Int(1)).with("type", "topic").with("status", 1i64));
    index.index(Document::new(Key::Int(2)).with("type", "event").with("status", 1i64));
    index.index(Document::new(Key::Int(3)).with("type", "topic").with("status", 0i64));

    let mut query = index.query();
    let (schema, conditions) = query.parts_mut();
    assert!(schema.has_field("status"));
    conditions
        .scope("published", Conjunction::And)
        .push(Predicate::eq("status", 1i64));
    conditions.add(Predicate::eq("type", "topic"));

    assert_eq!(index.search(&query), vec![Key::Int(1)]);
}
