use crate::{
    config::{AccessConfig, BundleConfig},
    db::{
        access::{
            ACCESS_CONTENT, AccessContributor, AccessFilterChain, AccessPolicyContext, Account,
            AccountPermissions, BYPASS_CONTENT_ACCESS, CONTENT_ACCESS_GROUP,
            ContentVisibilityFilter, VIEW_OWN_UNPUBLISHED,
        },
        predicate::Predicate,
        search::{ConditionScope, IndexSchema, MemoryIndex},
        store::Document,
    },
    key::Key,
    obs::AccessOutcome,
};

const FULL_SCHEMA: [&str; 5] = ["type", "status", "uid", "field_content_visibility", "groups"];

fn settings() -> AccessConfig {
    let bundle = |bundle: &str, visibility: &[&str]| BundleConfig {
        entity_type: "node".to_string(),
        bundle: bundle.to_string(),
        visibility: visibility.iter().map(ToString::to_string).collect(),
    };

    AccessConfig {
        bundles: vec![
            bundle("topic", &["public", "community", "group"]),
            bundle("event", &["public", "community"]),
            bundle("page", &[]),
        ],
        ..AccessConfig::default()
    }
}

fn doc(id: i64, bundle: &str, visibility: Option<&str>, status: i64, uid: i64) -> Document {
    let doc = Document::new(Key::Int(id))
        .with("type", bundle)
        .with("status", status)
        .with("uid", uid);
    match visibility {
        Some(v) => doc.with("field_content_visibility", v),
        None => doc,
    }
}

fn index_with(schema: &[&str]) -> MemoryIndex {
    let mut index = MemoryIndex::new(IndexSchema::new(schema.iter().copied()));
    index.index(doc(1, "topic", Some("public"), 1, 10));
    index.index(doc(2, "topic", Some("community"), 1, 10));
    index.index(doc(3, "topic", Some("group"), 1, 11).with("groups", vec![100i64]));
    index.index(doc(4, "topic", Some("community"), 0, 20));
    index.index(doc(5, "page", None, 1, 11));
    index.index(doc(6, "event", Some("public"), 1, 12));
    index
}

fn search(index: &MemoryIndex, account: &Account) -> (Vec<i64>, Vec<AccessOutcome>) {
    let chain = AccessFilterChain::from_config(&settings());
    let mut query = index.query();
    let ctx = AccessPolicyContext::new(account, &AccountPermissions);
    let outcomes = chain
        .apply(&mut query, &ctx)
        .into_iter()
        .map(|(_, outcome)| outcome)
        .collect();

    let ids = index
        .search(&query)
        .into_iter()
        .map(|key| match key {
            Key::Int(id) => id,
            Key::Text(_) => unreachable!("fixture keys are numeric"),
        })
        .collect();

    (ids, outcomes)
}

fn view(bundle: &str, visibility: &str) -> String {
    format!("view node.{bundle}.field_content_visibility:{visibility} content")
}

#[test]
fn bypass_sets_group_to_true_and_siblings_stand_down() {
    let index = index_with(&FULL_SCHEMA);
    let account = Account::new(50)
        .with_permission(BYPASS_CONTENT_ACCESS)
        .with_group(100);

    let chain = AccessFilterChain::from_config(&settings());
    let mut query = index.query();
    let outcomes = chain.apply(
        &mut query,
        &AccessPolicyContext::new(&account, &AccountPermissions),
    );

    assert_eq!(
        outcomes,
        vec![
            ("content_visibility", AccessOutcome::Bypassed),
            ("group_membership", AccessOutcome::Skipped),
        ]
    );
    assert!(query.conditions().is_bypassed(CONTENT_ACCESS_GROUP));
    assert_eq!(
        query.conditions().group_predicate(CONTENT_ACCESS_GROUP),
        Some(Predicate::True)
    );
    assert_eq!(index.search(&query).len(), 6);
}

#[test]
fn no_permissions_yields_a_never_matching_condition() {
    let index = index_with(&FULL_SCHEMA);
    let (ids, outcomes) = search(&index, &Account::new(30));

    assert!(ids.is_empty());
    assert_eq!(outcomes[0], AccessOutcome::DeniedAll);

    let chain = AccessFilterChain::from_config(&settings());
    let mut query = index.query();
    let account = Account::new(30);
    chain.apply(
        &mut query,
        &AccessPolicyContext::new(&account, &AccountPermissions),
    );
    assert_eq!(
        query.conditions().group_predicate(CONTENT_ACCESS_GROUP),
        Some(Predicate::Or(vec![Predicate::eq("uid", -1i64)]))
    );
}

#[test]
fn visibility_permission_adds_one_branch_per_granted_pair() {
    let index = index_with(&FULL_SCHEMA);
    let account = Account::new(30).with_permission(view("topic", "public"));

    let chain = AccessFilterChain::from_config(&settings());
    let mut query = index.query();
    chain.apply(
        &mut query,
        &AccessPolicyContext::new(&account, &AccountPermissions),
    );

    assert_eq!(
        query.conditions().group_predicate(CONTENT_ACCESS_GROUP),
        Some(Predicate::Or(vec![Predicate::And(vec![
            Predicate::eq("type", "topic"),
            Predicate::eq("field_content_visibility", "public"),
            Predicate::eq("status", 1i64),
        ])]))
    );
    assert_eq!(index.search(&query), vec![Key::Int(1)]);
}

#[test]
fn unpublished_content_needs_the_own_content_exception() {
    let index = index_with(&FULL_SCHEMA);

    // Author 20 can see community topics but not their own unpublished one.
    let plain = Account::new(20).with_permission(view("topic", "community"));
    assert_eq!(search(&index, &plain).0, vec![2]);

    // The own-unpublished exception alone opens the author's item even
    // though the community visibility permission is missing.
    let owner = Account::new(20).with_permission(VIEW_OWN_UNPUBLISHED);
    let (ids, outcomes) = search(&index, &owner);
    assert_eq!(ids, vec![4]);
    assert_eq!(outcomes[0], AccessOutcome::Branches(1));

    let both = Account::new(20)
        .with_permission(VIEW_OWN_UNPUBLISHED)
        .with_permission(view("topic", "public"));
    assert_eq!(search(&index, &both).0, vec![1, 4]);
}

#[test]
fn anonymous_accounts_never_get_the_own_content_branch() {
    let index = index_with(&FULL_SCHEMA);
    let anonymous = Account::anonymous().with_permission(VIEW_OWN_UNPUBLISHED);

    let (ids, outcomes) = search(&index, &anonymous);
    assert!(ids.is_empty());
    assert_eq!(outcomes[0], AccessOutcome::DeniedAll);
}

#[test]
fn bundles_without_visibility_fall_back_to_access_content() {
    let index = index_with(&FULL_SCHEMA);
    let account = Account::new(30).with_permission(ACCESS_CONTENT);

    assert_eq!(search(&index, &account).0, vec![5]);
}

#[test]
fn group_members_see_group_visibility_content() {
    let index = index_with(&FULL_SCHEMA);

    let member = Account::new(30).with_group(100);
    let (ids, outcomes) = search(&index, &member);
    assert_eq!(ids, vec![3]);
    assert_eq!(
        outcomes,
        vec![AccessOutcome::DeniedAll, AccessOutcome::Branches(1)]
    );

    let outsider = Account::new(30).with_group(200);
    assert!(search(&index, &outsider).0.is_empty());
}

#[test]
fn missing_bundle_field_skips_the_filter() {
    let index = index_with(&["status", "uid", "field_content_visibility"]);
    let (ids, outcomes) = search(&index, &Account::new(30));

    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(
        outcomes,
        vec![AccessOutcome::Skipped, AccessOutcome::Skipped]
    );
}

#[test]
fn unindexed_visibility_field_treats_every_bundle_as_unscoped() {
    let index = index_with(&["type", "status", "uid"]);
    let account = Account::new(30).with_permission(ACCESS_CONTENT);

    assert_eq!(search(&index, &account).0, vec![1, 2, 3, 5, 6]);
}

#[test]
fn unindexed_status_field_drops_the_published_condition() {
    let index = index_with(&["type", "uid", "field_content_visibility"]);
    let account = Account::new(30).with_permission(view("topic", "community"));

    assert_eq!(search(&index, &account).0, vec![2, 4]);
}

#[test]
fn custom_contributors_honour_an_earlier_bypass() {
    struct AuthorOnly;

    impl AccessContributor for AuthorOnly {
        fn name(&self) -> &'static str {
            "author_only"
        }

        fn contribute(
            &self,
            scope: &mut ConditionScope<'_>,
            ctx: &AccessPolicyContext<'_>,
            _schema: &IndexSchema,
        ) -> AccessOutcome {
            if scope.is_bypassed() {
                return AccessOutcome::Skipped;
            }
            scope.push(Predicate::eq("uid", ctx.account().id()));
            AccessOutcome::Branches(1)
        }
    }

    let index = index_with(&FULL_SCHEMA);
    let chain = AccessFilterChain::new(CONTENT_ACCESS_GROUP)
        .with(ContentVisibilityFilter::new(settings()))
        .with(AuthorOnly);

    let admin = Account::new(10).with_permission(BYPASS_CONTENT_ACCESS);
    let mut query = index.query();
    let outcomes = chain.apply(
        &mut query,
        &AccessPolicyContext::new(&admin, &AccountPermissions),
    );
    assert_eq!(outcomes[1], ("author_only", AccessOutcome::Skipped));
    assert_eq!(index.search(&query).len(), 6);

    let author = Account::new(10);
    let mut query = index.query();
    chain.apply(
        &mut query,
        &AccessPolicyContext::new(&author, &AccountPermissions),
    );
    assert_eq!(index.search(&query), vec![Key::Int(1), Key::Int(2)]);
}
