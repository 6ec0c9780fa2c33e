use crate::{
    config::{AccessConfig, BundleConfig},
    db::{
        access::{
            ACCESS_CONTENT, AccessPolicyContext, BYPASS_CONTENT_ACCESS, BundleRef,
            VIEW_OWN_UNPUBLISHED, VisibilityPermission,
        },
        predicate::Predicate,
        search::{ConditionScope, Conjunction, IndexSchema, SearchQuery},
    },
    obs::sink::{AccessOutcome, MetricsEvent, record},
    value::Value,
};

/// Name of the condition group content access contributors share.
pub const CONTENT_ACCESS_GROUP: &str = "content_access";

/// Author id no account can have; `author = NO_AUTHOR` matches nothing.
const NO_AUTHOR: i64 = -1;

/// Status value of published content.
const PUBLISHED: i64 = 1;

///
/// AccessContributor
///
/// One independent participant in the shared access group. Receives only
/// its group's scope and must honour the bypass flag set by siblings.
///

pub trait AccessContributor {
    fn name(&self) -> &'static str;

    fn contribute(
        &self,
        scope: &mut ConditionScope<'_>,
        ctx: &AccessPolicyContext<'_>,
        schema: &IndexSchema,
    ) -> AccessOutcome;
}

///
/// ContentVisibilityFilter
///
/// Bundle × visibility permissions, the own-content exception, and the
/// bypass shortcut.
///

#[derive(Clone, Debug)]
pub struct ContentVisibilityFilter {
    settings: AccessConfig,
}

impl ContentVisibilityFilter {
    #[must_use]
    pub const fn new(settings: AccessConfig) -> Self {
        Self { settings }
    }

    fn published(&self, schema: &IndexSchema) -> Option<Predicate> {
        schema
            .has_field(&self.settings.status_field)
            .then(|| Predicate::eq(self.settings.status_field.as_str(), PUBLISHED))
    }

    fn bundle_branch(
        &self,
        bundle: &BundleConfig,
        visibility: Option<&str>,
        published: Option<&Predicate>,
    ) -> Predicate {
        let mut parts = vec![Predicate::eq(
            self.settings.bundle_field.as_str(),
            bundle.bundle.as_str(),
        )];
        if let Some(value) = visibility {
            parts.push(Predicate::eq(self.settings.visibility_field.as_str(), value));
        }
        if let Some(published) = published {
            parts.push(published.clone());
        }

        Predicate::And(parts)
    }
}

impl AccessContributor for ContentVisibilityFilter {
    fn name(&self) -> &'static str {
        "content_visibility"
    }

    fn contribute(
        &self,
        scope: &mut ConditionScope<'_>,
        ctx: &AccessPolicyContext<'_>,
        schema: &IndexSchema,
    ) -> AccessOutcome {
        if !schema.has_field(&self.settings.bundle_field) {
            tracing::debug!(
                field = %self.settings.bundle_field,
                "bundle field not indexed; content visibility filter skipped"
            );
            return AccessOutcome::Skipped;
        }

        if ctx.has(BYPASS_CONTENT_ACCESS) {
            scope.bypass();
            return AccessOutcome::Bypassed;
        }
        if scope.is_bypassed() {
            return AccessOutcome::Skipped;
        }

        scope.mark_contributed();

        let published = self.published(schema);
        let visibility_indexed = schema.has_field(&self.settings.visibility_field);
        let mut branches = 0u64;

        for bundle in &self.settings.bundles {
            if visibility_indexed && !bundle.visibility.is_empty() {
                let bundle_ref = BundleRef::new(bundle.entity_type.as_str(), bundle.bundle.as_str());
                for value in &bundle.visibility {
                    let permission = VisibilityPermission::view(
                        bundle_ref.clone(),
                        self.settings.visibility_field.as_str(),
                        value.as_str(),
                    );
                    if ctx.has(&permission.to_string()) {
                        scope.push(self.bundle_branch(
                            bundle,
                            Some(value.as_str()),
                            published.as_ref(),
                        ));
                        branches += 1;
                    }
                }
            } else if ctx.has(ACCESS_CONTENT) {
                scope.push(self.bundle_branch(bundle, None, published.as_ref()));
                branches += 1;
            }
        }

        let account = ctx.account();
        if !account.is_anonymous() && ctx.has(VIEW_OWN_UNPUBLISHED) {
            scope.push(Predicate::eq(
                self.settings.author_field.as_str(),
                account.id(),
            ));
            branches += 1;
        }

        if branches == 0 {
            scope.push(Predicate::eq(self.settings.author_field.as_str(), NO_AUTHOR));
            return AccessOutcome::DeniedAll;
        }

        AccessOutcome::Branches(branches)
    }
}

///
/// GroupMembershipFilter
///
/// Opens membership-scoped visibility (e.g. `group`) to members of the
/// content's group.
///

#[derive(Clone, Debug)]
pub struct GroupMembershipFilter {
    settings: AccessConfig,
}

impl GroupMembershipFilter {
    #[must_use]
    pub const fn new(settings: AccessConfig) -> Self {
        Self { settings }
    }
}

impl AccessContributor for GroupMembershipFilter {
    fn name(&self) -> &'static str {
        "group_membership"
    }

    fn contribute(
        &self,
        scope: &mut ConditionScope<'_>,
        ctx: &AccessPolicyContext<'_>,
        schema: &IndexSchema,
    ) -> AccessOutcome {
        if scope.is_bypassed() {
            return AccessOutcome::Skipped;
        }

        let s = &self.settings;
        if ![&s.bundle_field, &s.visibility_field, &s.group_field]
            .iter()
            .all(|field| schema.has_field(field))
        {
            return AccessOutcome::Skipped;
        }

        let groups: Vec<Value> = ctx
            .account()
            .group_ids()
            .iter()
            .map(|id| Value::Int(*id))
            .collect();
        if groups.is_empty() {
            return AccessOutcome::Skipped;
        }

        let published = schema
            .has_field(&s.status_field)
            .then(|| Predicate::eq(s.status_field.as_str(), PUBLISHED));

        let mut branches = 0u64;
        for bundle in &s.bundles {
            for value in bundle
                .visibility
                .iter()
                .filter(|v| s.is_membership_visibility(v))
            {
                let mut parts = vec![
                    Predicate::eq(s.bundle_field.as_str(), bundle.bundle.as_str()),
                    Predicate::eq(s.visibility_field.as_str(), value.as_str()),
                    Predicate::in_(s.group_field.as_str(), groups.clone()),
                ];
                if let Some(published) = &published {
                    parts.push(published.clone());
                }
                scope.push(Predicate::And(parts));
                branches += 1;
            }
        }

        if branches == 0 {
            AccessOutcome::Skipped
        } else {
            AccessOutcome::Branches(branches)
        }
    }
}

///
/// AccessFilterChain
///
/// Ordered contributors sharing one access group on a search query.
///

pub struct AccessFilterChain {
    group: String,
    contributors: Vec<Box<dyn AccessContributor>>,
}

impl AccessFilterChain {
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            contributors: Vec::new(),
        }
    }

    /// The standard chain: content visibility, then group membership.
    #[must_use]
    pub fn from_config(settings: &AccessConfig) -> Self {
        Self::new(CONTENT_ACCESS_GROUP)
            .with(ContentVisibilityFilter::new(settings.clone()))
            .with(GroupMembershipFilter::new(settings.clone()))
    }

    #[must_use]
    pub fn with(mut self, contributor: impl AccessContributor + 'static) -> Self {
        self.contributors.push(Box::new(contributor));
        self
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Apply every contributor to the query's access group, in order.
    pub fn apply(
        &self,
        query: &mut SearchQuery,
        ctx: &AccessPolicyContext<'_>,
    ) -> Vec<(&'static str, AccessOutcome)> {
        let (schema, conditions) = query.parts_mut();
        let mut scope = conditions.scope(&self.group, Conjunction::Or);

        self.contributors
            .iter()
            .map(|contributor| {
                let outcome = contributor.contribute(&mut scope, ctx, schema);
                tracing::debug!(
                    contributor = contributor.name(),
                    account = ctx.account().id(),
                    ?outcome,
                    "access contributor applied"
                );
                record(MetricsEvent::Access { outcome });

                (contributor.name(), outcome)
            })
            .collect()
    }
}
