use std::collections::BTreeSet;

/// Id of the anonymous account.
pub const ANONYMOUS_ID: i64 = 0;

///
/// Account
///
/// The viewing account for one request: id, granted permissions, and the
/// groups it is a member of. Derived per request, never persisted here.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Account {
    id: i64,
    permissions: BTreeSet<String>,
    group_ids: BTreeSet<i64>,
}

impl Account {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_ID)
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group_ids.insert(group_id);
        self
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.id == ANONYMOUS_ID
    }

    #[must_use]
    pub const fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    #[must_use]
    pub const fn group_ids(&self) -> &BTreeSet<i64> {
        &self.group_ids
    }
}
