use crate::db::access::Account;
use std::fmt;

/// Skips every content visibility check.
pub const BYPASS_CONTENT_ACCESS: &str = "bypass node access";

/// Lets an author see their own content whatever its status or visibility.
pub const VIEW_OWN_UNPUBLISHED: &str = "view own unpublished content";

/// Grants published content of bundles that carry no visibility field.
pub const ACCESS_CONTENT: &str = "access content";

///
/// PermissionChecker
///
/// Permission-check collaborator. Permissions match by exact string.
///

pub trait PermissionChecker {
    fn has_permission(&self, account: &Account, permission: &str) -> bool;
}

///
/// AccountPermissions
/// Reads the permission set carried on the account itself.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct AccountPermissions;

impl PermissionChecker for AccountPermissions {
    fn has_permission(&self, account: &Account, permission: &str) -> bool {
        account.permissions().contains(permission)
    }
}

///
/// BundleRef
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BundleRef {
    pub entity_type: String,
    pub bundle: String,
}

impl BundleRef {
    #[must_use]
    pub fn new(entity_type: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
        }
    }
}

impl fmt::Display for BundleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.bundle)
    }
}

///
/// VisibilityPermission
///
/// Structured form of a visibility-scoped permission. Renders as
/// `"<action> <entity_type>.<bundle>.<field>:<value> content"`, the exact
/// string the permission registry matches on.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VisibilityPermission {
    pub action: String,
    pub bundle: BundleRef,
    pub field: String,
    pub value: String,
}

impl VisibilityPermission {
    #[must_use]
    pub fn view(bundle: BundleRef, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: "view".to_string(),
            bundle,
            field: field.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for VisibilityPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{}:{} content",
            self.action, self.bundle, self.field, self.value
        )
    }
}

///
/// AccessPolicyContext
///
/// Viewing account plus its permission collaborator, consulted while one
/// query is built.
///

#[derive(Clone, Copy)]
pub struct AccessPolicyContext<'a> {
    account: &'a Account,
    permissions: &'a dyn PermissionChecker,
}

impl<'a> AccessPolicyContext<'a> {
    #[must_use]
    pub const fn new(account: &'a Account, permissions: &'a dyn PermissionChecker) -> Self {
        Self {
            account,
            permissions,
        }
    }

    #[must_use]
    pub const fn account(&self) -> &'a Account {
        self.account
    }

    #[must_use]
    pub fn has(&self, permission: &str) -> bool {
        self.permissions.has_permission(self.account, permission)
    }
}

///
/// TESTS
///
