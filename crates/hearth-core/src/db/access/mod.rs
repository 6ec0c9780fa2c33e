//! Module: access
//! Responsibility: rewrite a search query's access group so only content the
//! viewing account may see can match.
//! Does not own: the condition tree itself (see `db::search`) or entity-level
//! access on connections (delegated to the store).
//! Boundary: authorization never errors; forbidden and empty look the same.

mod account;
mod filter;
mod permission;

#[cfg(test)]
mod tests;

pub use account::{ANONYMOUS_ID, Account};
pub use filter::{
    AccessContributor, AccessFilterChain, CONTENT_ACCESS_GROUP, ContentVisibilityFilter,
    GroupMembershipFilter,
};
pub use permission::{
    ACCESS_CONTENT, AccessPolicyContext, AccountPermissions, BYPASS_CONTENT_ACCESS, BundleRef,
    PermissionChecker, VIEW_OWN_UNPUBLISHED, VisibilityPermission,
};
