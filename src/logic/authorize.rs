use crate::model::{Page, PostStatus, Role, UserContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Edit,
    Delete,
    Publish,
    /// Act on pages owned by someone else (reassign authors, list drafts)
    EditOthers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        *self == Access::Allowed
    }
}

impl From<bool> for Access {
    fn from(allowed: bool) -> Self {
        if allowed {
            Access::Allowed
        } else {
            Access::Denied
        }
    }
}

/// Decides whether a caller may perform an operation on a page.
///
/// Invoked by the post layer for every operation, whether the page was
/// addressed by id or by path. `page` is `None` for operations that have no
/// target yet (create).
pub trait Authorizer: Send + Sync {
    fn authorize(&self, operation: Operation, page: Option<&Page>, user: &UserContext) -> Access;
}

/// Role-based rules modelled on the default page capabilities
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl RoleAuthorizer {
    fn can_edit(page: &Page, user: &UserContext) -> bool {
        match user.role {
            Role::Administrator | Role::Editor => true,
            Role::Author => user.is_author_of(page.author),
            Role::Contributor => {
                user.is_author_of(page.author) && page.status != PostStatus::Publish
            }
            Role::Subscriber | Role::Anonymous => false,
        }
    }
}

impl Authorizer for RoleAuthorizer {
    fn authorize(&self, operation: Operation, page: Option<&Page>, user: &UserContext) -> Access {
        let allowed = match (operation, page) {
            (Operation::Create, _) => matches!(
                user.role,
                Role::Administrator | Role::Editor | Role::Author | Role::Contributor
            ),
            (Operation::Publish, _) => {
                matches!(user.role, Role::Administrator | Role::Editor | Role::Author)
            }
            (Operation::EditOthers, _) => matches!(user.role, Role::Administrator | Role::Editor),
            (Operation::Read, Some(page)) => match page.status {
                PostStatus::Publish => true,
                PostStatus::Private => {
                    matches!(user.role, Role::Administrator | Role::Editor)
                        || user.is_author_of(page.author)
                }
                _ => Self::can_edit(page, user),
            },
            (Operation::Edit | Operation::Delete, Some(page)) => Self::can_edit(page, user),
            (Operation::Read | Operation::Edit | Operation::Delete, None) => false,
        };
        Access::from(allowed)
    }
}
