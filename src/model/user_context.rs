use serde::{Deserialize, Serialize};

use crate::model::AuthorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
    Anonymous,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "administrator" => Some(Role::Administrator),
            "editor" => Some(Role::Editor),
            "author" => Some(Role::Author),
            "contributor" => Some(Role::Contributor),
            "subscriber" => Some(Role::Subscriber),
            _ => None,
        }
    }
}

/// Identity of the caller, extracted from request headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<AuthorId>,
    pub role: Role,
}

impl UserContext {
    pub fn new(user_id: AuthorId, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            role,
        }
    }

    /// Caller without identity headers
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: Role::Anonymous,
        }
    }

    pub fn is_author_of(&self, author: AuthorId) -> bool {
        self.user_id == Some(author)
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
