use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AuthorId, PageId, PostStatus, PAGE_TYPE};

/// A stored page, decoded once at the storage boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub post_type: String,
    pub parent: Option<PageId>,
    #[serde(default)]
    pub menu_order: i32,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub author: AuthorId,
    pub date: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Input model for creating a page; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub post_type: String,
    pub parent: Option<PageId>,
    pub menu_order: i32,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub author: AuthorId,
}

impl NewPage {
    pub fn new(title: &str, slug: &str, author: AuthorId) -> Self {
        Self {
            post_type: PAGE_TYPE.to_string(),
            parent: None,
            menu_order: 0,
            slug: slug.to_string(),
            title: title.to_string(),
            content: String::new(),
            excerpt: String::new(),
            status: PostStatus::Publish,
            author,
        }
    }

    pub fn with_parent(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_menu_order(mut self, menu_order: i32) -> Self {
        self.menu_order = menu_order;
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    /// Convert to a full Page with store-assigned fields
    pub fn into_page(self, id: PageId, now: DateTime<Utc>) -> Page {
        Page {
            id,
            post_type: self.post_type,
            parent: self.parent,
            menu_order: self.menu_order,
            slug: self.slug,
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            status: self.status,
            author: self.author,
            date: now,
            modified: now,
        }
    }
}

/// Request body for create and edit.
///
/// `parent: 0` detaches the page from its parent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub slug: Option<String>,
    pub parent: Option<PageId>,
    pub menu_order: Option<i32>,
    pub author: Option<AuthorId>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub post_meta: Option<Vec<MetaEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: serde_json::Value,
}

impl MetaEntry {
    pub fn new(key: &str, value: serde_json::Value) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }

    /// Keys with a leading underscore are internal and never exposed
    pub fn is_protected(&self) -> bool {
        self.key.starts_with('_')
    }
}

/// Selects the direct children of a page
#[derive(Debug, Clone, PartialEq)]
pub struct ChildQuery {
    pub parent: PageId,
    pub post_type: String,
    pub status: Option<PostStatus>,
}

impl ChildQuery {
    /// Published pages under `parent`, the default public listing
    pub fn published(parent: PageId) -> Self {
        Self {
            parent,
            post_type: PAGE_TYPE.to_string(),
            status: Some(PostStatus::Publish),
        }
    }
}

/// Paged listing of pages, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub post_type: String,
    pub statuses: Vec<PostStatus>,
    pub offset: usize,
    pub limit: usize,
}
