use crate::model::{ChildQuery, MetaEntry, NewPage, Page, PageId, PageQuery};
use anyhow::Result;

/// Deepest ancestor chain followed when deriving a full path
pub const MAX_HIERARCHY_DEPTH: usize = 64;

#[async_trait::async_trait]
pub trait PageStore: Send + Sync {
    async fn get_page(&self, id: PageId) -> Result<Option<Page>>;

    /// All pages of `post_type` whose derived full path equals `path`
    /// exactly, ordered by id ascending.
    async fn find_by_full_path(&self, post_type: &str, path: &str) -> Result<Vec<Page>>;

    /// Direct children ordered by `menu_order` ascending, then id.
    async fn list_children(&self, query: &ChildQuery) -> Result<Vec<Page>>;

    /// Slug chain from the root down to `id`, joined with `/`.
    ///
    /// A parent reference that points at a missing page ends the chain. A
    /// loop or a chain deeper than [`MAX_HIERARCHY_DEPTH`] is an error.
    async fn full_path_of(&self, id: PageId) -> Result<String>;

    /// Returns the requested window and the total number of matches.
    async fn list_pages(&self, query: &PageQuery) -> Result<(Vec<Page>, usize)>;

    async fn insert_page(&self, page: NewPage) -> Result<Page>;
    async fn update_page(&self, page: Page) -> Result<()>;

    /// Permanently remove a page, moving its children up to its parent.
    async fn delete_page(&self, id: PageId) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait MetaStore: Send + Sync {
    async fn list_meta(&self, id: PageId) -> Result<Vec<MetaEntry>>;
    async fn set_meta(&self, id: PageId, entry: MetaEntry) -> Result<()>;
}

pub trait Store: PageStore + MetaStore {}
