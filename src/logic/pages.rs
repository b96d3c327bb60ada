use crate::error::ApiError;
use crate::logic::compose::PageComposer;
use crate::logic::posts::{DeleteOutcome, ListQuery, PostOperations};
use crate::logic::resolve::PathResolver;
use crate::model::{Context, Page, PageEnvelope, PageId, PageUpdate, RequestContext, UserContext};
use crate::store::traits::Store;

/// Composed page together with the page it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPage {
    pub page: Page,
    pub envelope: PageEnvelope,
}

/// Listing of composed pages plus paging totals
#[derive(Debug, Clone, PartialEq)]
pub struct PageListing {
    pub items: Vec<PageEnvelope>,
    pub total: usize,
    pub total_pages: usize,
}

/// Page resource: the generic post operations, addressable by id or by
/// hierarchical path, with hierarchical read responses.
///
/// The path-addressed operations resolve the path and then call the very
/// same id-addressed operation, so both share authorization and validation.
pub struct PageOperations<S: Store> {
    posts: PostOperations<S>,
}

impl<S: Store> PageOperations<S> {
    pub fn new(posts: PostOperations<S>) -> Self {
        Self { posts }
    }

    pub fn posts(&self) -> &PostOperations<S> {
        &self.posts
    }

    pub async fn resolve(&self, path: &str) -> Result<Page, ApiError> {
        PathResolver::resolve(self.posts.store(), self.posts.post_type(), path).await
    }

    pub async fn get_page(
        &self,
        id: PageId,
        context: Context,
        user: &UserContext,
    ) -> Result<ComposedPage, ApiError> {
        let page = self.posts.read_post(id, context, user).await?;
        let envelope = PageComposer::compose(&self.posts, &page, context).await?;
        Ok(ComposedPage { page, envelope })
    }

    pub async fn get_page_by_path(
        &self,
        path: &str,
        context: Context,
        user: &UserContext,
    ) -> Result<ComposedPage, ApiError> {
        let page = self.resolve(path).await?;
        self.get_page(page.id, context, user).await
    }

    /// Apply an edit and return the page as it now reads
    pub async fn edit_page(
        &self,
        id: PageId,
        update: PageUpdate,
        request: &RequestContext,
    ) -> Result<ComposedPage, ApiError> {
        let page = self.posts.edit_post(id, update, request).await?;
        self.get_page(page.id, Context::View, &request.user).await
    }

    pub async fn edit_page_by_path(
        &self,
        path: &str,
        update: PageUpdate,
        request: &RequestContext,
    ) -> Result<ComposedPage, ApiError> {
        let page = self.resolve(path).await?;
        self.edit_page(page.id, update, request).await
    }

    pub async fn delete_page(
        &self,
        id: PageId,
        force: bool,
        user: &UserContext,
    ) -> Result<DeleteOutcome, ApiError> {
        self.posts.delete_post(id, force, user).await
    }

    pub async fn delete_page_by_path(
        &self,
        path: &str,
        force: bool,
        user: &UserContext,
    ) -> Result<DeleteOutcome, ApiError> {
        let page = self.resolve(path).await?;
        self.delete_page(page.id, force, user).await
    }

    pub async fn create_page(
        &self,
        update: PageUpdate,
        user: &UserContext,
    ) -> Result<ComposedPage, ApiError> {
        let page = self.posts.create_post(update, user).await?;
        self.get_page(page.id, Context::View, user).await
    }

    pub async fn list_pages(
        &self,
        query: &ListQuery,
        context: Context,
        user: &UserContext,
    ) -> Result<PageListing, ApiError> {
        let listing = self.posts.list_posts(query, user).await?;

        let mut items = Vec::with_capacity(listing.pages.len());
        for page in &listing.pages {
            items.push(PageComposer::compose(&self.posts, page, context).await?);
        }

        Ok(PageListing {
            items,
            total: listing.total,
            total_pages: listing.total_pages,
        })
    }
}
