use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::logic::authorize::{Authorizer, Operation};
use crate::logic::hooks::HookRegistry;
use crate::logic::links::UrlBuilder;
use crate::model::{
    sanitize_slug, ChildQuery, Context, Links, MetaEntry, NewPage, Page, PageId, PageQuery,
    PageUpdate, PostRepresentation, PostStatus, RequestContext, UserContext,
};
use crate::store::traits::{Store, MAX_HIERARCHY_DEPTH};

const DEFAULT_PER_PAGE: usize = 10;
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub message: String,
}

impl DeleteOutcome {
    fn trashed() -> Self {
        Self {
            message: "Deleted post".to_string(),
        }
    }

    fn permanently_deleted() -> Self {
        Self {
            message: "Permanently deleted post".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub status: Option<PostStatus>,
}

/// One page of a listing plus the total number of matches
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub pages: Vec<Page>,
    pub total: usize,
    pub total_pages: usize,
}

/// Generic id-addressed CRUD over posts of one type.
///
/// Authorization, validation and error codes live here so that every way of
/// addressing a post (by id or by path) shares them.
pub struct PostOperations<S: Store> {
    store: Arc<S>,
    authorizer: Arc<dyn Authorizer>,
    hooks: Arc<HookRegistry>,
    urls: UrlBuilder,
    post_type: String,
}

impl<S: Store> PostOperations<S> {
    pub fn new(
        store: Arc<S>,
        authorizer: Arc<dyn Authorizer>,
        hooks: Arc<HookRegistry>,
        urls: UrlBuilder,
        post_type: &str,
    ) -> Self {
        Self {
            store,
            authorizer,
            hooks,
            urls,
            post_type: post_type.to_string(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    pub fn post_type(&self) -> &str {
        &self.post_type
    }

    fn allowed(&self, operation: Operation, page: Option<&Page>, user: &UserContext) -> bool {
        self.authorizer.authorize(operation, page, user).is_allowed()
    }

    async fn fetch(&self, id: PageId) -> Result<Page, ApiError> {
        let page = self.store.get_page(id).await?.ok_or(ApiError::InvalidId(id))?;
        if page.post_type != self.post_type {
            return Err(ApiError::InvalidType);
        }
        Ok(page)
    }

    pub async fn read_post(
        &self,
        id: PageId,
        context: Context,
        user: &UserContext,
    ) -> Result<Page, ApiError> {
        let page = self.fetch(id).await?;

        if !self.allowed(Operation::Read, Some(&page), user) {
            return Err(ApiError::CannotRead);
        }
        if context == Context::Edit && !self.allowed(Operation::Edit, Some(&page), user) {
            return Err(ApiError::CannotEditContext);
        }

        Ok(page)
    }

    pub async fn edit_post(
        &self,
        id: PageId,
        update: PageUpdate,
        request: &RequestContext,
    ) -> Result<Page, ApiError> {
        let page = self.fetch(id).await?;

        if let Some(since) = request.if_unmodified_since {
            if page.modified.timestamp() > since.timestamp() {
                return Err(ApiError::OldRevision);
            }
        }
        if !self.allowed(Operation::Edit, Some(&page), &request.user) {
            return Err(ApiError::CannotEdit);
        }

        let (mut page, meta) = self.apply_update(page, update, &request.user, false).await?;
        page.modified = Utc::now();
        self.store.update_page(page.clone()).await?;
        self.write_meta(page.id, meta).await?;

        log::debug!("Edited {} {}", self.post_type, page.id);
        Ok(page)
    }

    pub async fn create_post(
        &self,
        update: PageUpdate,
        user: &UserContext,
    ) -> Result<Page, ApiError> {
        if !self.allowed(Operation::Create, None, user) {
            return Err(ApiError::CannotCreate);
        }
        let has_text = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_text(&update.title) && !has_text(&update.content) {
            return Err(ApiError::EmptyPost);
        }

        let mut draft = NewPage::new("", "", user.user_id.unwrap_or_default())
            .with_status(PostStatus::Draft)
            .into_page(0, Utc::now());
        draft.post_type = self.post_type.clone();

        let (draft, meta) = self.apply_update(draft, update, user, true).await?;
        let page = self
            .store
            .insert_page(NewPage {
                post_type: draft.post_type,
                parent: draft.parent,
                menu_order: draft.menu_order,
                slug: draft.slug,
                title: draft.title,
                content: draft.content,
                excerpt: draft.excerpt,
                status: draft.status,
                author: draft.author,
            })
            .await?;
        self.write_meta(page.id, meta).await?;

        log::info!("Created {} {} at '{}'", self.post_type, page.id, page.slug);
        Ok(page)
    }

    pub async fn delete_post(
        &self,
        id: PageId,
        force: bool,
        user: &UserContext,
    ) -> Result<DeleteOutcome, ApiError> {
        let mut page = self.fetch(id).await?;

        if !self.allowed(Operation::Delete, Some(&page), user) {
            return Err(ApiError::CannotDelete);
        }

        if force || page.status == PostStatus::Trash {
            self.adopt_children(&page).await?;
            if !self.store.delete_page(id).await? {
                return Err(ApiError::InvalidId(id));
            }
            log::info!("Permanently deleted {} {}", self.post_type, id);
            return Ok(DeleteOutcome::permanently_deleted());
        }

        page.status = PostStatus::Trash;
        page.modified = Utc::now();
        self.store.update_page(page).await?;
        log::info!("Trashed {} {}", self.post_type, id);
        Ok(DeleteOutcome::trashed())
    }

    pub async fn list_posts(
        &self,
        query: &ListQuery,
        user: &UserContext,
    ) -> Result<Listing, ApiError> {
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let page_number = query.page.unwrap_or(1).max(1);

        // Non-public statuses are only listed for users who may edit others' posts
        let status = match query.status {
            Some(status) if status != PostStatus::Publish => {
                if self.allowed(Operation::EditOthers, None, user) {
                    status
                } else {
                    PostStatus::Publish
                }
            }
            _ => PostStatus::Publish,
        };

        let (pages, total) = self
            .store
            .list_pages(&PageQuery {
                post_type: self.post_type.clone(),
                statuses: vec![status],
                // Past the last representable offset the window is simply empty
                offset: (page_number - 1).saturating_mul(per_page),
                limit: per_page,
            })
            .await?;

        Ok(Listing {
            pages,
            total,
            total_pages: total.div_ceil(per_page),
        })
    }

    /// Common-field projection of a post, passed through the
    /// `prepare_post` hooks.
    pub async fn build_base_representation(
        &self,
        page: &Page,
        context: Context,
    ) -> Result<PostRepresentation, ApiError> {
        let full_path = self.store.full_path_of(page.id).await?;
        let with_body = context.includes_body();
        let with_raw = context == Context::Edit;

        let mut post = PostRepresentation {
            id: page.id,
            title: page.title.clone(),
            status: page.status,
            post_type: page.post_type.clone(),
            author: page.author,
            parent: page.parent,
            link: self.urls.permalink(&full_path),
            slug: page.slug.clone(),
            menu_order: page.menu_order,
            content: with_body.then(|| self.hooks.render_content(&page.content)),
            excerpt: with_body.then(|| self.prepare_excerpt(&page.excerpt)),
            date: with_body.then(|| page.date.to_rfc3339_opts(SecondsFormat::Secs, true)),
            modified: with_body.then(|| page.modified.to_rfc3339_opts(SecondsFormat::Secs, true)),
            date_gmt: with_body.then(|| page.date.format("%Y-%m-%dT%H:%M:%S").to_string()),
            modified_gmt: with_body
                .then(|| page.modified.format("%Y-%m-%dT%H:%M:%S").to_string()),
            title_raw: with_raw.then(|| page.title.clone()),
            content_raw: with_raw.then(|| page.content.clone()),
            excerpt_raw: with_raw.then(|| page.excerpt.clone()),
            links: Links {
                self_link: self.urls.id_url(page.id),
                up: page.parent.map(|parent| self.urls.id_url(parent)),
                collection: self.urls.collection_url(),
                author: self.urls.author_url(page.author),
                replies: self.urls.replies_url(page.id),
                version_history: self.urls.revisions_url(page.id),
            },
            extensions: serde_json::Map::new(),
            last_modified: page.modified,
        };

        self.hooks.apply_prepare_post(&mut post, page, context);
        Ok(post)
    }

    pub fn prepare_excerpt(&self, excerpt: &str) -> Option<String> {
        if excerpt.trim().is_empty() {
            None
        } else {
            Some(excerpt.to_string())
        }
    }

    /// Public meta entries of a post
    pub async fn prepare_meta(&self, id: PageId) -> Result<Vec<MetaEntry>, ApiError> {
        let meta = self.store.list_meta(id).await?;
        Ok(meta.into_iter().filter(|entry| !entry.is_protected()).collect())
    }

    async fn apply_update(
        &self,
        mut page: Page,
        update: PageUpdate,
        user: &UserContext,
        is_new: bool,
    ) -> Result<(Page, Vec<MetaEntry>), ApiError> {
        if let Some(post_type) = &update.post_type {
            if *post_type != page.post_type {
                return Err(ApiError::CannotChangeType);
            }
        }

        if let Some(author) = update.author {
            if author != page.author && !self.allowed(Operation::EditOthers, Some(&page), user) {
                return Err(ApiError::CannotEditOthers);
            }
            page.author = author;
        }

        if let Some(status) = update.status {
            if status == PostStatus::Publish
                && page.status != PostStatus::Publish
                && !self.allowed(Operation::Publish, Some(&page), user)
            {
                return Err(ApiError::CannotPublish);
            }
            page.status = status;
        }

        let meta = update.post_meta.unwrap_or_default();
        if let Some(entry) = meta.iter().find(|entry| entry.is_protected()) {
            return Err(ApiError::ProtectedMetaKey(entry.key.clone()));
        }

        if let Some(title) = update.title {
            page.title = title;
        }
        if let Some(content) = update.content {
            page.content = content;
        }
        if let Some(excerpt) = update.excerpt {
            page.excerpt = excerpt;
        }
        if let Some(menu_order) = update.menu_order {
            page.menu_order = menu_order;
        }

        let parent_changed = match update.parent {
            Some(0) => {
                page.parent = None;
                true
            }
            Some(parent) => {
                if self.store.get_page(parent).await?.is_none() {
                    return Err(ApiError::InvalidParent(parent));
                }
                if !is_new && self.creates_loop(page.id, parent).await? {
                    log::warn!(
                        "Parent {} would create a hierarchy loop for page {}; clearing parent",
                        parent,
                        page.id
                    );
                    page.parent = None;
                } else {
                    page.parent = Some(parent);
                }
                true
            }
            None => false,
        };

        let requested_slug = update.slug.map(|slug| sanitize_slug(&slug));
        let slug_changed = requested_slug.is_some();
        let mut slug = requested_slug.unwrap_or_else(|| page.slug.clone());
        if slug.is_empty() {
            slug = sanitize_slug(&page.title);
        }
        if slug.is_empty() {
            slug = if is_new {
                "page".to_string()
            } else {
                page.id.to_string()
            };
        }

        if is_new || slug_changed || parent_changed || slug != page.slug {
            let exclude = (!is_new).then_some(page.id);
            page.slug = self.unique_slug(&slug, page.parent, exclude).await?;
        }

        Ok((page, meta))
    }

    /// Whether making `parent` the parent of `id` would close a loop
    async fn creates_loop(&self, id: PageId, parent: PageId) -> Result<bool, ApiError> {
        let mut cursor = Some(parent);
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == id {
                return Ok(true);
            }
            steps += 1;
            if steps > MAX_HIERARCHY_DEPTH {
                return Ok(true);
            }
            cursor = self.store.get_page(current).await?.and_then(|page| page.parent);
        }
        Ok(false)
    }

    /// First variant of `slug` (`slug`, `slug-2`, `slug-3`, ...) whose full
    /// path is not already taken by a sibling.
    async fn unique_slug(
        &self,
        slug: &str,
        parent: Option<PageId>,
        exclude: Option<PageId>,
    ) -> Result<String, ApiError> {
        let prefix = match parent {
            Some(parent) => format!("{}/", self.store.full_path_of(parent).await?),
            None => String::new(),
        };

        let mut candidate = slug.to_string();
        let mut suffix = 2;
        loop {
            let path = format!("{}{}", prefix, candidate);
            // An all-digit path would be routed as an id
            let taken = path.bytes().all(|b| b.is_ascii_digit())
                || self
                    .store
                    .find_by_full_path(&self.post_type, &path)
                    .await?
                    .into_iter()
                    .any(|page| Some(page.id) != exclude);
            if !taken {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", slug, suffix);
            suffix += 1;
        }
    }

    /// Move the children of `page` up to its parent, renaming any whose
    /// slug is already taken there.
    async fn adopt_children(&self, page: &Page) -> Result<(), ApiError> {
        let children = self
            .store
            .list_children(&ChildQuery {
                parent: page.id,
                post_type: self.post_type.clone(),
                status: None,
            })
            .await?;

        for mut child in children {
            let slug = self.unique_slug(&child.slug, page.parent, Some(child.id)).await?;
            if slug != child.slug {
                log::info!(
                    "Renaming {} {} from '{}' to '{}' under its new parent",
                    self.post_type,
                    child.id,
                    child.slug,
                    slug
                );
            }
            child.slug = slug;
            child.parent = page.parent;
            self.store.update_page(child).await?;
        }
        Ok(())
    }

    async fn write_meta(&self, id: PageId, meta: Vec<MetaEntry>) -> Result<(), ApiError> {
        for entry in meta {
            self.store.set_meta(id, entry).await?;
        }
        Ok(())
    }
}
