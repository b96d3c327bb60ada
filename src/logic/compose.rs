use serde_json::Map;

use crate::error::ApiError;
use crate::logic::posts::PostOperations;
use crate::model::{
    ChildQuery, ChildSummary, Children, Context, Page, PageEnvelope, PostStatus,
};
use crate::store::traits::Store;

/// Assembles the full response for a page: the generic representation with
/// path-based `self`/`up` links and one level of ordered child summaries.
pub struct PageComposer;

impl PageComposer {
    pub async fn compose<S: Store>(
        posts: &PostOperations<S>,
        page: &Page,
        context: Context,
    ) -> Result<PageEnvelope, ApiError> {
        let store = posts.store();
        let urls = posts.urls();

        let mut post = posts.build_base_representation(page, context).await?;

        let full_path = store.full_path_of(page.id).await?;
        post.links.self_link = urls.path_url(&full_path);

        let children = Self::children(posts, page, &full_path).await?;

        // A parent reference to a page that no longer exists gets no link,
        // the same way it ends the derived path.
        post.links.up = None;
        if let Some(parent) = page.parent {
            if store.get_page(parent).await?.is_some() {
                post.links.up = Some(urls.path_url(&store.full_path_of(parent).await?));
            }
        }

        let mut envelope = PageEnvelope { post, children };
        posts.hooks().apply_prepare_page(&mut envelope, page, context);
        Ok(envelope)
    }

    async fn children<S: Store>(
        posts: &PostOperations<S>,
        page: &Page,
        full_path: &str,
    ) -> Result<Children, ApiError> {
        let query = ChildQuery {
            parent: page.id,
            post_type: page.post_type.clone(),
            status: Some(PostStatus::Publish),
        };
        let children = posts.store().list_children(&query).await?;

        let mut summaries = Vec::with_capacity(children.len());
        for child in &children {
            let mut summary = ChildSummary {
                id: child.id,
                title: child.title.clone(),
                status: child.status,
                post_type: child.post_type.clone(),
                author: child.author,
                content: posts.hooks().render_content(&child.content),
                link: posts
                    .urls()
                    .permalink(&format!("{}/{}", full_path, child.slug)),
                slug: child.slug.clone(),
                excerpt: posts.prepare_excerpt(&child.excerpt),
                post_meta: posts.prepare_meta(child.id).await?,
                extensions: Map::new(),
            };
            posts
                .hooks()
                .apply_prepare_post(&mut summary, child, Context::View);
            summaries.push(summary);
        }

        Ok(Children::from_summaries(summaries))
    }
}
