use crate::error::ApiError;
use crate::model::Page;
use crate::store::traits::Store;

/// Maps a hierarchical path such as `about/team` to the page it names.
///
/// The path is compared verbatim and case-sensitively against each page's
/// derived full path; decoding and normalisation belong to the caller. Every
/// call queries the store, nothing is cached.
pub struct PathResolver;

impl PathResolver {
    pub async fn resolve<S: Store>(store: &S, post_type: &str, path: &str) -> Result<Page, ApiError> {
        let mut matches = store.find_by_full_path(post_type, path).await?;

        if matches.len() > 1 {
            log::warn!(
                "{} {}s share the path '{}'; using the lowest id",
                matches.len(),
                post_type,
                path
            );
        }

        if matches.is_empty() {
            log::debug!("No {} found at path '{}'", post_type, path);
            return Err(ApiError::PathNotFound {
                path: path.to_string(),
            });
        }

        let page = matches.swap_remove(0);
        log::debug!("Resolved path '{}' to {} {}", path, post_type, page.id);
        Ok(page)
    }
}
