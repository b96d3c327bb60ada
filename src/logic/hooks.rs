use std::fmt;
use std::sync::Arc;

use crate::model::{Context, Page, PageEnvelope, Prepared};

/// Runs on every base representation and every child summary
pub type PostHook = Arc<dyn Fn(&mut dyn Prepared, &Page, Context) + Send + Sync>;

/// Runs once on the fully assembled page envelope
pub type PageHook = Arc<dyn Fn(&mut PageEnvelope, &Page, Context) + Send + Sync>;

/// Turns raw post content into rendered content
pub type ContentFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Ordered extension points applied while building responses.
///
/// Hooks are registered up front and the registry is then shared read-only;
/// each list runs in registration order.
#[derive(Clone, Default)]
pub struct HookRegistry {
    prepare_post: Vec<PostHook>,
    prepare_page: Vec<PageHook>,
    content_filters: Vec<ContentFilter>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_prepare_post<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn Prepared, &Page, Context) + Send + Sync + 'static,
    {
        self.prepare_post.push(Arc::new(hook));
        self
    }

    pub fn on_prepare_page<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PageEnvelope, &Page, Context) + Send + Sync + 'static,
    {
        self.prepare_page.push(Arc::new(hook));
        self
    }

    pub fn with_content_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.content_filters.push(Arc::new(filter));
        self
    }

    pub fn apply_prepare_post(&self, target: &mut dyn Prepared, page: &Page, context: Context) {
        for hook in &self.prepare_post {
            hook(&mut *target, page, context);
        }
    }

    pub fn apply_prepare_page(&self, envelope: &mut PageEnvelope, page: &Page, context: Context) {
        for hook in &self.prepare_page {
            hook(&mut *envelope, page, context);
        }
    }

    pub fn render_content(&self, raw: &str) -> String {
        self.content_filters
            .iter()
            .fold(raw.to_string(), |content, filter| filter(&content))
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("prepare_post", &self.prepare_post.len())
            .field("prepare_page", &self.prepare_page.len())
            .field("content_filters", &self.content_filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_filters_run_in_order() {
        let hooks = HookRegistry::new()
            .with_content_filter(|raw| raw.trim().to_string())
            .with_content_filter(|raw| format!("<p>{}</p>", raw));
        assert_eq!(hooks.render_content("  hello \n"), "<p>hello</p>");
        assert_eq!(HookRegistry::new().render_content("as is"), "as is");
    }
}
