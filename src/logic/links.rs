use crate::config::ApiConfig;
use crate::model::{AuthorId, PageId};

/// Builds the absolute URLs placed in links and headers
#[derive(Debug, Clone, PartialEq)]
pub struct UrlBuilder {
    api_root: String,
    home_url: String,
    base_route: String,
}

impl UrlBuilder {
    pub fn new(api_root: &str, home_url: &str, base_route: &str) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_string(),
            home_url: home_url.trim_end_matches('/').to_string(),
            base_route: format!("/{}", base_route.trim_matches('/')),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.api_root, &config.home_url, &config.base_route)
    }

    pub fn base_route(&self) -> &str {
        &self.base_route
    }

    /// Absolute URL of an API route
    pub fn api_url(&self, route: &str) -> String {
        format!("{}{}", self.api_root, route)
    }

    /// Path-addressed URL of a page
    pub fn path_url(&self, full_path: &str) -> String {
        self.api_url(&format!("{}/{}", self.base_route, full_path))
    }

    /// Id-addressed URL of a page
    pub fn id_url(&self, id: PageId) -> String {
        self.api_url(&format!("{}/{}", self.base_route, id))
    }

    pub fn collection_url(&self) -> String {
        self.api_url(&self.base_route)
    }

    pub fn author_url(&self, author: AuthorId) -> String {
        self.api_url(&format!("/users/{}", author))
    }

    pub fn replies_url(&self, id: PageId) -> String {
        format!("{}/comments", self.id_url(id))
    }

    pub fn revisions_url(&self, id: PageId) -> String {
        format!("{}/revisions", self.id_url(id))
    }

    /// Public HTML permalink of a page
    pub fn permalink(&self, full_path: &str) -> String {
        format!("{}/{}/", self.home_url, full_path)
    }

    /// The path component of a path-addressed URL, if it is one
    pub fn path_of_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.api_root)?
            .strip_prefix(&self.base_route)?
            .strip_prefix('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_normalised_at_construction() {
        let urls = UrlBuilder::new("http://example.com/wp-json/", "http://example.com/", "pages/");
        assert_eq!(urls.base_route(), "/pages");
        assert_eq!(urls.path_url("about/team"), "http://example.com/wp-json/pages/about/team");
        assert_eq!(urls.id_url(7), "http://example.com/wp-json/pages/7");
        assert_eq!(urls.replies_url(7), "http://example.com/wp-json/pages/7/comments");
        assert_eq!(urls.author_url(2), "http://example.com/wp-json/users/2");
        assert_eq!(urls.permalink("about/team"), "http://example.com/about/team/");
    }

    #[test]
    fn test_path_of_url() {
        let urls = UrlBuilder::new("http://api", "http://site", "/pages");
        assert_eq!(urls.path_of_url("http://api/pages/about/team"), Some("about/team"));
        assert_eq!(urls.path_of_url("http://other/pages/about"), None);
    }
}
