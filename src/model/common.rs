use serde::{Deserialize, Serialize};

pub type PageId = i64;
pub type AuthorId = i64;

/// Post type served by the page routes
pub const PAGE_TYPE: &str = "page";

/// Representation detail level requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    #[default]
    View,
    Edit,
    Embed,
}

impl Context {
    /// Whether body fields (content, excerpt, dates) are included
    pub fn includes_body(&self) -> bool {
        matches!(self, Context::View | Context::Edit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    Trash,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
            PostStatus::Private => "private",
            PostStatus::Future => "future",
            PostStatus::Trash => "trash",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "publish" => Some(PostStatus::Publish),
            "draft" => Some(PostStatus::Draft),
            "pending" => Some(PostStatus::Pending),
            "private" => Some(PostStatus::Private),
            "future" => Some(PostStatus::Future),
            "trash" => Some(PostStatus::Trash),
            _ => None,
        }
    }
}

/// Sanitize a title or user supplied slug into a URL-safe slug.
///
/// Lowercases, turns whitespace into dashes, keeps only `[a-z0-9_-]` and
/// collapses repeated dashes.
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() || ch == '_' {
            slug.push(ch);
        } else if (ch == '-' || ch.is_whitespace()) && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_slug() {
        assert_eq!(sanitize_slug("About Us"), "about-us");
        assert_eq!(sanitize_slug("  Team -- Leads!  "), "team-leads");
        assert_eq!(sanitize_slug("snake_case"), "snake_case");
        assert_eq!(sanitize_slug("???"), "");
    }

    #[test]
    fn test_context_deserializes_lowercase() {
        let ctx: Context = serde_json::from_str("\"edit\"").unwrap();
        assert_eq!(ctx, Context::Edit);
        assert!(serde_json::from_str::<Context>("\"bogus\"").is_err());
        assert!(!Context::Embed.includes_body());
    }

    #[test]
    fn test_post_status_roundtrip_names() {
        for status in [
            PostStatus::Publish,
            PostStatus::Draft,
            PostStatus::Pending,
            PostStatus::Private,
            PostStatus::Future,
            PostStatus::Trash,
        ] {
            assert_eq!(PostStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::parse("published"), None);
    }
}
