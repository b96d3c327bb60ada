use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::model::{AuthorId, MetaEntry, PageId, PostStatus};

/// Navigation links of a post representation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up: Option<String>,
    pub collection: String,
    pub author: String,
    pub replies: String,
    #[serde(rename = "version-history")]
    pub version_history: String,
}

impl Links {
    /// Link relations in the order they are advertised in `Link` headers
    pub fn relations(&self) -> Vec<(&'static str, &str)> {
        let mut relations = vec![("self", self.self_link.as_str())];
        if let Some(up) = &self.up {
            relations.push(("up", up.as_str()));
        }
        relations.push(("collection", self.collection.as_str()));
        relations.push(("author", self.author.as_str()));
        relations.push(("replies", self.replies.as_str()));
        relations.push(("version-history", self.version_history.as_str()));
        relations
    }
}

/// Common-field projection built by the generic post layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRepresentation {
    #[serde(rename = "ID")]
    pub id: PageId,
    pub title: String,
    pub status: PostStatus,
    #[serde(rename = "type")]
    pub post_type: String,
    pub author: AuthorId,
    pub parent: Option<PageId>,
    pub link: String,
    pub slug: String,
    pub menu_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_gmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_gmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt_raw: Option<String>,
    pub links: Links,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
    /// Drives the `Last-Modified` response header
    #[serde(skip)]
    pub last_modified: DateTime<Utc>,
}

/// One-level-deep projection of a child page embedded in its parent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildSummary {
    #[serde(rename = "ID")]
    pub id: PageId,
    pub title: String,
    pub status: PostStatus,
    #[serde(rename = "type")]
    pub post_type: String,
    pub author: AuthorId,
    pub content: String,
    pub link: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub post_meta: Vec<MetaEntry>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Direct children of a page.
///
/// `None` serializes as `false` so clients can tell "no children" apart from
/// an empty or missing list.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    None,
    Pages(Vec<ChildSummary>),
}

impl Children {
    pub fn from_summaries(summaries: Vec<ChildSummary>) -> Self {
        if summaries.is_empty() {
            Children::None
        } else {
            Children::Pages(summaries)
        }
    }

    pub fn summaries(&self) -> &[ChildSummary] {
        match self {
            Children::None => &[],
            Children::Pages(pages) => pages,
        }
    }
}

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Children::None => serializer.serialize_bool(false),
            Children::Pages(pages) => pages.serialize(serializer),
        }
    }
}

/// Full response for a single page: base representation, links and children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageEnvelope {
    #[serde(flatten)]
    pub post: PostRepresentation,
    pub children: Children,
}

/// Shared surface of the representations that `prepare_post` hooks see
pub trait Prepared {
    fn extensions_mut(&mut self) -> &mut Map<String, Value>;
}

impl Prepared for PostRepresentation {
    fn extensions_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extensions
    }
}

impl Prepared for ChildSummary {
    fn extensions_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: PageId) -> ChildSummary {
        ChildSummary {
            id,
            title: "Child".to_string(),
            status: PostStatus::Publish,
            post_type: "page".to_string(),
            author: 1,
            content: String::new(),
            link: "http://example.com/child/".to_string(),
            slug: "child".to_string(),
            excerpt: None,
            post_meta: Vec::new(),
            extensions: Map::new(),
        }
    }

    #[test]
    fn test_children_absence_marker_serializes_false() {
        let value = serde_json::to_value(Children::from_summaries(Vec::new())).unwrap();
        assert_eq!(value, Value::Bool(false));

        let value = serde_json::to_value(Children::from_summaries(vec![summary(4)])).unwrap();
        assert_eq!(value[0]["ID"], 4);
        assert_eq!(value[0]["type"], "page");
    }

    #[test]
    fn test_links_omit_up_for_roots() {
        let links = Links {
            self_link: "http://api/pages/about".to_string(),
            ..Links::default()
        };
        let value = serde_json::to_value(&links).unwrap();
        assert!(value.get("up").is_none());
        assert_eq!(value["self"], "http://api/pages/about");
        assert!(value.get("version-history").is_some());
    }

    #[test]
    fn test_extensions_are_flattened() {
        let mut child = summary(9);
        child
            .extensions_mut()
            .insert("featured".to_string(), Value::Bool(true));
        let value = serde_json::to_value(&child).unwrap();
        assert_eq!(value["featured"], true);
    }
}
