use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::logic::{ComposedPage, DeleteOutcome, ListQuery, PageOperations};
use crate::model::{format_http_date, Context, PageEnvelope, PageId, PageUpdate, RequestContext, UserContext};
use crate::store::traits::Store;

pub type AppState<S> = Arc<PageOperations<S>>;

const TOTAL_HEADER: HeaderName = HeaderName::from_static("x-wp-total");
const TOTAL_PAGES_HEADER: HeaderName = HeaderName::from_static("x-wp-totalpages");

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ContextQuery {
    #[serde(default)]
    pub context: Context,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub force: bool,
}

/// How the wildcard segment of a page route addresses a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAddress<'a> {
    Id(PageId),
    Path(&'a str),
}

impl<'a> PageAddress<'a> {
    /// A capture made only of digits is an id, anything else is a full path
    pub fn parse(capture: &'a str) -> Self {
        if !capture.is_empty() && capture.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = capture.parse() {
                return PageAddress::Id(id);
            }
        }
        PageAddress::Path(capture)
    }
}

/// Read response with `Last-Modified` and one `Link` header per relation
fn page_response(status: StatusCode, envelope: PageEnvelope) -> Response {
    let mut headers = HeaderMap::new();
    let post = &envelope.post;

    match HeaderValue::from_str(&format_http_date(&post.last_modified)) {
        Ok(value) => {
            headers.insert(header::LAST_MODIFIED, value);
        }
        Err(e) => log::warn!("Skipping Last-Modified for page {}: {}", post.id, e),
    }

    let mut links: Vec<String> = post
        .links
        .relations()
        .into_iter()
        .map(|(rel, url)| format!("<{}>; rel=\"{}\"", url, rel))
        .collect();
    links.push(format!("<{}>; rel=\"alternate\"; type=text/html", post.link));

    for link in links {
        match HeaderValue::from_str(&link) {
            Ok(value) => {
                headers.append(header::LINK, value);
            }
            Err(e) => log::warn!("Skipping Link header '{}': {}", link, e),
        }
    }

    (status, headers, Json(envelope)).into_response()
}

fn composed_response(status: StatusCode, composed: ComposedPage) -> Response {
    page_response(status, composed.envelope)
}

pub async fn list_pages<S: Store + 'static>(
    State(pages): State<AppState<S>>,
    user: UserContext,
    query: Result<Query<ListQuery>, QueryRejection>,
    context: Result<Query<ContextQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let Query(ContextQuery { context }) = context?;
    let listing = pages.list_pages(&query, context, &user).await?;

    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_HEADER, HeaderValue::from(listing.total));
    headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from(listing.total_pages));

    Ok((headers, Json(listing.items)).into_response())
}

pub async fn create_page<S: Store + 'static>(
    State(pages): State<AppState<S>>,
    user: UserContext,
    payload: Result<Json<PageUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(update) = payload?;
    let composed = pages.create_page(update, &user).await?;

    let location = pages.posts().urls().id_url(composed.page.id);
    let mut response = composed_response(StatusCode::CREATED, composed);
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => log::warn!("Skipping Location header '{}': {}", location, e),
    }
    Ok(response)
}

pub async fn get_page<S: Store + 'static>(
    State(pages): State<AppState<S>>,
    Path(target): Path<String>,
    user: UserContext,
    query: Result<Query<ContextQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(ContextQuery { context }) = query?;
    let composed = match PageAddress::parse(&target) {
        PageAddress::Id(id) => pages.get_page(id, context, &user).await?,
        PageAddress::Path(path) => pages.get_page_by_path(path, context, &user).await?,
    };
    Ok(composed_response(StatusCode::OK, composed))
}

pub async fn edit_page<S: Store + 'static>(
    State(pages): State<AppState<S>>,
    Path(target): Path<String>,
    request: RequestContext,
    payload: Result<Json<PageUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(update) = payload?;
    let composed = match PageAddress::parse(&target) {
        PageAddress::Id(id) => pages.edit_page(id, update, &request).await?,
        PageAddress::Path(path) => pages.edit_page_by_path(path, update, &request).await?,
    };
    Ok(composed_response(StatusCode::OK, composed))
}

pub async fn delete_page<S: Store + 'static>(
    State(pages): State<AppState<S>>,
    Path(target): Path<String>,
    user: UserContext,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let Query(DeleteQuery { force }) = query?;
    let outcome = match PageAddress::parse(&target) {
        PageAddress::Id(id) => pages.delete_page(id, force, &user).await?,
        PageAddress::Path(path) => pages.delete_page_by_path(path, force, &user).await?,
    };
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_address_parse() {
        assert_eq!(PageAddress::parse("42"), PageAddress::Id(42));
        assert_eq!(PageAddress::parse("about/team"), PageAddress::Path("about/team"));
        assert_eq!(PageAddress::parse("2024"), PageAddress::Id(2024));
        assert_eq!(PageAddress::parse("2024-plans"), PageAddress::Path("2024-plans"));
        assert_eq!(PageAddress::parse(""), PageAddress::Path(""));
        // Too large for an id, so it can only be a slug
        assert_eq!(
            PageAddress::parse("99999999999999999999"),
            PageAddress::Path("99999999999999999999")
        );
    }
}
