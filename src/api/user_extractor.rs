use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::error::ApiError;
use crate::model::{parse_http_date, AuthorId, RequestContext, Role, UserContext};

/// Axum extractor for UserContext from request headers
///
/// This extractor looks for user information in request headers:
/// - X-User-Id: numeric user identifier
/// - X-User-Role: administrator, editor, author, contributor or subscriber
///
/// Requests without either header are anonymous. A user id without a role is
/// treated as a subscriber.
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers)
    }
}

/// Identity plus the conditional-write headers of the request
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = user_from_headers(&parts.headers)?;
        let mut request = RequestContext::new(user);

        if let Some(value) = extract_header_value(&parts.headers, header::IF_UNMODIFIED_SINCE.as_str()) {
            match parse_http_date(&value) {
                Some(since) => request = request.with_if_unmodified_since(since),
                None => log::debug!("Ignoring unparseable If-Unmodified-Since '{}'", value),
            }
        }

        Ok(request)
    }
}

fn user_from_headers(headers: &HeaderMap) -> Result<UserContext, ApiError> {
    let user_id = extract_header_value(headers, "x-user-id")
        .map(|value| value.trim().parse::<AuthorId>())
        .transpose()
        .map_err(|_| ApiError::InvalidHeader("X-User-Id"))?;
    let role = extract_header_value(headers, "x-user-role")
        .map(|value| Role::parse(&value).ok_or(ApiError::InvalidHeader("X-User-Role")))
        .transpose()?;

    Ok(match (user_id, role) {
        (None, None) => UserContext::anonymous(),
        (Some(user_id), role) => UserContext::new(user_id, role.unwrap_or(Role::Subscriber)),
        (None, Some(role)) => UserContext {
            user_id: None,
            role,
        },
    })
}

/// Extract header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
}
