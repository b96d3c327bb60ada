use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::model::PageId;

/// Every failure a page operation can surface to a client.
///
/// Each variant carries a stable machine-readable code and an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid post ID.")]
    PathNotFound { path: String },

    #[error("Invalid post ID.")]
    InvalidId(PageId),

    #[error("Invalid post type")]
    InvalidType,

    #[error("Sorry, you cannot read this post.")]
    CannotRead,

    #[error("Sorry, you are not allowed to edit this post.")]
    CannotEdit,

    #[error("Sorry, you cannot edit this post")]
    CannotEditContext,

    #[error("Sorry, you are not allowed to edit posts as this user.")]
    CannotEditOthers,

    #[error("Sorry, you are not allowed to publish posts in this post type")]
    CannotPublish,

    #[error("Sorry, you are not allowed to create pages.")]
    CannotCreate,

    #[error("Sorry, you are not allowed to delete this post.")]
    CannotDelete,

    #[error("There is a revision of this post that is more recent.")]
    OldRevision,

    #[error("The post type may not be changed.")]
    CannotChangeType,

    #[error("Invalid post parent ID.")]
    InvalidParent(PageId),

    #[error("The post is empty.")]
    EmptyPost,

    #[error("Meta key '{0}' is protected.")]
    ProtectedMetaKey(String),

    #[error("Invalid {0} header.")]
    InvalidHeader(&'static str),

    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },

    #[error("Internal storage error.")]
    Storage(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::PathNotFound { .. } | ApiError::InvalidId(_) | ApiError::InvalidParent(_) => {
                "json_post_invalid_id"
            }
            ApiError::InvalidType => "json_post_invalid_type",
            ApiError::CannotRead => "json_user_cannot_read",
            ApiError::CannotEdit | ApiError::CannotEditContext => "json_cannot_edit",
            ApiError::CannotEditOthers => "json_cannot_edit_others",
            ApiError::CannotPublish => "json_cannot_publish",
            ApiError::CannotCreate => "json_cannot_create",
            ApiError::CannotDelete => "json_user_cannot_delete_post",
            ApiError::OldRevision => "json_old_revision",
            ApiError::CannotChangeType => "json_cannot_change_post_type",
            ApiError::EmptyPost => "json_post_empty",
            ApiError::ProtectedMetaKey(_) => "json_meta_protected_key",
            ApiError::InvalidHeader(_) => "json_invalid_header",
            ApiError::InvalidRequest { .. } => "json_invalid_request",
            ApiError::Storage(_) => "json_storage_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PathNotFound { .. } | ApiError::InvalidId(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidType
            | ApiError::CannotChangeType
            | ApiError::InvalidParent(_)
            | ApiError::EmptyPost
            | ApiError::InvalidHeader(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest { status, .. } => *status,
            ApiError::CannotRead
            | ApiError::CannotEdit
            | ApiError::CannotEditOthers
            | ApiError::CannotDelete => StatusCode::UNAUTHORIZED,
            ApiError::CannotEditContext
            | ApiError::CannotPublish
            | ApiError::CannotCreate
            | ApiError::ProtectedMetaKey(_) => StatusCode::FORBIDDEN,
            ApiError::OldRevision => StatusCode::PRECONDITION_FAILED,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub status: u16,
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub data: ErrorData,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            data: ErrorData {
                status: err.status().as_u16(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(err) = &self {
            log::error!("Storage failure: {:#}", err);
        }
        (self.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}
