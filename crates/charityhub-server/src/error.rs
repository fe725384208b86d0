use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use charityhub_stores::StoreError;
use charityhub_types::nav::Role;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Not found")]
    NotFound,

    #[error("Forbidden for role {0:?}")]
    Forbidden(Role),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Country list unavailable: {0}")]
    Countries(#[from] reqwest::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Store(StoreError::UnsupportedFlag { .. } | StoreError::UnknownAttachment { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(StoreError::Backend(_) | StoreError::Attachment { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Countries(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}
