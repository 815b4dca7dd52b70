use crate::services::GistError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;
use thiserror::Error;

/// Failures surfaced by the `/api` handlers.
///
/// Client-side failures answer with a short plain-text message. Upstream and
/// encoding failures are contained to the request and rendered through
/// [`AppError`] as 5xx JSON bodies.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing `id` query field")]
    MissingId,

    #[error("Missing body of POST request")]
    MissingBody,

    #[error("Failed to fetch gist with ID {id}")]
    FetchFailed {
        id: String,
        #[source]
        source: GistError,
    },

    #[error("Failed to create a gist: {0}")]
    CreateFailed(#[source] GistError),

    #[error("Failed to marshal result to json: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingId | RelayError::MissingBody => StatusCode::BAD_REQUEST,
            RelayError::FetchFailed { .. } => StatusCode::NOT_FOUND,
            RelayError::CreateFailed(_) => StatusCode::BAD_GATEWAY,
            RelayError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        match self {
            RelayError::MissingId | RelayError::MissingBody | RelayError::FetchFailed { .. } => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response(),
            RelayError::CreateFailed(_) => AppError::BadGateway(message).into_response(),
            RelayError::Serialization(err) => AppError::InternalError(
                anyhow::Error::new(err).context("Failed to marshal result to json"),
            )
            .into_response(),
        }
    }
}
