//! `/api` handlers: fetch a shared notebook by id, or share a new one.

use crate::error::RelayError;
use crate::services::{record_gist_operation, GistError};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// First `id` value in the query string, if any. Repeated and unrelated fields
/// are ignored.
fn first_id(query: Result<Query<Vec<(String, String)>>, QueryRejection>) -> Option<String> {
    let Query(pairs) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unparseable query string");
            return None;
        }
    };

    pairs
        .into_iter()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value)
}

/// `GET /api?id=<id>`: relay the raw content of a shared gist.
pub async fn fetch_gist(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, RelayError> {
    let id = match first_id(query) {
        Some(id) if !id.is_empty() => id,
        _ => {
            tracing::debug!("Rejected gist fetch without id");
            return Err(RelayError::MissingId);
        }
    };

    match state.gists.fetch_raw(&id).await {
        Ok(raw) => {
            record_gist_operation("fetch", "ok");
            tracing::info!(gist_id = %id, size = raw.content.len(), "Gist fetched");

            let mut response = (StatusCode::OK, raw.content).into_response();
            if let Some(value) = raw
                .content_type
                .as_deref()
                .and_then(|ct| HeaderValue::from_str(ct).ok())
            {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            Ok(response)
        }
        Err(source) => {
            // Unknown ids and unreachable upstream answer alike; only the log tells them apart.
            match &source {
                GistError::NotFound { status } => {
                    record_gist_operation("fetch", "not_found");
                    tracing::info!(gist_id = %id, upstream_status = status, "Gist not found upstream");
                }
                GistError::InvalidId(_) => {
                    record_gist_operation("fetch", "not_found");
                    tracing::info!(gist_id = %id, "Rejected gist id that is not a path segment");
                }
                other => {
                    record_gist_operation("fetch", "upstream_error");
                    tracing::warn!(gist_id = %id, error = %other, "Gist fetch failed");
                }
            }
            Err(RelayError::FetchFailed { id, source })
        }
    }
}

/// `POST /api`: share the request body as a new private gist.
pub async fn create_gist(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    let body = match body {
        Ok(body) if !body.is_empty() => body,
        Ok(_) => {
            tracing::debug!("Rejected gist creation with empty body");
            return Err(RelayError::MissingBody);
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected gist creation with unreadable body");
            return Err(RelayError::MissingBody);
        }
    };

    let gist = state.gists.create(&body).await.map_err(|e| {
        record_gist_operation("create", "upstream_error");
        tracing::error!(error = %e, size = body.len(), "Failed to create a gist");
        RelayError::CreateFailed(e)
    })?;

    let json = serde_json::to_vec(&gist).map_err(|e| {
        record_gist_operation("create", "serialization_error");
        tracing::error!(error = %e, "Failed to serialize created gist");
        RelayError::Serialization(e)
    })?;

    record_gist_operation("create", "ok");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json,
    )
        .into_response())
}
