//! Request handlers and the JSON error response.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info};

use super::AppState;
use crate::error::Error;
use crate::report::ReportStatus;
use crate::storage::{BlobId, BlobMetadata};
use crate::submit::{blob_url, UploadReceipt, AUTHOR_ID_HEADER, STATUS_HEADER, THREAD_ID_HEADER};

/// Error returned by handlers, rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::BlobTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {err}");
            return Self::new(status, "internal server error");
        }
        Self::new(status, err.to_string())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Malformed bodies are all reported as 400.
        let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            rejection.status()
        } else {
            StatusCode::BAD_REQUEST
        };
        Self::new(status, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn upload_metadata(headers: &HeaderMap) -> ApiResult<BlobMetadata> {
    let status = match header_value(headers, STATUS_HEADER) {
        Some(raw) => Some(raw.parse::<ReportStatus>().map_err(|_| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("invalid {STATUS_HEADER}: {raw}"),
            )
        })?),
        None => None,
    };
    Ok(BlobMetadata {
        thread_id: header_value(headers, THREAD_ID_HEADER),
        author_id: header_value(headers, AUTHOR_ID_HEADER),
        status,
    })
}

/// POST /api/upload
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<UploadReceipt>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::from(Error::BlobTooLarge {
                limit: state.max_upload_bytes,
            })
        } else {
            ApiError::from(rejection)
        }
    })?;
    let metadata = upload_metadata(&headers)?;
    let size = body.len();
    let id = state.blobs.store(body.to_vec(), metadata)?;
    info!(id = %id, size, "stored upload");

    Ok(Json(UploadReceipt {
        success: true,
        url: blob_url(&state.public_base_url, &id),
        id: id.to_string(),
    }))
}

/// GET /api/blobs/{id}
pub async fn get_blob(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = BlobId::parse(&id)?;
    let blob = state
        .blobs
        .get(&id)?
        .ok_or_else(|| ApiError::not_found(format!("blob {id} not found")))?;

    let mut response = Bytes::copy_from_slice(&blob.bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Some(status) = blob.metadata.status {
        headers.insert(STATUS_HEADER, HeaderValue::from_static(status.as_str()));
    }
    Ok(response)
}

/// DELETE /api/blobs/{id}
pub async fn delete_blob(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = BlobId::parse(&id)?;
    state.blobs.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/ping
pub async fn ping() -> Json<Value> {
    Json(json!({
        "success": true,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/reference-data
pub async fn get_reference_data(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let doc = state.reference.load().await?;
    Ok(Json(Value::Object(doc)))
}

/// POST /api/reference-data
pub async fn replace_reference_data(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(value) = body?;
    let doc = state.reference.replace(value).await?;
    Ok(Json(json!({ "success": true, "data": doc })))
}

/// GET /api/reference-data/{category}
pub async fn get_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .reference
        .category(&category)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!("reference data category '{category}' not found"))
        })
}

/// PUT /api/reference-data/{category}
pub async fn update_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(value) = body?;
    let updated = state.reference.update_category(&category, value).await?;
    Ok(Json(json!({ "success": true, "data": updated })))
}
