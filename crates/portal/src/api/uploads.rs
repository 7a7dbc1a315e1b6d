// Thesis upload API routes
// Decision: The upload body is streamed and only counted; the bytes are not kept
// Decision: Reading stops as soon as the file passes the policy maximum. The
// transport body limit (twice the maximum) only backs that up.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thesis_portal_core::{SelectedFile, UploadError, UploadPolicy};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ApiError, ErrorResponse, ListResponse};
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::services::{SubmissionService, SubmitError};

/// Multipart field carrying the document
pub const FILE_FIELD: &str = "file";

/// App state for upload routes
#[derive(Clone)]
pub struct UploadsState {
    pub service: Arc<SubmissionService>,
    pub auth: AuthState,
}

impl UploadsState {
    pub fn new(auth: AuthState, policy: UploadPolicy) -> Self {
        Self {
            service: Arc::new(SubmissionService::new(auth.db.clone(), policy)),
            auth,
        }
    }
}

impl FromRef<UploadsState> for AuthState {
    fn from_ref(input: &UploadsState) -> Self {
        input.auth.clone()
    }
}

/// Recorded thesis upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThesisSubmission {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// Multipart form for thesis uploads (OpenAPI only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ThesisUploadForm {
    /// The thesis document
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Create upload routes
pub fn routes(state: UploadsState) -> Router {
    let body_limit = usize::try_from(state.service.policy().max_bytes.saturating_mul(2))
        .unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/api/uploads/thesis",
            post(upload_thesis).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/uploads", get(list_uploads))
        .with_state(state)
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

/// POST /api/uploads/thesis - Upload a thesis document
#[utoipa::path(
    post,
    path = "/api/uploads/thesis",
    request_body(content = ThesisUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Upload recorded", body = ThesisSubmission),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Missing file, wrong type or too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "uploads"
)]
pub async fn upload_thesis(
    State(state): State<UploadsState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ThesisSubmission>), ApiError> {
    let mut selected = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or("thesis").to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();

        let max = state.service.policy().max_bytes;
        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            size += chunk.len() as u64;
            if size > max {
                let e = UploadError::ExceedsLimit { max };
                tracing::warn!(user_id = %user.id, file = %name, "Rejected upload: {}", e);
                return Err(ApiError::unprocessable(e.to_string()));
            }
        }

        selected = Some(SelectedFile::new(name, mime_type, size));
        break;
    }

    let file =
        selected.ok_or_else(|| ApiError::unprocessable(UploadError::Missing.to_string()))?;

    match state.service.submit(user.id, file).await {
        Ok(submission) => Ok((StatusCode::CREATED, Json(submission))),
        Err(SubmitError::Invalid(e)) => Err(ApiError::unprocessable(e.to_string())),
        Err(SubmitError::Storage(e)) => {
            tracing::error!("Failed to record thesis upload: {}", e);
            Err(ApiError::internal("Failed to record upload"))
        }
    }
}

/// GET /api/uploads - List the current user's uploads, newest first
#[utoipa::path(
    get,
    path = "/api/uploads",
    responses(
        (status = 200, description = "Uploads", body = ListResponse<ThesisSubmission>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "uploads"
)]
pub async fn list_uploads(
    State(state): State<UploadsState>,
    user: AuthUser,
) -> Result<Json<ListResponse<ThesisSubmission>>, ApiError> {
    let submissions = state.service.list(user.id).await.map_err(|e| {
        tracing::error!("Failed to list uploads: {}", e);
        ApiError::internal("Failed to list uploads")
    })?;

    Ok(Json(ListResponse::new(submissions)))
}
