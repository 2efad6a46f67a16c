//! Multipart file uploads. Clients upload here first, then pass the
//! returned URL as a chat turn's `attachment_url`.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use makershub_schema::{UploadPurpose, MAX_UPLOAD_BYTES};
use makershub_store::{validate_upload, FileStorage as _, UploadError, UploadFile};

use crate::routes::chat::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    // The body cap sits above the file limit so oversize files reach the
    // validation message instead of a bare 413.
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max((2 * MAX_UPLOAD_BYTES) as usize))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Size and MIME rejections carry the user-facing message; transport
/// failures are server errors.
impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Transport(inner) => inner.into(),
            rejected => ApiError::bad_request(rejected.to_string()),
        }
    }
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut user_id: Option<Uuid> = None;
    let mut purpose = UploadPurpose::ChatAttachment;
    let mut file: Option<UploadFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        match field.name() {
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                user_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| ApiError::bad_request("user_id must be a UUID"))?,
                );
            }
            Some("purpose") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                purpose = match text.trim() {
                    "avatar" => UploadPurpose::Avatar,
                    "chat_attachment" | "" => UploadPurpose::ChatAttachment,
                    other => {
                        return Err(ApiError::bad_request(format!("unknown purpose: {other}")))
                    }
                };
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?
                    .to_vec();
                file = Some(UploadFile {
                    file_name,
                    mime_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let Some(owner) = user_id else {
        return Err(ApiError::bad_request("Please sign in to attach files."));
    };
    let Some(file) = file else {
        return Err(ApiError::bad_request("file is required"));
    };

    validate_upload(&file)?;
    let url = state.storage.upload(owner, file, purpose).await?;
    Ok(Json(UploadResponse { url }))
}
