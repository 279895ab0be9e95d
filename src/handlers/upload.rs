use axum::{
    extract::{Multipart, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::storage::StorageError;

const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// POST /api/upload - forward a photo to the storage provider (authenticated)
///
/// Format and size are enforced here; the provider only ever sees an accepted
/// buffer. The returned URL is what clients pass back as `photo_url`.
pub async fn upload(
    State(state): State<AppState>,
    Extension(_actor): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut file: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_allowed_type(&content_type) {
            return Err(ApiError::bad_request(
                "Invalid file type. Only JPEG, PNG, WebP, and GIF are allowed.",
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;

        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::bad_request("File too large. Maximum size is 10MB."));
        }

        file = Some(bytes.to_vec());
        break;
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let url = state
        .photos
        .upload(file, &state.config.storage.folder)
        .await
        .map_err(|e| match e {
            StorageError::NotConfigured => {
                ApiError::service_unavailable("Photo storage is not configured")
            }
            StorageError::UploadFailed(msg) => {
                tracing::error!("Photo upload failed: {}", msg);
                ApiError::internal_server_error("Failed to upload image")
            }
        })?;

    Ok(Json(json!({ "url": url })))
}

fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains(&content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_image_types() {
        assert!(is_allowed_type("image/jpeg"));
        assert!(is_allowed_type("image/png"));
        assert!(is_allowed_type("image/webp"));
        assert!(is_allowed_type("image/gif"));
        assert!(!is_allowed_type("image/svg+xml"));
        assert!(!is_allowed_type("application/pdf"));
        assert!(!is_allowed_type(""));
    }
}
