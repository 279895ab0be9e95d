use axum::{extract::State, response::Json, Extension};
use serde_json::{json, Value};

use crate::database::models::UserIdentity;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// POST /auth/session - identity upsert hook, called once per successful
/// sign-in at the provider.
///
/// An identity without an email is denied. A storage failure during the
/// upsert is logged and the sign-in still succeeds with the claims-derived
/// identity; the missing user row is a known inconsistency left for an
/// explicit product decision.
pub async fn sign_in(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let email = match actor.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => return Err(ApiError::unauthorized("Unauthorized")),
    };

    let identity = UserIdentity {
        id: actor.id.clone(),
        name: actor.name.clone(),
        email,
        image: actor.image.clone(),
    };

    match state.repository.upsert_user(identity).await {
        Ok(user) => Ok(Json(json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "image": user.image,
            "created_at": user.created_at,
        }))),
        Err(e) => {
            tracing::error!("Failed to upsert user {}: {}", actor.id, e);
            Ok(Json(json!({
                "id": actor.id,
                "name": actor.name,
                "email": actor.email,
                "image": actor.image,
            })))
        }
    }
}
