use axum::{extract::State, http::StatusCode, response::Json, Extension};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Condition, NewCondition, UserCondition};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConditionRequest {
    pub location_id: Option<String>,
    pub condition_date: Option<String>,
    // Accepted as JSON integer or numeric string; coerced during validation.
    pub rating: Option<Value>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

/// POST /api/conditions - report a condition against a location (authenticated)
///
/// The location's existence is not checked here; the foreign-key constraint is
/// the backstop and its violation surfaces as a 404.
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<CreateConditionRequest>,
) -> Result<(StatusCode, Json<Condition>), ApiError> {
    let input = validate_create_condition(payload, &actor.id, Utc::now().date_naive())?;
    let condition = state.repository.create_condition(input).await?;

    Ok((StatusCode::CREATED, Json(condition)))
}

/// GET /api/users/me/conditions - the actor's own reports with location names
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<Vec<UserCondition>>, ApiError> {
    let conditions = state.repository.conditions_for_user(&actor.id).await?;
    Ok(Json(conditions))
}

fn validate_create_condition(
    payload: CreateConditionRequest,
    actor_id: &str,
    today: NaiveDate,
) -> Result<NewCondition, ApiError> {
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    if payload.location_id.as_deref().unwrap_or_default().is_empty()
        || payload.condition_date.as_deref().unwrap_or_default().is_empty()
        || payload.rating.is_none()
        || description.is_empty()
    {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let rating = parse_rating(payload.rating.as_ref().unwrap())
        .ok_or_else(|| ApiError::bad_request("Rating must be between 1 and 5"))?;

    let location_id = Uuid::parse_str(payload.location_id.as_deref().unwrap())
        .map_err(|_| ApiError::bad_request("Invalid location id"))?;

    let condition_date =
        NaiveDate::parse_from_str(payload.condition_date.as_deref().unwrap(), "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request("Invalid condition date"))?;

    if condition_date > today {
        return Err(ApiError::bad_request("Condition date cannot be in the future"));
    }

    Ok(NewCondition {
        location_id,
        user_id: actor_id.to_string(),
        condition_date,
        rating,
        description: description.to_string(),
        photo_url: payload.photo_url.filter(|url| !url.is_empty()),
    })
}

/// Coerce a JSON integer or numeric string to a rating in [1, 5].
fn parse_rating(value: &Value) -> Option<i32> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .filter(|r| (1..=5).contains(r))
        .map(|r| r as i32)
}
