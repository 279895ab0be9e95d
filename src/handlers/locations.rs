use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{
    Location, LocationCondition, LocationSummary, NewLocation,
};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    // Accepted as JSON number or numeric string; coerced during validation.
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

/// Location detail read shape: core fields plus its recent conditions.
#[derive(Debug, Serialize)]
pub struct LocationDetail {
    #[serde(flatten)]
    pub location: Location,
    pub conditions: Vec<LocationCondition>,
}

/// GET /api/locations - every location with per-read aggregates, newest first
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<LocationSummary>>, ApiError> {
    let locations = state.repository.list_locations().await?;
    Ok(Json(locations))
}

/// GET /api/locations/:id - one location and its 20 most recent conditions
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocationDetail>, ApiError> {
    // A malformed id cannot name a location; same absent result as unknown.
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Location not found"))?;

    let location = state
        .repository
        .get_location(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Location not found"))?;

    let conditions = state.repository.conditions_for_location(id).await?;

    Ok(Json(LocationDetail {
        location,
        conditions,
    }))
}

/// POST /api/locations - create a location (authenticated)
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    let input = validate_create_location(payload, &actor.id)?;
    let location = state.repository.create_location(input).await?;

    Ok((StatusCode::CREATED, Json(location)))
}

fn validate_create_location(
    payload: CreateLocationRequest,
    actor_id: &str,
) -> Result<NewLocation, ApiError> {
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    if name.is_empty()
        || description.is_empty()
        || payload.latitude.is_none()
        || payload.longitude.is_none()
    {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let latitude = parse_finite_number(payload.latitude.as_ref().unwrap());
    let longitude = parse_finite_number(payload.longitude.as_ref().unwrap());

    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
        {
            (lat, lon)
        }
        _ => return Err(ApiError::bad_request("Invalid coordinates")),
    };

    Ok(NewLocation {
        name: name.to_string(),
        description: description.to_string(),
        latitude,
        longitude,
        created_by: actor_id.to_string(),
    })
}

/// Coerce a JSON number or numeric string to a finite f64.
pub(crate) fn parse_finite_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(name: &str, description: &str, latitude: Value, longitude: Value) -> CreateLocationRequest {
        CreateLocationRequest {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    #[test]
    fn accepts_boundary_coordinates() {
        let input = validate_create_location(
            request("Eagle Peak", "Summit trail", json!(90), json!(180)),
            "user-1",
        )
        .unwrap();
        assert_eq!(input.latitude, 90.0);
        assert_eq!(input.longitude, 180.0);
        assert_eq!(input.created_by, "user-1");
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = validate_create_location(
            request("Eagle Peak", "Summit trail", json!(91), json!(0)),
            "user-1",
        )
        .unwrap_err();
        assert_eq!(err.message(), "Invalid coordinates");
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        let err = validate_create_location(
            request("Eagle Peak", "Summit trail", json!(0), json!(-181)),
            "user-1",
        )
        .unwrap_err();
        assert_eq!(err.message(), "Invalid coordinates");
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        let err = validate_create_location(
            request("Eagle Peak", "Summit trail", json!("north"), json!(0)),
            "user-1",
        )
        .unwrap_err();
        assert_eq!(err.message(), "Invalid coordinates");
    }

    #[test]
    fn coerces_numeric_strings() {
        let input = validate_create_location(
            request("Eagle Peak", "Summit trail", json!("45.5"), json!("-122.6")),
            "user-1",
        )
        .unwrap();
        assert_eq!(input.latitude, 45.5);
        assert_eq!(input.longitude, -122.6);
    }

    #[test]
    fn rejects_blank_name() {
        let err = validate_create_location(
            request("   ", "Summit trail", json!(0), json!(0)),
            "user-1",
        )
        .unwrap_err();
        assert_eq!(err.message(), "Missing required fields");
    }

    #[test]
    fn trims_name_and_description() {
        let input = validate_create_location(
            request("  Eagle Peak ", " Summit trail ", json!(0), json!(0)),
            "user-1",
        )
        .unwrap();
        assert_eq!(input.name, "Eagle Peak");
        assert_eq!(input.description, "Summit trail");
    }

    #[test]
    fn missing_longitude_is_a_missing_field() {
        let payload = CreateLocationRequest {
            name: Some("Eagle Peak".to_string()),
            description: Some("Summit trail".to_string()),
            latitude: Some(json!(45.0)),
            longitude: None,
        };
        let err = validate_create_location(payload, "user-1").unwrap_err();
        assert_eq!(err.message(), "Missing required fields");
    }

    #[test]
    fn infinity_is_not_a_coordinate() {
        assert_eq!(parse_finite_number(&json!("inf")), None);
        assert_eq!(parse_finite_number(&json!("NaN")), None);
    }
}
