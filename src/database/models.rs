use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Mirror of the external auth provider's identity. `id` is the provider's
/// stable subject identifier, never generated here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Location row annotated with per-read aggregates. `average_rating` is the
/// arithmetic mean of all ratings for the location, null when it has no
/// conditions; it is recomputed on every list read, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub condition_count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Condition {
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: String,
    pub condition_date: NaiveDate,
    pub rating: i32,
    pub description: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Condition with reporter attribution, as read for a location's detail page.
/// The user join is a left join; attribution is null if the user row is gone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationCondition {
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: String,
    pub condition_date: NaiveDate,
    pub rating: i32,
    pub description: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
}

/// Condition with its location's name, as read for a user's profile. Inner
/// join; a condition whose location is gone is excluded.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserCondition {
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: String,
    pub condition_date: NaiveDate,
    pub rating: i32,
    pub description: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub location_name: String,
}

/// Pre-validated input for `Repository::create_location`.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_by: String,
}

/// Pre-validated input for `Repository::create_condition`.
#[derive(Debug, Clone)]
pub struct NewCondition {
    pub location_id: Uuid,
    pub user_id: String,
    pub condition_date: NaiveDate,
    pub rating: i32,
    pub description: String,
    pub photo_url: Option<String>,
}

/// Identity payload from the auth provider, upserted on every sign-in.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}
