use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{
    Condition, Location, LocationCondition, LocationSummary, NewCondition, NewLocation, User,
    UserCondition, UserIdentity,
};
use crate::database::DatabaseError;

/// Most-recent-by-date cap on a location's condition listing. A hard cap, not
/// a page size; there is no fetch-more path.
const LOCATION_CONDITIONS_LIMIT: i64 = 20;

/// Data access layer. Holds the shared pool; every query decodes into a typed
/// row struct, so a shape mismatch fails loudly instead of producing a
/// silently wrong record.
#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Every location, newest first, each annotated with its condition count
    /// and mean rating. The aggregation runs per call; nothing is cached.
    pub async fn list_locations(&self) -> Result<Vec<LocationSummary>, DatabaseError> {
        let rows = sqlx::query_as::<_, LocationSummary>(
            r#"
            SELECT
                l.id,
                l.name,
                l.description,
                l.latitude,
                l.longitude,
                l.created_by,
                l.created_at,
                COUNT(c.id) AS condition_count,
                AVG(c.rating)::float8 AS average_rating
            FROM locations l
            LEFT JOIN conditions c ON c.location_id = l.id
            GROUP BY l.id
            ORDER BY l.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Core location fields only; `None` for an unknown id.
    pub async fn get_location(&self, id: Uuid) -> Result<Option<Location>, DatabaseError> {
        let row = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, description, latitude, longitude, created_by, created_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// A location's 20 most recent conditions by report date, with reporter
    /// attribution left-joined from users.
    pub async fn conditions_for_location(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<LocationCondition>, DatabaseError> {
        let rows = sqlx::query_as::<_, LocationCondition>(
            r#"
            SELECT
                c.id,
                c.location_id,
                c.user_id,
                c.condition_date,
                c.rating,
                c.description,
                c.photo_url,
                c.created_at,
                u.name AS user_name,
                u.image AS user_image
            FROM conditions c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.location_id = $1
            ORDER BY c.condition_date DESC
            LIMIT $2
            "#,
        )
        .bind(location_id)
        .bind(LOCATION_CONDITIONS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Everything a user has reported, newest first, with location names.
    /// Inner join: conditions whose location is gone are excluded.
    pub async fn conditions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserCondition>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserCondition>(
            r#"
            SELECT
                c.id,
                c.location_id,
                c.user_id,
                c.condition_date,
                c.rating,
                c.description,
                c.photo_url,
                c.created_at,
                l.name AS location_name
            FROM conditions c
            JOIN locations l ON l.id = c.location_id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert a location. The geometry point is derived from the coordinate
    /// pair inside the same statement, so it can never diverge from the
    /// stored latitude/longitude.
    pub async fn create_location(&self, input: NewLocation) -> Result<Location, DatabaseError> {
        let row = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, description, latitude, longitude, geom, created_by)
            VALUES ($1, $2, $3, $4, ST_SetSRID(ST_MakePoint($4, $3), 4326), $5)
            RETURNING id, name, description, latitude, longitude, created_by, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Insert a condition. There is no pre-insert existence check on the
    /// location; a foreign-key violation is mapped to a domain not-found.
    pub async fn create_condition(&self, input: NewCondition) -> Result<Condition, DatabaseError> {
        let result = sqlx::query_as::<_, Condition>(
            r#"
            INSERT INTO conditions (location_id, user_id, condition_date, rating, description, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, location_id, user_id, condition_date, rating, description, photo_url, created_at
            "#,
        )
        .bind(input.location_id)
        .bind(&input.user_id)
        .bind(input.condition_date)
        .bind(input.rating)
        .bind(&input.description)
        .bind(&input.photo_url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) if is_location_fk_violation(&e) => {
                Err(DatabaseError::NotFound("Location not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert-or-update keyed on the provider subject id. On conflict the
    /// incoming name, email, and image win unconditionally.
    pub async fn upsert_user(&self, input: UserIdentity) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
                SET name  = EXCLUDED.name,
                    email = EXCLUDED.email,
                    image = EXCLUDED.image
            RETURNING id, name, email, image, created_at
            "#,
        )
        .bind(&input.id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

/// SQLSTATE 23503 on the location_id constraint. A user_id violation is not
/// a not-found; it propagates as a persistence failure.
fn is_location_fk_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23503")
                && db_err
                    .constraint()
                    .is_some_and(|c| c.contains("location_id"))
        }
        _ => false,
    }
}
