use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::validation::{validate_new_job, NewJob};
use crate::models::address::{sanitize_address, Address};
use crate::models::job::{JobDuration, JobRow};
use crate::recommendation::candidates::JobCandidate;
use crate::recommendation::geo::GeoPoint;
use crate::routes::UserIdQuery;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub coordinates: GeoPoint,
    pub address: Address,
    pub duration: JobDuration,
    pub hour_rate: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub max_workers: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    /// Meters.
    pub max_distance: f64,
    /// Comma-separated category filter.
    pub category: Option<String>,
}

impl NearbyQuery {
    fn categories(&self) -> Vec<String> {
        self.category
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    validate_new_job(
        &NewJob {
            title: &req.title,
            category: &req.category,
            hour_rate: req.hour_rate,
            duration: &req.duration,
            images: &req.images,
            max_workers: req.max_workers,
        },
        &state.config.job_categories,
    )?;

    let owner_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(req.user_id)
        .fetch_one(&state.db)
        .await?;
    if !owner_exists {
        return Err(AppError::NotFound(format!("User {} not found", req.user_id)));
    }

    let address = sanitize_address(req.address, &state.config.address_fields);

    let job: JobRow = sqlx::query_as(
        r#"
        INSERT INTO jobs
            (id, owner_id, title, description, category, hour_rate, duration, address,
             latitude, longitude, images, max_workers)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(req.title.trim())
    .bind(req.description.as_deref().map(str::trim).filter(|d| !d.is_empty()))
    .bind(req.category.trim())
    .bind(req.hour_rate)
    .bind(SqlJson(req.duration))
    .bind(SqlJson(address))
    .bind(req.coordinates.latitude)
    .bind(req.coordinates.longitude)
    .bind(&req.images)
    .bind(req.max_workers)
    .fetch_one(&state.db)
    .await?;

    info!("Created job {} for owner {}", job.id, job.owner_id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/my
pub async fn handle_my_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE owner_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/nearby
///
/// Active jobs within `max_distance` meters of a point, nearest first.
pub async fn handle_nearby_jobs(
    State(state): State<AppState>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<Vec<JobCandidate>>, AppError> {
    let center =
        GeoPoint::new(params.lat, params.lng).map_err(|e| AppError::Validation(e.to_string()))?;
    if !params.max_distance.is_finite() || params.max_distance <= 0.0 {
        return Err(AppError::Validation(
            "max_distance must be a positive number of meters".to_string(),
        ));
    }

    let jobs = state
        .candidates
        .active_jobs_near(
            center,
            params.max_distance,
            state.config.recommender.candidate_pool_limit,
            &params.categories(),
        )
        .await?;

    Ok(Json(jobs))
}

/// DELETE /api/v1/jobs/:id
///
/// Only the owner may delete a posting.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }

    info!("Deleted job {id}");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(category: Option<&str>) -> NearbyQuery {
        NearbyQuery {
            lat: 50.45,
            lng: 30.52,
            max_distance: 1_000.0,
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_nearby_categories_split_on_commas() {
        assert_eq!(
            query(Some("plumbing, gardening,,")).categories(),
            vec!["plumbing", "gardening"]
        );
        assert!(query(None).categories().is_empty());
    }

    #[test]
    fn test_create_request_parses_client_payload() {
        let req: CreateJobRequest = serde_json::from_value(serde_json::json!({
            "userId": "7a3c0b52-7c8e-4f47-a2cb-2c1b6d0f5c11",
            "title": "Paint a fence",
            "category": "painting",
            "coordinates": [50.45, 30.52],
            "address": {"city": "Kyiv"},
            "duration": {"hoursPerDay": 4, "daysPerWeek": 2, "weeks": 1},
            "hourRate": 300
        }))
        .unwrap();

        assert_eq!(req.hour_rate, 300.0);
        assert!(req.images.is_empty());
        assert_eq!(req.coordinates.latitude, 50.45);
    }

    #[test]
    fn test_create_request_rejects_bad_coordinates() {
        let parsed = serde_json::from_value::<CreateJobRequest>(serde_json::json!({
            "userId": "7a3c0b52-7c8e-4f47-a2cb-2c1b6d0f5c11",
            "title": "Paint a fence",
            "category": "painting",
            "coordinates": [95.0, 30.52],
            "address": {},
            "duration": {"hoursPerDay": 4, "daysPerWeek": 2, "weeks": 1},
            "hourRate": 300
        }));
        assert!(parsed.is_err());
    }
}
