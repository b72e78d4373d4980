//! Typed inputs of the recommendation engine and the store seam that produces them.
//!
//! `AppState` holds an `Arc<dyn CandidateSource>`; production uses `PgCandidateSource`.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::models::address::Address;
use crate::models::job::{JobDuration, JobStatus};
use crate::models::user::UserRow;
use crate::recommendation::criteria::PreferenceOrder;
use crate::recommendation::geo::{BoundingBox, GeoPoint};

// ────────────────────────────────────────────────────────────────────────────
// Domain inputs
// ────────────────────────────────────────────────────────────────────────────

/// What the engine needs to know about the requesting worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerProfile {
    pub id: Uuid,
    pub location: Option<GeoPoint>,
    pub interested_categories: HashSet<String>,
    /// May be empty; the engine substitutes its default order.
    pub preference_order: PreferenceOrder,
}

impl From<&UserRow> for WorkerProfile {
    fn from(row: &UserRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng)
                .map_err(|e| warn!("Ignoring stored location of user {}: {e}", row.id))
                .ok(),
            _ => None,
        };

        Self {
            id: row.id,
            location,
            interested_categories: row.interested_categories.iter().cloned().collect(),
            preference_order: PreferenceOrder::from_stored(&row.preference_order),
        }
    }
}

/// Employer data exposed next to a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOwner {
    pub id: Uuid,
    pub fullname: Option<String>,
    /// Average review rating in [0, 5]; absent until the first review.
    pub rating: Option<f64>,
}

/// An active job posting as seen from one worker's position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCandidate {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub hour_rate: f64,
    pub duration: JobDuration,
    pub address: Address,
    #[serde(rename = "coordinates")]
    pub location: GeoPoint,
    pub images: Vec<String>,
    pub owner: CandidateOwner,
    /// Great-circle distance from the worker, meters.
    #[serde(rename = "distance")]
    pub distance_m: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Data collaborators of the recommendation pipeline.
/// Failures propagate to the caller; implementations never return partial data.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn worker_profile(&self, worker_id: Uuid) -> Result<Option<WorkerProfile>>;

    /// Active jobs within `radius_m` of `center`, nearest first, at most `limit`.
    /// A non-empty `categories` keeps only those categories, before the limit applies.
    async fn active_jobs_near(
        &self,
        center: GeoPoint,
        radius_m: f64,
        limit: usize,
        categories: &[String],
    ) -> Result<Vec<JobCandidate>>;

    /// The subset of `job_ids` the worker has applied to.
    async fn applied_job_ids(&self, worker_id: Uuid, job_ids: &[Uuid]) -> Result<HashSet<Uuid>>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct PgCandidateSource {
    pool: PgPool,
}

impl PgCandidateSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NearbyJobRow {
    id: Uuid,
    title: String,
    category: String,
    hour_rate: f64,
    duration: Json<JobDuration>,
    address: Json<Address>,
    latitude: f64,
    longitude: f64,
    images: Vec<String>,
    owner_id: Uuid,
    owner_fullname: Option<String>,
    owner_rating: Option<f64>,
}

impl NearbyJobRow {
    fn into_candidate(self, center: &GeoPoint) -> Option<JobCandidate> {
        let location = match GeoPoint::new(self.latitude, self.longitude) {
            Ok(point) => point,
            Err(e) => {
                warn!("Skipping job {} with invalid coordinates: {e}", self.id);
                return None;
            }
        };

        Some(JobCandidate {
            id: self.id,
            title: self.title,
            category: self.category,
            hour_rate: self.hour_rate,
            duration: self.duration.0,
            address: self.address.0,
            distance_m: center.distance_m(&location),
            location,
            images: self.images,
            owner: CandidateOwner {
                id: self.owner_id,
                fullname: self.owner_fullname,
                rating: self.owner_rating,
            },
        })
    }
}

/// Keeps candidates inside the radius and orders them nearest first.
fn within_radius(mut candidates: Vec<JobCandidate>, radius_m: f64, limit: usize) -> Vec<JobCandidate> {
    candidates.retain(|c| c.distance_m <= radius_m);
    candidates.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.truncate(limit);
    candidates
}

#[async_trait]
impl CandidateSource for PgCandidateSource {
    async fn worker_profile(&self, worker_id: Uuid) -> Result<Option<WorkerProfile>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(worker_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(WorkerProfile::from))
    }

    async fn active_jobs_near(
        &self,
        center: GeoPoint,
        radius_m: f64,
        limit: usize,
        categories: &[String],
    ) -> Result<Vec<JobCandidate>> {
        let bbox = BoundingBox::around(center, radius_m);

        // Box prefilter on the coordinate index, ordered by an equirectangular
        // approximation. Exact distances are computed below.
        let rows: Vec<NearbyJobRow> = sqlx::query_as(
            r#"
            SELECT j.id, j.title, j.category, j.hour_rate, j.duration, j.address,
                   j.latitude, j.longitude, j.images,
                   u.id AS owner_id, u.fullname AS owner_fullname, u.rating AS owner_rating
            FROM jobs j
            JOIN users u ON u.id = j.owner_id
            WHERE j.status = $1
              AND j.latitude BETWEEN $2 AND $3
              AND j.longitude BETWEEN $4 AND $5
              AND (cardinality($9::text[]) = 0 OR j.category = ANY($9))
            ORDER BY power(j.latitude - $6, 2)
                   + power((j.longitude - $7) * cos(radians($6)), 2),
                     j.id
            LIMIT $8
            "#,
        )
        .bind(JobStatus::Active.as_str())
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lng)
        .bind(bbox.max_lng)
        .bind(center.latitude)
        .bind(center.longitude)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(categories)
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows
            .into_iter()
            .filter_map(|row| row.into_candidate(&center))
            .collect();

        Ok(within_radius(candidates, radius_m, limit))
    }

    async fn applied_job_ids(&self, worker_id: Uuid, job_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if job_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let applied: Vec<Uuid> = sqlx::query_scalar(
            "SELECT job_id FROM applications WHERE worker_id = $1 AND job_id = ANY($2)",
        )
        .bind(worker_id)
        .bind(job_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(applied.into_iter().collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
