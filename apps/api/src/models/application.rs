use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub employer_id: Uuid,
    pub worker_agreed: bool,
    pub employer_agreed: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
