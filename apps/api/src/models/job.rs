use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::address::Address;

/// Lifecycle shared by jobs and the applications to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    InProgress,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::InProgress => "in_progress",
            JobStatus::Closed => "closed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(JobStatus::Active),
            "in_progress" => Ok(JobStatus::InProgress),
            "closed" => Ok(JobStatus::Closed),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Expected workload of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDuration {
    pub hours_per_day: f64,
    pub days_per_week: f64,
    pub weeks: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub hour_rate: f64,
    pub duration: Json<JobDuration>,
    pub address: Json<Address>,
    pub latitude: f64,
    pub longitude: f64,
    pub images: Vec<String>,
    pub max_workers: Option<i32>,
    pub status: String,
    /// Set once worker and employer both agreed; cleared on reopen.
    pub selected_worker_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
