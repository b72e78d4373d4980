use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::address::Address;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    #[allow(dead_code)]
    pub email: String,
    pub fullname: Option<String>,
    pub role: String,
    pub rating: Option<f64>,
    pub rating_count: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<Json<Address>>,
    pub interested_categories: Vec<String>,
    pub preference_order: Vec<String>,
    pub introduced: bool,
    #[allow(dead_code)]
    pub created_at: DateTime<Utc>,
}

/// What other users may see about an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub fullname: Option<String>,
    pub role: String,
    pub rating: Option<f64>,
    pub rating_count: i32,
}

impl From<UserRow> for PublicProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            fullname: row.fullname,
            role: row.role,
            rating: row.rating,
            rating_count: row.rating_count,
        }
    }
}
