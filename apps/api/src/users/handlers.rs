use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::address::{sanitize_address, Address};
use crate::models::user::{PublicProfile, UserRow};
use crate::recommendation::criteria::PreferenceOrder;
use crate::recommendation::geo::GeoPoint;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub user_id: Uuid,
    pub preference_order: Option<Vec<String>>,
    pub interested_categories: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub preference_order: Vec<String>,
    pub interested_categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub user_id: Uuid,
    pub coordinates: GeoPoint,
    pub address: Option<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub coordinates: GeoPoint,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Employer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Employer => "employer",
        }
    }
}

/// First-run setup: everything optional, applied together.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub user_id: Uuid,
    pub role: Option<Role>,
    pub interested_categories: Option<Vec<String>>,
    pub preference_order: Option<Vec<String>>,
    pub coordinates: Option<GeoPoint>,
    pub address: Option<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub id: Uuid,
    pub role: String,
    pub interested_categories: Vec<String>,
    pub preference_order: Vec<String>,
    pub coordinates: Option<GeoPoint>,
    pub address: Option<Address>,
    pub introduced: bool,
}

impl From<UserRow> for OnboardingResponse {
    fn from(row: UserRow) -> Self {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).ok(),
            _ => None,
        };
        Self {
            id: row.id,
            role: row.role,
            interested_categories: row.interested_categories,
            preference_order: row.preference_order,
            coordinates,
            address: row.address.map(|a| a.0),
            introduced: row.introduced,
        }
    }
}

/// Trims, drops blanks and removes repeats while keeping the first occurrence.
fn normalize_categories(raw: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(raw.len());
    for category in raw {
        let category = category.trim();
        if !category.is_empty() && !normalized.iter().any(|c| c == category) {
            normalized.push(category.to_string());
        }
    }
    normalized
}

/// An empty `allowed` list accepts everything.
fn check_known_categories(categories: &[String], allowed: &[String]) -> Result<(), AppError> {
    if allowed.is_empty() {
        return Ok(());
    }
    match categories.iter().find(|c| !allowed.contains(c)) {
        Some(unknown) => Err(AppError::Validation(format!("unknown category '{unknown}'"))),
        None => Ok(()),
    }
}

/// Strictly parsed criteria, stored as their identifiers.
fn parse_preference_order(raw: Option<&[String]>) -> Result<Option<Vec<String>>, AppError> {
    raw.map(PreferenceOrder::parse_strict)
        .transpose()
        .map(|order| order.map(|o| o.to_strings()))
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn parse_categories(
    raw: Option<Vec<String>>,
    allowed: &[String],
) -> Result<Option<Vec<String>>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let categories = normalize_categories(raw);
    check_known_categories(&categories, allowed)?;
    Ok(Some(categories))
}

/// PUT /api/v1/users/preferences
///
/// Stores the worker's criterion priority and/or interested categories.
/// Unknown or repeated criteria are rejected.
pub async fn handle_update_preferences(
    State(state): State<AppState>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let preference_order = parse_preference_order(req.preference_order.as_deref())?;
    let interested_categories =
        parse_categories(req.interested_categories, &state.config.job_categories)?;

    let row: Option<UserRow> = sqlx::query_as(
        r#"
        UPDATE users
        SET preference_order = COALESCE($2, preference_order),
            interested_categories = COALESCE($3, interested_categories)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(preference_order)
    .bind(interested_categories)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("User {} not found", req.user_id)))?;
    info!("Updated preferences for user {}", row.id);

    Ok(Json(PreferencesResponse {
        preference_order: row.preference_order,
        interested_categories: row.interested_categories,
    }))
}

/// PUT /api/v1/users/onboarding
///
/// Sets role, interests, criterion priority and location in one step and marks the
/// account as introduced.
pub async fn handle_onboarding(
    State(state): State<AppState>,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<OnboardingResponse>, AppError> {
    let preference_order = parse_preference_order(req.preference_order.as_deref())?;
    let interested_categories =
        parse_categories(req.interested_categories, &state.config.job_categories)?;
    if interested_categories.as_ref().is_some_and(Vec::is_empty) {
        return Err(AppError::Validation(
            "interestedCategories must not be empty".to_string(),
        ));
    }
    let address = req
        .address
        .map(|a| SqlJson(sanitize_address(a, &state.config.address_fields)));

    let row: Option<UserRow> = sqlx::query_as(
        r#"
        UPDATE users
        SET role = COALESCE($2, role),
            interested_categories = COALESCE($3, interested_categories),
            preference_order = COALESCE($4, preference_order),
            latitude = COALESCE($5, latitude),
            longitude = COALESCE($6, longitude),
            address = COALESCE($7, address),
            introduced = TRUE
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.role.map(|r| r.as_str()))
    .bind(interested_categories)
    .bind(preference_order)
    .bind(req.coordinates.map(|c| c.latitude))
    .bind(req.coordinates.map(|c| c.longitude))
    .bind(address)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("User {} not found", req.user_id)))?;
    info!("Onboarded user {} as {}", row.id, row.role);
    Ok(Json(OnboardingResponse::from(row)))
}

/// PUT /api/v1/users/location
pub async fn handle_update_location(
    State(state): State<AppState>,
    Json(req): Json<UpdateLocationRequest>,
) -> Result<Json<LocationResponse>, AppError> {
    let address = req
        .address
        .map(|a| sanitize_address(a, &state.config.address_fields));

    let result = sqlx::query(
        "UPDATE users SET latitude = $2, longitude = $3, address = $4 WHERE id = $1",
    )
    .bind(req.user_id)
    .bind(req.coordinates.latitude)
    .bind(req.coordinates.longitude)
    .bind(address.clone().map(SqlJson))
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {} not found", req.user_id)));
    }

    info!("Updated location for user {}", req.user_id);
    Ok(Json(LocationResponse {
        coordinates: req.coordinates,
        address,
    }))
}

/// GET /api/v1/users/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicProfile>, AppError> {
    let row: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    Ok(Json(PublicProfile::from(row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_categories() {
        let raw = vec![
            " plumbing ".to_string(),
            "".to_string(),
            "gardening".to_string(),
            "plumbing".to_string(),
        ];
        assert_eq!(normalize_categories(raw), vec!["plumbing", "gardening"]);
    }

    #[test]
    fn test_check_known_categories() {
        let chosen = vec!["plumbing".to_string()];
        assert!(check_known_categories(&chosen, &[]).is_ok());
        assert!(check_known_categories(&chosen, &["plumbing".to_string()]).is_ok());
        assert!(matches!(
            check_known_categories(&chosen, &["gardening".to_string()]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_preferences_request_accepts_partial_update() {
        let req: UpdatePreferencesRequest = serde_json::from_str(
            r#"{"userId":"7a3c0b52-7c8e-4f47-a2cb-2c1b6d0f5c11","preferenceOrder":["salary","distance"]}"#,
        )
        .unwrap();
        assert_eq!(req.preference_order.unwrap(), vec!["salary", "distance"]);
        assert!(req.interested_categories.is_none());
    }

    #[test]
    fn test_preference_order_parsed_strictly() {
        let order = vec!["salary".to_string(), "distance".to_string()];
        assert_eq!(
            parse_preference_order(Some(order.as_slice())).unwrap(),
            Some(vec!["salary".to_string(), "distance".to_string()])
        );
        assert_eq!(parse_preference_order(None).unwrap(), None);

        let unknown = vec!["salary".to_string(), "vibes".to_string()];
        assert!(matches!(
            parse_preference_order(Some(unknown.as_slice())),
            Err(AppError::Validation(_))
        ));
        let repeated = vec!["salary".to_string(), "salary".to_string()];
        assert!(parse_preference_order(Some(repeated.as_slice())).is_err());
    }

    #[test]
    fn test_parse_categories_normalizes_then_checks() {
        let allowed = vec!["plumbing".to_string()];
        assert_eq!(
            parse_categories(Some(vec![" plumbing ".to_string()]), &allowed).unwrap(),
            Some(vec!["plumbing".to_string()])
        );
        assert!(parse_categories(Some(vec!["cooking".to_string()]), &allowed).is_err());
        assert_eq!(parse_categories(None, &allowed).unwrap(), None);
    }

    #[test]
    fn test_onboarding_request_parses() {
        let req: OnboardingRequest = serde_json::from_value(serde_json::json!({
            "userId": "7a3c0b52-7c8e-4f47-a2cb-2c1b6d0f5c11",
            "role": "employer",
            "coordinates": [50.45, 30.52],
            "preferenceOrder": ["reputation"]
        }))
        .unwrap();
        assert_eq!(req.role, Some(Role::Employer));
        assert_eq!(req.coordinates.map(|c| c.longitude), Some(30.52));
        assert!(req.interested_categories.is_none());

        let bad_role = serde_json::from_value::<OnboardingRequest>(serde_json::json!({
            "userId": "7a3c0b52-7c8e-4f47-a2cb-2c1b6d0f5c11",
            "role": "admin"
        }));
        assert!(bad_role.is_err());
    }
}
