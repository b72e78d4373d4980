use anyhow::{bail, Context, Result};
use std::str::FromStr;

use crate::recommendation::RecommenderConfig;

/// Address components accepted from the reverse-geocoding lookup.
/// Anything outside this list is dropped before a job or user address is stored.
pub const DEFAULT_ADDRESS_FIELDS: &[&str] = &[
    "amenity",
    "building",
    "house_number",
    "road",
    "neighbourhood",
    "suburb",
    "borough",
    "city",
    "municipality",
    "district",
    "state",
    "postcode",
];

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub request_timeout_secs: u64,
    /// Allowed job categories. Empty means any non-empty category is accepted.
    pub job_categories: Vec<String>,
    pub address_fields: Vec<String>,
    pub recommender: RecommenderConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = RecommenderConfig::default();

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30)?,
            job_categories: std::env::var("JOB_CATEGORIES")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            address_fields: DEFAULT_ADDRESS_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            recommender: validate_recommender(RecommenderConfig {
                limit: parse_env("RECOMMENDATION_LIMIT", defaults.limit)?,
                search_radius_km: parse_env("RECOMMENDATION_RADIUS_KM", defaults.search_radius_km)?,
                candidate_pool_limit: parse_env("CANDIDATE_POOL_LIMIT", defaults.candidate_pool_limit)?,
                ..defaults
            })
            .context("Invalid recommendation settings")?,
        })
    }
}

/// Rejects settings that would silently turn recommendations off.
fn validate_recommender(config: RecommenderConfig) -> Result<RecommenderConfig> {
    if config.limit == 0 {
        bail!("RECOMMENDATION_LIMIT must be at least 1");
    }
    if !config.search_radius_km.is_finite() || config.search_radius_km <= 0.0 {
        bail!(
            "RECOMMENDATION_RADIUS_KM must be a positive number, got {}",
            config.search_radius_km
        );
    }
    if config.candidate_pool_limit == 0 {
        bail!("CANDIDATE_POOL_LIMIT must be at least 1");
    }
    Ok(config)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
