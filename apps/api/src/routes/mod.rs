pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::state::AppState;
use crate::{applications, jobs, recommendation, reviews, users};

/// `?user_id=` carried by every request that acts on behalf of a user.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route("/api/v1/jobs", post(jobs::handlers::handle_create_job))
        .route("/api/v1/jobs/my", get(jobs::handlers::handle_my_jobs))
        .route("/api/v1/jobs/nearby", get(jobs::handlers::handle_nearby_jobs))
        .route(
            "/api/v1/jobs/recommendations",
            get(recommendation::handlers::handle_recommendations),
        )
        .route("/api/v1/jobs/:id", delete(jobs::handlers::handle_delete_job))
        // Users
        .route(
            "/api/v1/users/preferences",
            put(users::handlers::handle_update_preferences),
        )
        .route(
            "/api/v1/users/location",
            put(users::handlers::handle_update_location),
        )
        .route(
            "/api/v1/users/onboarding",
            put(users::handlers::handle_onboarding),
        )
        .route("/api/v1/users/:id", get(users::handlers::handle_get_profile))
        // Applications
        .route(
            "/api/v1/applications",
            post(applications::handlers::handle_apply),
        )
        .route(
            "/api/v1/applications/my",
            get(applications::handlers::handle_my_applications),
        )
        .route(
            "/api/v1/applications/:id/agree",
            patch(applications::handlers::handle_agree),
        )
        .route(
            "/api/v1/applications/:id/close",
            patch(applications::handlers::handle_close),
        )
        .route(
            "/api/v1/applications/:id/reopen",
            patch(applications::handlers::handle_reopen),
        )
        // Reviews
        .route("/api/v1/reviews", post(reviews::handlers::handle_create_review))
        .route(
            "/api/v1/reviews/:id",
            patch(reviews::handlers::handle_update_review),
        )
        .route(
            "/api/v1/reviews/received",
            get(reviews::handlers::handle_received_reviews),
        )
        .route(
            "/api/v1/reviews/given",
            get(reviews::handlers::handle_given_reviews),
        )
        .route(
            "/api/v1/reviews/people-to-review",
            get(reviews::handlers::handle_people_to_review),
        )
        .with_state(state)
}
