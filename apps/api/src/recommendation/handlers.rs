use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::AppError;
use crate::recommendation::ranking::RecommendedJob;
use crate::routes::UserIdQuery;
use crate::state::AppState;

/// GET /api/v1/jobs/recommendations
///
/// Up to `RECOMMENDATION_LIMIT` nearby active jobs, best match first, each with its score breakdown.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<RecommendedJob>>, AppError> {
    let jobs = state
        .recommender
        .recommend(state.candidates.as_ref(), params.user_id)
        .await?;
    Ok(Json(jobs))
}
