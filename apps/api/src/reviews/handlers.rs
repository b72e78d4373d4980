use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use crate::applications::transitions::any_allows_review;
use crate::errors::AppError;
use crate::models::job::JobStatus;
use crate::models::review::ReviewRow;
use crate::models::user::{PublicProfile, UserRow};
use crate::reviews::rating::{average_rating, is_valid_rating, MAX_REVIEW_RATING, MIN_REVIEW_RATING};
use crate::routes::UserIdQuery;
use crate::state::AppState;

const MAX_COMMENT_LEN: usize = 2_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

impl CreateReviewRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.user_id == self.target_id {
            return Err(AppError::Validation("You cannot review yourself".to_string()));
        }
        check_rating(self.rating)?;
        check_comment(self.comment.as_deref())
    }
}

fn check_rating(rating: i16) -> Result<(), AppError> {
    if is_valid_rating(rating) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "rating must be between {MIN_REVIEW_RATING} and {MAX_REVIEW_RATING}"
        )))
    }
}

fn check_comment(comment: Option<&str>) -> Result<(), AppError> {
    if comment.is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN) {
        return Err(AppError::Validation(format!(
            "comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(())
}

/// Blank comments are stored as NULL.
fn clean_comment(comment: Option<&str>) -> Option<&str> {
    comment.map(str::trim).filter(|c| !c.is_empty())
}

/// `None` from the conflict-guarded insert means the author already reviewed the target.
fn inserted_review(row: Option<ReviewRow>) -> Result<ReviewRow, AppError> {
    row.ok_or_else(|| AppError::Forbidden("You have already reviewed this user".to_string()))
}

fn check_author(review: &ReviewRow, user_id: Uuid) -> Result<(), AppError> {
    if review.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only edit your own reviews".to_string(),
        ))
    }
}

/// Recomputes the target's average rating and review count from its reviews.
async fn recalculate_rating(
    conn: &mut PgConnection,
    target_id: Uuid,
) -> Result<(Option<f64>, usize), AppError> {
    let ratings: Vec<i16> = sqlx::query_scalar("SELECT rating FROM reviews WHERE target_id = $1")
        .bind(target_id)
        .fetch_all(&mut *conn)
        .await?;
    let rating = average_rating(&ratings);

    sqlx::query("UPDATE users SET rating = $2, rating_count = $3 WHERE id = $1")
        .bind(target_id)
        .bind(rating)
        .bind(i32::try_from(ratings.len()).unwrap_or(i32::MAX))
        .execute(&mut *conn)
        .await?;

    Ok((rating, ratings.len()))
}

/// POST /api/v1/reviews
///
/// The two users must share an application that has moved past `active`.
pub async fn handle_create_review(
    State(state): State<AppState>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewRow>), AppError> {
    req.validate()?;

    let statuses: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT status FROM applications
        WHERE (worker_id = $1 AND employer_id = $2)
           OR (worker_id = $2 AND employer_id = $1)
        "#,
    )
    .bind(req.user_id)
    .bind(req.target_id)
    .fetch_all(&state.db)
    .await?;
    if !any_allows_review(&statuses) {
        return Err(AppError::NotFound(
            "These users never worked together".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let row: Option<ReviewRow> = sqlx::query_as(
        r#"
        INSERT INTO reviews (id, author_id, target_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (author_id, target_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(req.target_id)
    .bind(req.rating)
    .bind(clean_comment(req.comment.as_deref()))
    .fetch_optional(&mut *tx)
    .await?;
    let review = inserted_review(row)?;

    let (rating, count) = recalculate_rating(&mut *tx, review.target_id).await?;
    tx.commit().await?;

    info!(
        "User {} reviewed {} ({}), rating now {:?} over {count} reviews",
        review.author_id, review.target_id, review.rating, rating
    );
    Ok((StatusCode::CREATED, Json(review)))
}

/// PATCH /api/v1/reviews/:id
///
/// Only the author may change a review; the target's rating is recomputed.
pub async fn handle_update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewRow>, AppError> {
    check_rating(req.rating)?;
    check_comment(req.comment.as_deref())?;

    let mut tx = state.db.begin().await?;

    let existing: ReviewRow = sqlx::query_as("SELECT * FROM reviews WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {id} not found")))?;
    check_author(&existing, req.user_id)?;

    let review: ReviewRow = sqlx::query_as(
        "UPDATE reviews SET rating = $2, comment = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(req.rating)
    .bind(clean_comment(req.comment.as_deref()))
    .fetch_one(&mut *tx)
    .await?;

    let (rating, count) = recalculate_rating(&mut *tx, review.target_id).await?;
    tx.commit().await?;

    info!(
        "Review {id} updated, rating of {} now {:?} over {count} reviews",
        review.target_id, rating
    );
    Ok(Json(review))
}

/// GET /api/v1/reviews/received
pub async fn handle_received_reviews(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ReviewRow>>, AppError> {
    let reviews = sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM reviews WHERE target_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(reviews))
}

/// GET /api/v1/reviews/given
pub async fn handle_given_reviews(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ReviewRow>>, AppError> {
    let reviews = sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM reviews WHERE author_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(reviews))
}

/// GET /api/v1/reviews/people-to-review
///
/// Everyone the user shares an application with that has left `active`.
pub async fn handle_people_to_review(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PublicProfile>>, AppError> {
    let users = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.* FROM users u
        WHERE u.id <> $1
          AND EXISTS (
            SELECT 1 FROM applications a
            WHERE a.status <> $2
              AND ((a.employer_id = $1 AND a.worker_id = u.id)
                OR (a.worker_id = $1 AND a.employer_id = u.id))
          )
        ORDER BY u.username
        "#,
    )
    .bind(params.user_id)
    .bind(JobStatus::Active.as_str())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(users.into_iter().map(PublicProfile::from).collect()))
}
