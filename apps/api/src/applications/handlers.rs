use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::{FromRow, PgConnection};
use tracing::info;
use uuid::Uuid;

use crate::applications::transitions::{ApplicationState, JobUpdate};
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::models::job::JobStatus;
use crate::routes::UserIdQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub user_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, FromRow)]
struct JobOwnership {
    owner_id: Uuid,
    status: String,
}

/// Which side of its applications a user sees in `GET /applications/my`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ApplicationSide {
    Worker,
    Employer,
}

impl ApplicationSide {
    fn for_role(role: &str) -> Self {
        if role == "employer" {
            ApplicationSide::Employer
        } else {
            ApplicationSide::Worker
        }
    }

    fn list_query(self) -> &'static str {
        match self {
            ApplicationSide::Worker => {
                "SELECT * FROM applications WHERE worker_id = $1 ORDER BY created_at DESC, id"
            }
            ApplicationSide::Employer => {
                "SELECT * FROM applications WHERE employer_id = $1 ORDER BY created_at DESC, id"
            }
        }
    }
}

/// Decides whether `worker_id` may apply to the job described by `job`.
fn check_can_apply(job_id: Uuid, worker_id: Uuid, job: Option<&JobOwnership>) -> Result<(), AppError> {
    let job = job.ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    if job.status != JobStatus::Active.as_str() {
        return Err(AppError::Validation(
            "This job no longer accepts applications".to_string(),
        ));
    }
    if job.owner_id == worker_id {
        return Err(AppError::Validation(
            "You cannot apply to your own job".to_string(),
        ));
    }
    Ok(())
}

/// `None` from the conflict-guarded insert means the pair already exists.
fn inserted_application(row: Option<ApplicationRow>) -> Result<ApplicationRow, AppError> {
    row.ok_or_else(|| AppError::Validation("You have already applied for this job".to_string()))
}

/// POST /api/v1/applications
pub async fn handle_apply(
    State(state): State<AppState>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let job: Option<JobOwnership> =
        sqlx::query_as("SELECT owner_id, status FROM jobs WHERE id = $1")
            .bind(req.job_id)
            .fetch_optional(&state.db)
            .await?;

    check_can_apply(req.job_id, req.user_id, job.as_ref())?;
    let employer_id = job.map(|j| j.owner_id);

    let row: Option<ApplicationRow> = sqlx::query_as(
        r#"
        INSERT INTO applications (id, job_id, worker_id, employer_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (job_id, worker_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.job_id)
    .bind(req.user_id)
    .bind(employer_id)
    .fetch_optional(&state.db)
    .await?;
    let application = inserted_application(row)?;

    info!(
        "Worker {} applied to job {}",
        application.worker_id, application.job_id
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications/my
///
/// Workers get the applications they sent, employers the ones sent to their jobs.
pub async fn handle_my_applications(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(params.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", params.user_id)))?;

    let applications = sqlx::query_as::<_, ApplicationRow>(
        ApplicationSide::for_role(&role).list_query(),
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(applications))
}

/// PATCH /api/v1/applications/:id/agree
pub async fn handle_agree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApplicationRow>, AppError> {
    transition(&state, id, |app| app.agree(params.user_id)).await
}

/// PATCH /api/v1/applications/:id/close
pub async fn handle_close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApplicationRow>, AppError> {
    transition(&state, id, |app| app.close(params.user_id)).await
}

/// PATCH /api/v1/applications/:id/reopen
pub async fn handle_reopen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApplicationRow>, AppError> {
    transition(&state, id, |app| app.reopen(params.user_id)).await
}

/// Loads the application under a row lock, applies `step`, and writes the
/// application and its job in one transaction.
async fn transition<F>(state: &AppState, id: Uuid, step: F) -> Result<Json<ApplicationRow>, AppError>
where
    F: FnOnce(&mut ApplicationState) -> Result<JobUpdate, AppError>,
{
    let mut tx = state.db.begin().await?;

    let row: ApplicationRow = sqlx::query_as("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("The application was not found".to_string()))?;

    let mut app = ApplicationState::try_from(&row)?;
    let job_update = step(&mut app)?;

    let updated: ApplicationRow = sqlx::query_as(
        r#"
        UPDATE applications
        SET worker_agreed = $2, employer_agreed = $3, status = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(app.worker_agreed)
    .bind(app.employer_agreed)
    .bind(app.status.as_str())
    .fetch_one(&mut *tx)
    .await?;

    update_job(&mut *tx, row.job_id, job_update).await?;
    tx.commit().await?;

    info!(
        "Application {id} is now {} ({:?} for job {})",
        updated.status, job_update, updated.job_id
    );
    Ok(Json(updated))
}

async fn update_job(conn: &mut PgConnection, job_id: Uuid, update: JobUpdate) -> Result<(), AppError> {
    let query = match update {
        JobUpdate::Unchanged => return Ok(()),
        JobUpdate::Start { worker_id } => {
            sqlx::query("UPDATE jobs SET status = $2, selected_worker_id = $3 WHERE id = $1")
                .bind(job_id)
                .bind(JobStatus::InProgress.as_str())
                .bind(worker_id)
        }
        JobUpdate::Close => sqlx::query("UPDATE jobs SET status = $2 WHERE id = $1")
            .bind(job_id)
            .bind(JobStatus::Closed.as_str()),
        JobUpdate::Reopen => {
            sqlx::query("UPDATE jobs SET status = $2, selected_worker_id = NULL WHERE id = $1")
                .bind(job_id)
                .bind(JobStatus::Active.as_str())
        }
    };
    query.execute(conn).await?;
    Ok(())
}
