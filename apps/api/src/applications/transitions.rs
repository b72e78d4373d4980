//! Application lifecycle: `active` → `in_progress` once both sides agree, `closed` by the
//! employer, and back to `active` on reopen. A review needs an application past `active`.

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::models::job::JobStatus;

/// The mutable part of an application plus the two participants.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationState {
    pub worker_id: Uuid,
    pub employer_id: Uuid,
    pub worker_agreed: bool,
    pub employer_agreed: bool,
    pub status: JobStatus,
}

/// What a transition asks of the job the application belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobUpdate {
    Unchanged,
    /// Work starts with this worker.
    Start { worker_id: Uuid },
    Close,
    Reopen,
}

impl TryFrom<&ApplicationRow> for ApplicationState {
    type Error = AppError;

    fn try_from(row: &ApplicationRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<JobStatus>().map_err(|e| {
            AppError::Internal(anyhow::anyhow!("application {}: {e}", row.id))
        })?;
        Ok(Self {
            worker_id: row.worker_id,
            employer_id: row.employer_id,
            worker_agreed: row.worker_agreed,
            employer_agreed: row.employer_agreed,
            status,
        })
    }
}

impl ApplicationState {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        user_id == self.worker_id || user_id == self.employer_id
    }

    /// Records the user's agreement. Work starts when both sides have agreed.
    pub fn agree(&mut self, user_id: Uuid) -> Result<JobUpdate, AppError> {
        if !self.is_participant(user_id) {
            return Err(AppError::Forbidden(
                "You have no rights to agree for this job".to_string(),
            ));
        }
        match self.status {
            JobStatus::Closed => {
                return Err(AppError::Validation(
                    "This application is closed".to_string(),
                ))
            }
            JobStatus::InProgress => return Ok(JobUpdate::Unchanged),
            JobStatus::Active => {}
        }

        if user_id == self.worker_id {
            self.worker_agreed = true;
        }
        if user_id == self.employer_id {
            self.employer_agreed = true;
        }

        if self.worker_agreed && self.employer_agreed {
            self.status = JobStatus::InProgress;
            Ok(JobUpdate::Start {
                worker_id: self.worker_id,
            })
        } else {
            Ok(JobUpdate::Unchanged)
        }
    }

    pub fn close(&mut self, user_id: Uuid) -> Result<JobUpdate, AppError> {
        self.require_employer(user_id, "You cannot close this application")?;
        self.status = JobStatus::Closed;
        Ok(JobUpdate::Close)
    }

    /// Back to `active` with both agreements withdrawn.
    pub fn reopen(&mut self, user_id: Uuid) -> Result<JobUpdate, AppError> {
        self.require_employer(user_id, "You cannot reopen this application")?;
        self.status = JobStatus::Active;
        self.worker_agreed = false;
        self.employer_agreed = false;
        Ok(JobUpdate::Reopen)
    }

    pub fn allows_review(&self) -> bool {
        allows_review(self.status)
    }

    fn require_employer(&self, user_id: Uuid, message: &str) -> Result<(), AppError> {
        if user_id == self.employer_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

/// Users may review each other once an application between them has left `active`.
pub fn allows_review(status: JobStatus) -> bool {
    status != JobStatus::Active
}

/// True when any of the stored application statuses permits a review.
/// Unreadable statuses never do.
pub fn any_allows_review<S: AsRef<str>>(statuses: &[S]) -> bool {
    statuses
        .iter()
        .filter_map(|s| s.as_ref().parse::<JobStatus>().ok())
        .any(allows_review)
}
