use crate::errors::AppError;
use crate::models::job::JobDuration;

pub const MAX_JOB_IMAGES: usize = 5;
pub const MAX_TITLE_LEN: usize = 200;

/// Fields of a new posting that need checking beyond what deserialization enforces.
pub struct NewJob<'a> {
    pub title: &'a str,
    pub category: &'a str,
    pub hour_rate: f64,
    pub duration: &'a JobDuration,
    pub images: &'a [String],
    pub max_workers: Option<i32>,
}

/// Returns the first problem found, phrased for the client.
pub fn validate_new_job(job: &NewJob<'_>, allowed_categories: &[String]) -> Result<(), AppError> {
    let title = job.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "title cannot be longer than {MAX_TITLE_LEN} characters"
        )));
    }

    let category = job.category.trim();
    if category.is_empty() {
        return Err(AppError::Validation("category cannot be empty".to_string()));
    }
    if !allowed_categories.is_empty() && !allowed_categories.iter().any(|c| c == category) {
        return Err(AppError::Validation(format!("unknown category '{category}'")));
    }

    if !job.hour_rate.is_finite() || job.hour_rate < 0.0 {
        return Err(AppError::Validation(
            "hourRate must be a non-negative number".to_string(),
        ));
    }

    let JobDuration {
        hours_per_day,
        days_per_week,
        weeks,
    } = *job.duration;
    if !(hours_per_day > 0.0 && hours_per_day <= 24.0) {
        return Err(AppError::Validation(
            "duration.hoursPerDay must be in (0, 24]".to_string(),
        ));
    }
    if !(days_per_week > 0.0 && days_per_week <= 7.0) {
        return Err(AppError::Validation(
            "duration.daysPerWeek must be in (0, 7]".to_string(),
        ));
    }
    if !(weeks > 0.0 && weeks.is_finite()) {
        return Err(AppError::Validation(
            "duration.weeks must be positive".to_string(),
        ));
    }

    if job.images.len() > MAX_JOB_IMAGES {
        return Err(AppError::Validation(format!(
            "at most {MAX_JOB_IMAGES} images are allowed"
        )));
    }
    if job.images.iter().any(|i| i.trim().is_empty()) {
        return Err(AppError::Validation("image references cannot be empty".to_string()));
    }

    if matches!(job.max_workers, Some(n) if n < 1) {
        return Err(AppError::Validation("maxWorkers must be at least 1".to_string()));
    }

    Ok(())
}
