//! In-memory collaborators and fixtures for recommendation tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::job::JobDuration;
use crate::recommendation::candidates::{CandidateOwner, CandidateSource, JobCandidate, WorkerProfile};
use crate::recommendation::geo::GeoPoint;

/// A candidate with a fixed distance from the worker; coordinates are irrelevant.
pub fn candidate_at(distance_m: f64, hour_rate: f64, rating: f64, category: &str) -> JobCandidate {
    JobCandidate {
        id: Uuid::new_v4(),
        title: format!("{category} job"),
        category: category.to_string(),
        hour_rate,
        duration: JobDuration {
            hours_per_day: 8.0,
            days_per_week: 5.0,
            weeks: 1.0,
        },
        address: [("city".to_string(), "Kyiv".to_string())].into_iter().collect(),
        location: GeoPoint {
            latitude: 50.45,
            longitude: 30.52,
        },
        images: vec![],
        owner: CandidateOwner {
            id: Uuid::new_v4(),
            fullname: Some("Employer".to_string()),
            rating: Some(rating),
        },
        distance_m,
    }
}

/// A candidate posted at a real location; distance is computed by the source.
pub fn candidate_located(location: GeoPoint, hour_rate: f64, category: &str) -> JobCandidate {
    JobCandidate {
        location,
        distance_m: 0.0,
        ..candidate_at(0.0, hour_rate, 3.0, category)
    }
}

pub fn worker_at(location: Option<GeoPoint>, categories: &[&str]) -> WorkerProfile {
    WorkerProfile {
        id: Uuid::new_v4(),
        location,
        interested_categories: categories.iter().map(|s| s.to_string()).collect(),
        preference_order: Default::default(),
    }
}

#[derive(Default)]
pub struct InMemoryCandidateSource {
    pub workers: HashMap<Uuid, WorkerProfile>,
    pub jobs: Vec<JobCandidate>,
    pub applications: HashSet<(Uuid, Uuid)>,
    pub fail_jobs: bool,
    pub fail_applications: bool,
    /// Every `(radius_m, limit)` passed to `active_jobs_near`.
    pub job_queries: Mutex<Vec<(f64, usize)>>,
}

impl InMemoryCandidateSource {
    pub fn with_worker(mut self, worker: WorkerProfile) -> Self {
        self.workers.insert(worker.id, worker);
        self
    }

    pub fn with_jobs(mut self, jobs: Vec<JobCandidate>) -> Self {
        self.jobs.extend(jobs);
        self
    }

    pub fn with_application(mut self, worker_id: Uuid, job_id: Uuid) -> Self {
        self.applications.insert((worker_id, job_id));
        self
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateSource {
    async fn worker_profile(&self, worker_id: Uuid) -> Result<Option<WorkerProfile>> {
        Ok(self.workers.get(&worker_id).cloned())
    }

    async fn active_jobs_near(
        &self,
        center: GeoPoint,
        radius_m: f64,
        limit: usize,
        categories: &[String],
    ) -> Result<Vec<JobCandidate>> {
        if let Ok(mut queries) = self.job_queries.lock() {
            queries.push((radius_m, limit));
        }
        if self.fail_jobs {
            return Err(anyhow!("job store unreachable"));
        }

        let mut found: Vec<JobCandidate> = self
            .jobs
            .iter()
            .cloned()
            .map(|mut job| {
                job.distance_m = center.distance_m(&job.location);
                job
            })
            .filter(|job| job.distance_m <= radius_m)
            .filter(|job| categories.is_empty() || categories.contains(&job.category))
            .collect();
        found.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        found.truncate(limit);
        Ok(found)
    }

    async fn applied_job_ids(&self, worker_id: Uuid, job_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if self.fail_applications {
            return Err(anyhow!("application store unreachable"));
        }
        Ok(job_ids
            .iter()
            .filter(|id| self.applications.contains(&(worker_id, **id)))
            .copied()
            .collect())
    }
}
