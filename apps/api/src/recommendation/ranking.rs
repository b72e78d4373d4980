use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::recommendation::candidates::{CandidateSource, JobCandidate, WorkerProfile};
use crate::recommendation::criteria::PreferenceOrder;
use crate::recommendation::scoring::{max_salary_in_pool, ScoreBreakdown, ScoringContext};
use crate::recommendation::weights::generate_weights;

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// Maximum number of recommendations returned.
    pub limit: usize,
    /// Candidates farther than this are not retrieved; also the distance normalizer.
    pub search_radius_km: f64,
    /// Maximum number of candidates scored per request.
    pub candidate_pool_limit: usize,
    /// Used when a worker has no (valid) preference order.
    pub default_order: PreferenceOrder,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            limit: 30,
            search_radius_km: 25.0,
            candidate_pool_limit: 500,
            default_order: PreferenceOrder::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: JobCandidate,
    pub breakdown: ScoreBreakdown,
}

/// One entry of the ranked response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedJob {
    #[serde(flatten)]
    pub job: JobCandidate,
    pub has_applied: bool,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
}

/// Highest score first; ties go to the nearer job, then to the lower id.
fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.breakdown
        .score
        .total_cmp(&a.breakdown.score)
        .then_with(|| a.candidate.distance_m.total_cmp(&b.candidate.distance_m))
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}

#[derive(Debug, Clone)]
pub struct Recommender {
    config: RecommenderConfig,
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Self {
        Self { config }
    }

    pub fn search_radius_m(&self) -> f64 {
        self.config.search_radius_km * 1_000.0
    }

    /// Scores, sorts and truncates a candidate pool for one worker. Pure.
    pub fn rank(&self, worker: &WorkerProfile, candidates: Vec<JobCandidate>) -> Vec<ScoredCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let order = if worker.preference_order.is_empty() {
            &self.config.default_order
        } else {
            &worker.preference_order
        };

        let ctx = ScoringContext {
            weights: generate_weights(order.as_slice()),
            max_salary: max_salary_in_pool(candidates.iter().map(|c| c.hour_rate)),
            search_radius_m: self.search_radius_m(),
            interested_categories: &worker.interested_categories,
        };

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| ScoredCandidate {
                breakdown: ctx.score(&candidate),
                candidate,
            })
            .collect();

        scored.sort_by(rank_order);
        scored.truncate(self.config.limit);
        scored
    }

    /// Full pipeline: profile → nearby candidates → rank → applied annotation.
    ///
    /// A worker without a location gets an empty list. Collaborator failures become
    /// `AppError::Recommendation`; no partial ranking is ever returned.
    pub async fn recommend(
        &self,
        source: &dyn CandidateSource,
        worker_id: Uuid,
    ) -> Result<Vec<RecommendedJob>, AppError> {
        let worker = source
            .worker_profile(worker_id)
            .await
            .map_err(|e| AppError::Recommendation(format!("worker lookup failed: {e:#}")))?
            .ok_or_else(|| AppError::NotFound(format!("User {worker_id} not found")))?;

        let Some(location) = worker.location else {
            debug!("User {worker_id} has no location; returning no recommendations");
            return Ok(Vec::new());
        };

        let candidates = source
            .active_jobs_near(
                location,
                self.search_radius_m(),
                self.config.candidate_pool_limit,
                &[],
            )
            .await
            .map_err(|e| AppError::Recommendation(format!("candidate retrieval failed: {e:#}")))?;
        let pool_size = candidates.len();

        let ranked = self.rank(&worker, candidates);
        if ranked.is_empty() {
            debug!("No candidates near user {worker_id}");
            return Ok(Vec::new());
        }

        let job_ids: Vec<Uuid> = ranked.iter().map(|s| s.candidate.id).collect();
        let applied = source
            .applied_job_ids(worker_id, &job_ids)
            .await
            .map_err(|e| AppError::Recommendation(format!("application lookup failed: {e:#}")))?;

        info!(
            "Ranked {} of {pool_size} candidates for user {worker_id}",
            ranked.len()
        );

        Ok(ranked
            .into_iter()
            .map(|s| RecommendedJob {
                has_applied: applied.contains(&s.candidate.id),
                job: s.candidate,
                breakdown: s.breakdown,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::criteria::Criterion;
    use crate::recommendation::geo::GeoPoint;
    use crate::recommendation::testing::{
        candidate_at, candidate_located, worker_at, InMemoryCandidateSource,
    };

    fn recommender() -> Recommender {
        Recommender::new(RecommenderConfig {
            search_radius_km: 10.0,
            ..RecommenderConfig::default()
        })
    }

    fn kyiv() -> GeoPoint {
        GeoPoint::new(50.4501, 30.5234).unwrap()
    }

    /// Offsets a point northwards by roughly `meters`.
    fn north_of(point: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint::new(point.latitude + meters / 111_195.0, point.longitude).unwrap()
    }

    #[test]
    fn test_rank_empty_pool() {
        let worker = worker_at(Some(kyiv()), &["plumbing"]);
        assert!(recommender().rank(&worker, vec![]).is_empty());
    }

    #[test]
    fn test_rank_sorts_by_score_descending() {
        let worker = worker_at(Some(kyiv()), &["plumbing"]);
        let weak = candidate_at(9_000.0, 10.0, 1.0, "painting");
        let strong = candidate_at(500.0, 100.0, 5.0, "plumbing");
        let middle = candidate_at(3_000.0, 60.0, 3.0, "plumbing");

        let ranked = recommender().rank(&worker, vec![weak.clone(), strong.clone(), middle.clone()]);

        let ids: Vec<Uuid> = ranked.iter().map(|s| s.candidate.id).collect();
        assert_eq!(ids, vec![strong.id, middle.id, weak.id]);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].breakdown.score >= w[1].breakdown.score));
    }

    #[test]
    fn test_rank_uses_pool_max_salary() {
        let mut worker = worker_at(Some(kyiv()), &[]);
        worker.preference_order = PreferenceOrder::from(vec![Criterion::Salary]);
        let high = candidate_at(100.0, 100.0, 0.0, "a");
        let low = candidate_at(100.0, 50.0, 0.0, "a");

        let ranked = recommender().rank(&worker, vec![low, high]);

        assert_eq!(ranked[0].breakdown.salary_score, 1.0);
        assert_eq!(ranked[1].breakdown.salary_score, 0.5);
        assert_eq!(ranked[0].breakdown.score, 1.0);
    }

    #[test]
    fn test_rank_falls_back_to_default_order() {
        let mut worker = worker_at(Some(kyiv()), &[]);
        worker.preference_order = PreferenceOrder::from_stored(&["unknown"]);
        assert!(worker.preference_order.is_empty());
        let candidate = candidate_at(0.0, 10.0, 5.0, "a");

        let ranked = recommender().rank(&worker, vec![candidate]);
        // distance 1.0*0.4 + salary 1.0*0.3 + category 0 + reputation 1.0*0.1
        assert!((ranked[0].breakdown.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_interests_never_score_categories() {
        let mut worker = worker_at(Some(kyiv()), &[]);
        worker.preference_order = PreferenceOrder::from(vec![Criterion::Categories]);
        let pool = vec![
            candidate_at(10.0, 20.0, 4.0, "plumbing"),
            candidate_at(20.0, 30.0, 2.0, "gardening"),
        ];

        for scored in recommender().rank(&worker, pool) {
            assert_eq!(scored.breakdown.category_score, 0.0);
            assert_eq!(scored.breakdown.score, 0.0);
        }
    }

    #[test]
    fn test_ties_break_by_distance_then_id() {
        let mut worker = worker_at(Some(kyiv()), &[]);
        worker.preference_order = PreferenceOrder::from(vec![Criterion::Reputation]);
        let far = candidate_at(900.0, 10.0, 4.0, "a");
        let near = candidate_at(100.0, 10.0, 4.0, "a");
        let mut twin_a = candidate_at(500.0, 10.0, 4.0, "a");
        let mut twin_b = candidate_at(500.0, 10.0, 4.0, "a");
        twin_a.id = Uuid::from_u128(1);
        twin_b.id = Uuid::from_u128(2);

        let ranked = recommender().rank(
            &worker,
            vec![twin_b.clone(), far.clone(), twin_a.clone(), near.clone()],
        );

        let ids: Vec<Uuid> = ranked.iter().map(|s| s.candidate.id).collect();
        assert_eq!(ids, vec![near.id, twin_a.id, twin_b.id, far.id]);
    }

    #[test]
    fn test_truncates_to_top_thirty() {
        let worker = worker_at(Some(kyiv()), &["a"]);
        let pool: Vec<JobCandidate> = (0..75)
            .map(|i| candidate_at(i as f64 * 100.0, 10.0 + i as f64, (i % 6) as f64, "a"))
            .collect();

        let ranked = recommender().rank(&worker, pool.clone());
        assert_eq!(ranked.len(), 30);

        let mut full = recommender();
        full.config.limit = usize::MAX;
        let everything = full.rank(&worker, pool);
        assert_eq!(everything.len(), 75);
        assert_eq!(ranked.as_slice(), &everything[..30]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let worker = worker_at(Some(kyiv()), &["a", "b"]);
        let pool: Vec<JobCandidate> = (0..40)
            .map(|i| {
                let category = if i % 2 == 0 { "a" } else { "c" };
                candidate_at((i * 37 % 11) as f64 * 500.0, (i % 7) as f64 * 10.0, (i % 5) as f64, category)
            })
            .collect();

        let first = recommender().rank(&worker, pool.clone());
        let second = recommender().rank(&worker, pool);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recommend_without_location_is_empty() {
        let worker = worker_at(None, &["a"]);
        let worker_id = worker.id;
        let source = InMemoryCandidateSource::default()
            .with_worker(worker)
            .with_jobs(vec![candidate_located(kyiv(), 10.0, "a")]);

        let result = recommender().recommend(&source, worker_id).await.unwrap();

        assert!(result.is_empty());
        assert!(source.job_queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_unknown_worker_is_not_found() {
        let source = InMemoryCandidateSource::default();
        let err = recommender()
            .recommend(&source, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recommend_empty_pool_is_empty() {
        let worker = worker_at(Some(kyiv()), &["a"]);
        let worker_id = worker.id;
        let source = InMemoryCandidateSource::default().with_worker(worker);

        let result = recommender().recommend(&source, worker_id).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_recommend_annotates_applied_and_queries_radius() {
        let worker = worker_at(Some(kyiv()), &["a"]);
        let worker_id = worker.id;
        let applied_job = candidate_located(north_of(kyiv(), 1_000.0), 50.0, "a");
        let other_job = candidate_located(north_of(kyiv(), 2_000.0), 40.0, "a");
        let too_far = candidate_located(north_of(kyiv(), 15_000.0), 500.0, "a");

        let source = InMemoryCandidateSource::default()
            .with_worker(worker)
            .with_jobs(vec![applied_job.clone(), other_job.clone(), too_far])
            .with_application(worker_id, applied_job.id);

        let result = recommender().recommend(&source, worker_id).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].job.id, applied_job.id);
        assert!(result[0].has_applied);
        assert!(!result[1].has_applied);
        assert!((result[0].job.distance_m - 1_000.0).abs() < 5.0);
        assert!((result[0].breakdown.distance_score - 0.9).abs() < 1e-3);
        assert_eq!(
            source.job_queries.lock().unwrap().as_slice(),
            &[(10_000.0, 500)]
        );
    }

    #[tokio::test]
    async fn test_recommend_propagates_store_failures() {
        let worker = worker_at(Some(kyiv()), &["a"]);
        let worker_id = worker.id;
        let source = InMemoryCandidateSource {
            fail_jobs: true,
            ..Default::default()
        }
        .with_worker(worker);

        let err = recommender().recommend(&source, worker_id).await.unwrap_err();
        assert!(matches!(err, AppError::Recommendation(_)));
    }

    #[tokio::test]
    async fn test_recommend_fails_when_application_lookup_fails() {
        let worker = worker_at(Some(kyiv()), &["a"]);
        let worker_id = worker.id;
        let source = InMemoryCandidateSource {
            fail_applications: true,
            ..Default::default()
        }
        .with_worker(worker)
        .with_jobs(vec![candidate_located(kyiv(), 10.0, "a")]);

        let err = recommender().recommend(&source, worker_id).await.unwrap_err();
        assert!(matches!(err, AppError::Recommendation(_)));
    }

    #[tokio::test]
    async fn test_recommend_twice_yields_identical_output() {
        let worker = worker_at(Some(kyiv()), &["a"]);
        let worker_id = worker.id;
        let jobs = (1..20)
            .map(|i| {
                let category = if i % 3 == 0 { "a" } else { "b" };
                candidate_located(north_of(kyiv(), i as f64 * 400.0), (i % 4) as f64 * 15.0, category)
            })
            .collect();
        let source = InMemoryCandidateSource::default()
            .with_worker(worker)
            .with_jobs(jobs);

        let first = recommender().recommend(&source, worker_id).await.unwrap();
        let second = recommender().recommend(&source, worker_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_recommended_job_wire_shape() {
        let job = RecommendedJob {
            job: candidate_at(250.0, 20.0, 4.0, "plumbing"),
            has_applied: true,
            breakdown: ScoreBreakdown {
                score: 0.5,
                distance_score: 0.9,
                salary_score: 1.0,
                category_score: 0.0,
                reputation_score: 0.8,
            },
        };
        let json = serde_json::to_value(&job).unwrap();
        for key in [
            "id", "title", "category", "hourRate", "duration", "address", "coordinates",
            "owner", "hasApplied", "images", "distance", "score", "distanceScore",
            "salaryScore", "categoryScore", "reputationScore",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["images"], serde_json::json!([]));
    }
}
