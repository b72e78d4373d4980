//! Per-criterion scores and their weighted convolution.
//!
//! Every component lands in [0, 1]:
//! - salary: `hour_rate / max_salary_in_pool`
//! - distance: `max(1 - distance / search_radius, 0)`
//! - categories: 1 when the job category is one the worker is interested in, else 0
//! - reputation: `(rating ?? 0) / 5`
//!
//! The final score is `Σ component × weight`, with a missing weight counting as 0.

use std::collections::HashSet;

use serde::Serialize;

use crate::recommendation::candidates::JobCandidate;
use crate::recommendation::criteria::Criterion;
use crate::recommendation::weights::WeightMap;

pub const MAX_RATING: f64 = 5.0;

/// Four component scores plus their weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub score: f64,
    pub distance_score: f64,
    pub salary_score: f64,
    pub category_score: f64,
    pub reputation_score: f64,
}

/// Highest hourly rate among the candidates, or 1 when there is nothing positive to divide by.
pub fn max_salary_in_pool<I>(rates: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let max = rates
        .into_iter()
        .filter(|r| r.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

pub fn salary_score(hour_rate: f64, max_salary: f64) -> f64 {
    if max_salary <= 0.0 || !hour_rate.is_finite() {
        return 0.0;
    }
    (hour_rate / max_salary).clamp(0.0, 1.0)
}

/// `normalized_distance` is the distance divided by the search radius.
pub fn distance_score(normalized_distance: f64) -> f64 {
    if !normalized_distance.is_finite() {
        return 0.0;
    }
    (1.0 - normalized_distance).clamp(0.0, 1.0)
}

pub fn category_score(category: &str, interested: &HashSet<String>) -> f64 {
    if interested.contains(category) {
        1.0
    } else {
        0.0
    }
}

pub fn reputation_score(rating: Option<f64>) -> f64 {
    let rating = rating.filter(|r| r.is_finite()).unwrap_or(0.0);
    rating.clamp(0.0, MAX_RATING) / MAX_RATING
}

/// Weighted sum of the component scores.
pub fn convolve(
    distance: f64,
    salary: f64,
    category: f64,
    reputation: f64,
    weights: &WeightMap,
) -> f64 {
    distance * weights.get(Criterion::Distance)
        + salary * weights.get(Criterion::Salary)
        + category * weights.get(Criterion::Categories)
        + reputation * weights.get(Criterion::Reputation)
}

/// Request-scoped aggregates shared by every candidate in one ranking pass.
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    pub weights: WeightMap,
    pub max_salary: f64,
    pub search_radius_m: f64,
    pub interested_categories: &'a HashSet<String>,
}

impl ScoringContext<'_> {
    pub fn normalize_distance(&self, distance_m: f64) -> f64 {
        if self.search_radius_m > 0.0 {
            distance_m / self.search_radius_m
        } else {
            f64::INFINITY
        }
    }

    pub fn score(&self, candidate: &JobCandidate) -> ScoreBreakdown {
        let distance_score = distance_score(self.normalize_distance(candidate.distance_m));
        let salary_score = salary_score(candidate.hour_rate, self.max_salary);
        let category_score = category_score(&candidate.category, self.interested_categories);
        let reputation_score = reputation_score(candidate.owner.rating);

        ScoreBreakdown {
            score: convolve(
                distance_score,
                salary_score,
                category_score,
                reputation_score,
                &self.weights,
            ),
            distance_score,
            salary_score,
            category_score,
            reputation_score,
        }
    }
}
