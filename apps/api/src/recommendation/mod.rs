// Job recommendations: ranks active jobs near a worker by a weighted convolution of
// distance, salary, category affinity and employer reputation.
// The worker's preference order decides the weights; see weights.rs.

pub mod candidates;
pub mod criteria;
pub mod geo;
pub mod handlers;
pub mod ranking;
pub mod scoring;
pub mod weights;

#[cfg(test)]
pub mod testing;

pub use ranking::{Recommender, RecommenderConfig};
