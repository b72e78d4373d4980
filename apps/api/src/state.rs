use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::recommendation::candidates::{CandidateSource, PgCandidateSource};
use crate::recommendation::Recommender;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Where recommendation inputs come from. Default: PgCandidateSource over `db`.
    pub candidates: Arc<dyn CandidateSource>,
    pub recommender: Recommender,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let candidates = Arc::new(PgCandidateSource::new(db.clone()));
        Self::with_candidates(db, config, candidates)
    }

    pub fn with_candidates(
        db: PgPool,
        config: Config,
        candidates: Arc<dyn CandidateSource>,
    ) -> Self {
        let recommender = Recommender::new(config.recommender.clone());
        Self {
            db,
            config,
            candidates,
            recommender,
        }
    }
}
