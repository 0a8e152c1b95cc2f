use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    index::ArtifactPaths,
    services::{EnrichmentChain, Recommender, RecommenderContext},
};

/// Shared application state
///
/// Everything here is read-only after startup, so handlers share it without locks.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
    pub enrichment: Arc<EnrichmentChain>,
}

impl AppState {
    pub fn new(recommender: Recommender, enrichment: EnrichmentChain) -> Self {
        Self {
            recommender,
            enrichment: Arc::new(enrichment),
        }
    }

    /// Loads and validates the artifacts named in `config`; fails instead of serving bad data
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let paths = ArtifactPaths::new(&config.catalog_path, &config.similarity_path);
        let context = RecommenderContext::load(&paths)?;
        let recommender = Recommender::with_limit(context, config.recommendation_limit)?;
        Ok(Self::new(recommender, EnrichmentChain::from_config(config)))
    }
}
