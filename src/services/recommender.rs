use std::path::Path;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    index::{
        artifacts::{catalog_fingerprint, read_catalog_artifact, read_similarity_artifact},
        ArtifactPaths, IndexManifest, SimilarityMatrix,
    },
    models::{Catalog, MovieSummary, ScoredMovie},
};

/// Number of neighbours returned per query, and the most a limit may be set to
pub const DEFAULT_LIMIT: usize = 10;

/// Immutable artifacts the recommender answers queries from
///
/// Constructed once through [`RecommenderContext::load`] or
/// [`RecommenderContext::new`], both of which refuse mismatched artifacts.
#[derive(Debug)]
pub struct RecommenderContext {
    catalog: Catalog,
    matrix: SimilarityMatrix,
    manifest: Option<IndexManifest>,
}

impl RecommenderContext {
    pub fn new(catalog: Catalog, matrix: SimilarityMatrix) -> AppResult<Self> {
        Self::validated(catalog, matrix, None)
    }

    /// Loads both artifacts from disk and validates that they belong together
    pub fn load(paths: &ArtifactPaths) -> AppResult<Self> {
        let catalog = read_catalog_artifact(&paths.catalog)?;
        let artifact = read_similarity_artifact(&paths.similarity)?;
        let context = Self::validated(catalog, artifact.matrix, Some(artifact.manifest))?;

        tracing::info!(
            catalog = %paths.catalog.display(),
            similarity = %paths.similarity.display(),
            movies = context.catalog.len(),
            "Recommender artifacts loaded"
        );

        Ok(context)
    }

    pub fn load_from(catalog: &Path, similarity: &Path) -> AppResult<Self> {
        Self::load(&ArtifactPaths::new(catalog, similarity))
    }

    fn validated(
        catalog: Catalog,
        matrix: SimilarityMatrix,
        manifest: Option<IndexManifest>,
    ) -> AppResult<Self> {
        matrix.validate()?;
        if catalog.len() != matrix.size() {
            return Err(AppError::ArtifactMismatch(format!(
                "catalog has {} movies but similarity matrix is {}×{}",
                catalog.len(),
                matrix.size(),
                matrix.size()
            )));
        }
        if let Some(manifest) = &manifest {
            if manifest.catalog_fingerprint != catalog_fingerprint(&catalog) {
                return Err(AppError::ArtifactMismatch(
                    "similarity matrix was built from a different catalog".to_string(),
                ));
            }
        }
        Ok(Self {
            catalog,
            matrix,
            manifest,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    /// Build metadata, present when loaded from disk
    pub fn manifest(&self) -> Option<&IndexManifest> {
        self.manifest.as_ref()
    }
}

/// Content-based nearest-neighbour recommender over a precomputed matrix
///
/// Queries are read-only; clones share the same context.
#[derive(Debug, Clone)]
pub struct Recommender {
    context: Arc<RecommenderContext>,
    limit: usize,
}

impl Recommender {
    pub fn new(context: RecommenderContext) -> Self {
        Self {
            context: Arc::new(context),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Recommender returning at most `limit` neighbours, `1..=DEFAULT_LIMIT`
    pub fn with_limit(context: RecommenderContext, limit: usize) -> AppResult<Self> {
        if !(1..=DEFAULT_LIMIT).contains(&limit) {
            return Err(AppError::InvalidInput(format!(
                "recommendation limit must be between 1 and {}, got {}",
                DEFAULT_LIMIT, limit
            )));
        }
        Ok(Self {
            context: Arc::new(context),
            limit,
        })
    }

    pub fn context(&self) -> &RecommenderContext {
        &self.context
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn catalog_len(&self) -> usize {
        self.context.catalog.len()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.context.catalog.position(title).is_some()
    }

    /// Movies most similar to `title`, best first
    ///
    /// Returns an empty list when the title is not in the catalog.
    pub fn recommend(&self, title: &str) -> Vec<MovieSummary> {
        self.recommend_scored(title)
            .map(|ranked| ranked.iter().map(MovieSummary::from).collect())
            .unwrap_or_default()
    }

    /// Ranked neighbours with their similarity scores; `None` if `title` is absent
    ///
    /// Scores are sorted descending with ties kept in catalog order. The query's
    /// own row is skipped by index, so duplicates of the title can still appear.
    pub fn recommend_scored(&self, title: &str) -> Option<Vec<ScoredMovie>> {
        let catalog = &self.context.catalog;
        let query = catalog.position(title)?;
        let distances = self.context.matrix.row(query)?;

        let mut ranked: Vec<(usize, f64)> = distances
            .iter()
            .copied()
            .enumerate()
            .filter(|(index, _)| *index != query)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let results: Vec<ScoredMovie> = ranked
            .into_iter()
            .take(self.limit)
            .filter_map(|(index, score)| {
                catalog.get(index).map(|movie| ScoredMovie {
                    index,
                    title: movie.title.clone(),
                    genre: movie.genre.clone(),
                    score,
                })
            })
            .collect();

        tracing::debug!(
            title = %title,
            index = query,
            results = results.len(),
            "Recommendations ranked"
        );

        Some(results)
    }
}
