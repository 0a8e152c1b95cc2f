//! Offline indexing pipeline
//!
//! Turns a tabular movie source into the two artifacts the recommender
//! serves from: the catalog (row order = index) and the dense cosine
//! similarity matrix over TF-IDF features of each movie's genre and
//! description.

use std::path::Path;

use chrono::Utc;

use crate::{error::AppResult, models::Catalog};

pub mod artifacts;
pub mod ingest;
pub mod similarity;
pub mod stopwords;
pub mod tfidf;
pub mod tokenize;

pub use artifacts::{ArtifactPaths, IndexManifest, SimilarityArtifact};
pub use similarity::SimilarityMatrix;
pub use tfidf::{FeatureMatrix, IdfWeighting, TfidfVectorizer};

/// Builds similarity artifacts from a catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct Indexer {
    weighting: IdfWeighting,
}

impl Indexer {
    pub fn new(weighting: IdfWeighting) -> Self {
        Self { weighting }
    }

    /// Vectorizes the catalog and computes its similarity matrix
    pub fn index(&self, catalog: &Catalog) -> AppResult<SimilarityArtifact> {
        let documents = catalog.combined_texts();
        let mut vectorizer = TfidfVectorizer::new(self.weighting);
        let features = vectorizer.fit_transform(&documents)?;
        let matrix = SimilarityMatrix::from_features(&features);

        tracing::info!(
            movies = catalog.len(),
            vocabulary = features.vocabulary_size(),
            weighting = %self.weighting,
            "Similarity matrix computed"
        );

        Ok(SimilarityArtifact {
            manifest: IndexManifest {
                movie_count: matrix.size(),
                vocabulary_size: features.vocabulary_size(),
                idf_weighting: self.weighting,
                built_at: Utc::now(),
                catalog_fingerprint: artifacts::catalog_fingerprint(catalog),
            },
            matrix,
        })
    }

    /// Full pipeline: read the CSV source, index it, persist both artifacts
    ///
    /// Any failure aborts before the artifacts are renamed into place.
    pub fn build(&self, source: &Path, output: &ArtifactPaths) -> AppResult<IndexManifest> {
        let catalog = ingest::read_catalog(source)?;
        let artifact = self.index(&catalog)?;
        artifacts::write_artifacts(output, &catalog, &artifact)?;
        Ok(artifact.manifest)
    }
}
