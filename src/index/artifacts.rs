use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{similarity::SimilarityMatrix, tfidf::IdfWeighting};
use crate::{
    error::{AppError, AppResult},
    models::Catalog,
};

pub const CATALOG_FILE: &str = "movies.json";
pub const SIMILARITY_FILE: &str = "similarity.json";

/// Build metadata stored alongside the similarity matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    pub movie_count: usize,
    pub vocabulary_size: usize,
    pub idf_weighting: IdfWeighting,
    pub built_at: DateTime<Utc>,
    /// BLAKE3 digest of the catalog the matrix was computed from
    pub catalog_fingerprint: String,
}

/// Contents of `similarity.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityArtifact {
    pub manifest: IndexManifest,
    pub matrix: SimilarityMatrix,
}

/// Locations of the two artifacts that are always written and loaded together
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub catalog: PathBuf,
    pub similarity: PathBuf,
}

impl ArtifactPaths {
    pub fn new(catalog: impl Into<PathBuf>, similarity: impl Into<PathBuf>) -> Self {
        Self {
            catalog: catalog.into(),
            similarity: similarity.into(),
        }
    }

    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(CATALOG_FILE), dir.join(SIMILARITY_FILE))
    }
}

/// Content hash over every record, field by field
///
/// Fields are length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
pub fn catalog_fingerprint(catalog: &Catalog) -> String {
    let mut hasher = blake3::Hasher::new();
    for movie in catalog.movies() {
        for field in [&movie.title, &movie.genre, &movie.description] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Persists the catalog and similarity artifacts
///
/// Both files are staged next to their targets and only renamed into place
/// after both writes succeed. On failure the staged files are removed and
/// existing artifacts are left untouched.
pub fn write_artifacts(
    paths: &ArtifactPaths,
    catalog: &Catalog,
    artifact: &SimilarityArtifact,
) -> AppResult<()> {
    if catalog.len() != artifact.matrix.size() {
        return Err(AppError::ArtifactMismatch(format!(
            "refusing to write {} catalog rows with a {}×{} similarity matrix",
            catalog.len(),
            artifact.matrix.size(),
            artifact.matrix.size()
        )));
    }
    if catalog_fingerprint(catalog) != artifact.manifest.catalog_fingerprint {
        return Err(AppError::ArtifactMismatch(
            "similarity matrix was computed from a different catalog".to_string(),
        ));
    }

    let staged_catalog = staging_path(&paths.catalog);
    let staged_similarity = staging_path(&paths.similarity);

    let staged = write_json(&staged_catalog, catalog)
        .and_then(|_| write_json(&staged_similarity, artifact));
    if let Err(e) = staged {
        let _ = fs::remove_file(&staged_catalog);
        let _ = fs::remove_file(&staged_similarity);
        tracing::error!(error = %e, "Failed to stage artifacts");
        return Err(e);
    }

    let renamed = fs::rename(&staged_catalog, &paths.catalog)
        .and_then(|_| fs::rename(&staged_similarity, &paths.similarity));
    if let Err(e) = renamed {
        let _ = fs::remove_file(&staged_catalog);
        let _ = fs::remove_file(&staged_similarity);
        tracing::error!(error = %e, "Failed to move artifacts into place");
        return Err(e.into());
    }

    tracing::info!(
        catalog = %paths.catalog.display(),
        similarity = %paths.similarity.display(),
        movies = catalog.len(),
        "Artifacts written"
    );

    Ok(())
}

pub fn read_catalog_artifact(path: &Path) -> AppResult<Catalog> {
    read_json(path)
}

/// Loads `similarity.json` and checks the matrix shape against its manifest
pub fn read_similarity_artifact(path: &Path) -> AppResult<SimilarityArtifact> {
    let artifact: SimilarityArtifact = read_json(path)?;
    artifact.matrix.validate()?;
    if artifact.manifest.movie_count != artifact.matrix.size() {
        return Err(AppError::ArtifactMismatch(format!(
            "manifest lists {} movies but matrix is {}×{}",
            artifact.manifest.movie_count,
            artifact.matrix.size(),
            artifact.matrix.size()
        )));
    }
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieRecord;

    fn sample() -> (Catalog, SimilarityArtifact) {
        let catalog = Catalog::new(vec![
            MovieRecord::new("Alpha", "Action", "A hero saves the city"),
            MovieRecord::new("Beta", "Action", "A hero defends a town"),
        ]);
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.4], vec![0.4, 1.0]]).unwrap();
        let artifact = SimilarityArtifact {
            manifest: IndexManifest {
                movie_count: 2,
                vocabulary_size: 6,
                idf_weighting: IdfWeighting::Standard,
                built_at: Utc::now(),
                catalog_fingerprint: catalog_fingerprint(&catalog),
            },
            matrix,
        };
        (catalog, artifact)
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let (catalog, artifact) = sample();

        write_artifacts(&paths, &catalog, &artifact).unwrap();

        assert_eq!(read_catalog_artifact(&paths.catalog).unwrap(), catalog);
        assert_eq!(read_similarity_artifact(&paths.similarity).unwrap(), artifact);
        assert!(!staging_path(&paths.catalog).exists());
        assert!(!staging_path(&paths.similarity).exists());
    }

    #[test]
    fn test_write_rejects_mismatched_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let (mut catalog, artifact) = sample();
        catalog = Catalog::new(catalog.movies()[..1].to_vec());

        let result = write_artifacts(&paths, &catalog, &artifact);
        assert!(matches!(result, Err(AppError::ArtifactMismatch(_))));
        assert!(!paths.catalog.exists());
        assert!(!paths.similarity.exists());
    }

    #[test]
    fn test_manifest_count_must_match_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SIMILARITY_FILE);
        let (_, mut artifact) = sample();
        artifact.manifest.movie_count = 3;
        write_json(&path, &artifact).unwrap();

        assert!(matches!(
            read_similarity_artifact(&path),
            Err(AppError::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn test_write_rejects_matrix_from_other_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let (_, artifact) = sample();
        let other = Catalog::new(vec![
            MovieRecord::new("X", "Horror", "A ghost haunts a house"),
            MovieRecord::new("Y", "Romance", "Two strangers fall in love"),
        ]);

        let result = write_artifacts(&paths, &other, &artifact);
        assert!(matches!(result, Err(AppError::ArtifactMismatch(_))));
        assert!(!paths.catalog.exists());
    }

    #[test]
    fn test_fingerprint_tracks_content_and_order() {
        let (catalog, _) = sample();
        let reversed: Catalog = catalog.movies().iter().rev().cloned().collect();
        let shifted = Catalog::new(vec![
            MovieRecord::new("Alph", "aAction", "A hero saves the city"),
            catalog.movies()[1].clone(),
        ]);

        assert_eq!(catalog_fingerprint(&catalog), catalog_fingerprint(&catalog.clone()));
        assert_ne!(catalog_fingerprint(&catalog), catalog_fingerprint(&reversed));
        assert_ne!(catalog_fingerprint(&catalog), catalog_fingerprint(&shifted));
    }

    #[test]
    fn test_failed_rename_leaves_no_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        // A non-empty directory at the target path makes the rename fail
        fs::create_dir_all(paths.similarity.join("occupied")).unwrap();
        let (catalog, artifact) = sample();

        let result = write_artifacts(&paths, &catalog, &artifact);
        assert!(matches!(result, Err(AppError::Io(_))));
        assert!(!staging_path(&paths.catalog).exists());
        assert!(!staging_path(&paths.similarity).exists());
    }

    #[test]
    fn test_scores_survive_round_trip_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let (catalog, mut artifact) = sample();
        let score = 0.1f64 + 0.2;
        artifact.matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, score],
            vec![score, 1.0],
        ])
        .unwrap();

        write_artifacts(&paths, &catalog, &artifact).unwrap();
        let loaded = read_similarity_artifact(&paths.similarity).unwrap();
        assert_eq!(loaded.matrix.get(0, 1).unwrap().to_bits(), score.to_bits());
    }

    #[test]
    fn test_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path().join("nested").join("out"));
        let (catalog, artifact) = sample();

        write_artifacts(&paths, &catalog, &artifact).unwrap();
        assert!(paths.catalog.exists());
    }
}
