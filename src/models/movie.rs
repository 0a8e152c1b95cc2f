use serde::{Deserialize, Serialize};

/// One row of the movie catalog
///
/// The row's position in the catalog is its stable index; the similarity
/// matrix is addressed by the same index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieRecord {
    pub title: String,
    pub genre: String,
    pub description: String,
}

impl MovieRecord {
    pub fn new(
        title: impl Into<String>,
        genre: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            genre: genre.into(),
            description: description.into(),
        }
    }

    /// Text fed to the vectorizer: genre and description joined by a space
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.genre, self.description)
    }
}

/// Minimal recommendation result handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieSummary {
    pub title: String,
    pub genre: String,
}

impl From<&MovieRecord> for MovieSummary {
    fn from(record: &MovieRecord) -> Self {
        Self {
            title: record.title.clone(),
            genre: record.genre.clone(),
        }
    }
}

/// A ranked neighbour together with its catalog index and similarity score
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredMovie {
    pub index: usize,
    pub title: String,
    pub genre: String,
    pub score: f64,
}

impl From<&ScoredMovie> for MovieSummary {
    fn from(scored: &ScoredMovie) -> Self {
        Self {
            title: scored.title.clone(),
            genre: scored.genre.clone(),
        }
    }
}

/// Plot and poster fetched from an external details provider
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieDetails {
    pub plot: Option<String>,
    pub poster: Option<String>,
}

impl MovieDetails {
    pub fn is_complete(&self) -> bool {
        self.plot.is_some() && self.poster.is_some()
    }

    /// Fill in fields that are still missing from `other`, keeping existing values
    pub fn merge_missing(&mut self, other: MovieDetails) {
        if self.plot.is_none() {
            self.plot = other.plot;
        }
        if self.poster.is_none() {
            self.poster = other.poster;
        }
    }
}

/// Recommendation enriched with plot and poster for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichedMovie {
    pub title: String,
    pub genre: String,
    pub plot: String,
    pub poster: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text() {
        let movie = MovieRecord::new("Alpha", "Action", "A hero saves the city");
        assert_eq!(movie.combined_text(), "Action A hero saves the city");
    }

    #[test]
    fn test_merge_missing_keeps_existing_values() {
        let mut details = MovieDetails {
            plot: Some("First plot".to_string()),
            poster: None,
        };
        details.merge_missing(MovieDetails {
            plot: Some("Second plot".to_string()),
            poster: Some("poster.jpg".to_string()),
        });

        assert_eq!(details.plot.as_deref(), Some("First plot"));
        assert_eq!(details.poster.as_deref(), Some("poster.jpg"));
        assert!(details.is_complete());
    }

    #[test]
    fn test_catalog_row_serialization() {
        let movie = MovieRecord::new("Gamma", "Comedy", "A clown tells jokes");
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["title"], "Gamma");
        assert_eq!(json["description"], "A clown tells jokes");
    }
}
