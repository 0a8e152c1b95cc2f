use serde::{Deserialize, Serialize};

use super::MovieRecord;

/// Ordered movie catalog; a record's position is its index everywhere else
///
/// Titles are matched exactly as stored. Duplicate titles are kept, and
/// lookups resolve to the first occurrence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog {
    movies: Vec<MovieRecord>,
}

impl Catalog {
    pub fn new(movies: Vec<MovieRecord>) -> Self {
        Self { movies }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    /// Index of the first movie whose title equals `title` exactly
    pub fn position(&self, title: &str) -> Option<usize> {
        self.movies.iter().position(|movie| movie.title == title)
    }

    pub fn combined_texts(&self) -> Vec<String> {
        self.movies.iter().map(MovieRecord::combined_text).collect()
    }
}

impl FromIterator<MovieRecord> for Catalog {
    fn from_iter<I: IntoIterator<Item = MovieRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
