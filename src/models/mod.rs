pub mod catalog;
pub mod movie;

pub use catalog::Catalog;
pub use movie::{EnrichedMovie, MovieDetails, MovieRecord, MovieSummary, ScoredMovie};
