pub mod enrichment;
pub mod recommender;

pub use enrichment::{DetailsProvider, EnrichmentChain};
pub use recommender::{Recommender, RecommenderContext};
