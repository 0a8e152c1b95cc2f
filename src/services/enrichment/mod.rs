//! Plot and poster enrichment for recommendation results
//!
//! Providers are consulted in order until both fields are known. Every
//! provider call is bounded by a timeout, and failures degrade to a blank
//! plot and a placeholder poster instead of surfacing as errors.

use crate::{error::AppResult, models::MovieDetails};

pub mod chain;
pub mod omdb;
pub mod tmdb;

pub use chain::EnrichmentChain;
pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;

/// External source of movie plot and poster data
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DetailsProvider: Send + Sync {
    /// Look up details by title
    ///
    /// Fields the provider does not know are returned as `None`; an `Err` is
    /// reserved for transport or protocol failures.
    async fn fetch_details(&self, title: &str) -> AppResult<MovieDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Treats provider sentinel values for "unknown" as absent
pub(crate) fn known(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && v != "N/A")
}
