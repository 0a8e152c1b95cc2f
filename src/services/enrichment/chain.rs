use std::sync::Arc;
use std::time::Duration;

use super::{DetailsProvider, OmdbProvider, TmdbProvider};
use crate::{
    config::Config,
    models::{EnrichedMovie, MovieDetails, MovieSummary},
};

/// Ordered fallback chain of details providers
#[derive(Clone)]
pub struct EnrichmentChain {
    providers: Vec<Arc<dyn DetailsProvider>>,
    timeout: Duration,
    placeholder_poster: String,
}

impl EnrichmentChain {
    pub fn new(timeout: Duration, placeholder_poster: impl Into<String>) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
            placeholder_poster: placeholder_poster.into(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn DetailsProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// OMDb first, then TMDB, each only when its API key is configured
    pub fn from_config(config: &Config) -> Self {
        let mut chain = Self::new(
            Duration::from_millis(config.enrichment_timeout_ms),
            config.placeholder_poster_url.clone(),
        );

        if let Some(key) = &config.omdb_api_key {
            chain = chain.with_provider(Arc::new(OmdbProvider::new(
                key.clone(),
                config.omdb_api_url.clone(),
            )));
        }
        if let Some(key) = &config.tmdb_api_key {
            chain = chain.with_provider(Arc::new(TmdbProvider::new(
                key.clone(),
                config.tmdb_api_url.clone(),
                config.tmdb_image_base.clone(),
            )));
        }

        if chain.providers.is_empty() {
            tracing::warn!("No details provider configured; posters will use the placeholder");
        }

        chain
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Collects whatever the providers know about `title`, never failing
    pub async fn details(&self, title: &str) -> MovieDetails {
        let mut details = MovieDetails::default();

        for provider in &self.providers {
            if details.is_complete() {
                break;
            }

            match tokio::time::timeout(self.timeout, provider.fetch_details(title)).await {
                Ok(Ok(found)) => details.merge_missing(found),
                Ok(Err(e)) => {
                    tracing::warn!(
                        title = %title,
                        provider = provider.name(),
                        error = %e,
                        "Details lookup failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        title = %title,
                        provider = provider.name(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Details lookup timed out"
                    );
                }
            }
        }

        details
    }

    /// Enriches one recommendation, filling gaps with the blank plot and placeholder poster
    pub async fn enrich(&self, summary: &MovieSummary) -> EnrichedMovie {
        let details = self.details(&summary.title).await;
        self.finish(summary, details)
    }

    /// Enriches all recommendations concurrently, preserving their order
    pub async fn enrich_all(&self, summaries: Vec<MovieSummary>) -> Vec<EnrichedMovie> {
        let mut tasks = Vec::with_capacity(summaries.len());

        for summary in &summaries {
            let chain = self.clone();
            let title = summary.title.clone();
            tasks.push(tokio::spawn(async move { chain.details(&title).await }));
        }

        let mut enriched = Vec::with_capacity(summaries.len());
        for (summary, task) in summaries.iter().zip(tasks) {
            let details = match task.await {
                Ok(details) => details,
                Err(e) => {
                    tracing::error!(error = %e, title = %summary.title, "Enrichment task join error");
                    MovieDetails::default()
                }
            };
            enriched.push(self.finish(summary, details));
        }

        enriched
    }

    fn finish(&self, summary: &MovieSummary, details: MovieDetails) -> EnrichedMovie {
        EnrichedMovie {
            title: summary.title.clone(),
            genre: summary.genre.clone(),
            plot: details.plot.unwrap_or_default(),
            poster: details
                .poster
                .unwrap_or_else(|| self.placeholder_poster.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::enrichment::MockDetailsProvider;

    const PLACEHOLDER: &str = "https://example.test/placeholder.png";

    fn summary(title: &str) -> MovieSummary {
        MovieSummary {
            title: title.to_string(),
            genre: "Drama".to_string(),
        }
    }

    fn provider_returning(name: &'static str, details: MovieDetails) -> MockDetailsProvider {
        let mut mock = MockDetailsProvider::new();
        mock.expect_fetch_details()
            .returning(move |_| Ok(details.clone()));
        mock.expect_name().return_const(name);
        mock
    }

    fn chain() -> EnrichmentChain {
        EnrichmentChain::new(Duration::from_millis(200), PLACEHOLDER)
    }

    #[tokio::test]
    async fn test_first_provider_complete_skips_the_rest() {
        let first = provider_returning(
            "first",
            MovieDetails {
                plot: Some("Plot".to_string()),
                poster: Some("poster.jpg".to_string()),
            },
        );
        let mut second = MockDetailsProvider::new();
        second.expect_fetch_details().never();
        second.expect_name().return_const("second");

        let chain = chain()
            .with_provider(Arc::new(first))
            .with_provider(Arc::new(second));

        let movie = chain.enrich(&summary("Inception")).await;
        assert_eq!(movie.plot, "Plot");
        assert_eq!(movie.poster, "poster.jpg");
    }

    #[tokio::test]
    async fn test_fallback_fills_missing_poster_only() {
        let first = provider_returning(
            "first",
            MovieDetails {
                plot: Some("Original plot".to_string()),
                poster: None,
            },
        );
        let second = provider_returning(
            "second",
            MovieDetails {
                plot: Some("Fallback plot".to_string()),
                poster: Some("fallback.jpg".to_string()),
            },
        );

        let chain = chain()
            .with_provider(Arc::new(first))
            .with_provider(Arc::new(second));

        let movie = chain.enrich(&summary("Inception")).await;
        assert_eq!(movie.plot, "Original plot");
        assert_eq!(movie.poster, "fallback.jpg");
    }

    #[tokio::test]
    async fn test_errors_degrade_to_placeholder() {
        let mut failing = MockDetailsProvider::new();
        failing
            .expect_fetch_details()
            .returning(|_| Err(AppError::ExternalApi("boom".to_string())));
        failing.expect_name().return_const("failing");

        let chain = chain().with_provider(Arc::new(failing));
        let movie = chain.enrich(&summary("Inception")).await;

        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.genre, "Drama");
        assert_eq!(movie.plot, "");
        assert_eq!(movie.poster, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_no_providers_uses_placeholder() {
        let movie = chain().enrich(&summary("Anything")).await;
        assert_eq!(movie.poster, PLACEHOLDER);
        assert!(movie.plot.is_empty());
    }

    struct SlowProvider;

    #[async_trait::async_trait]
    impl DetailsProvider for SlowProvider {
        async fn fetch_details(&self, _title: &str) -> crate::error::AppResult<MovieDetails> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(MovieDetails {
                plot: Some("Too late".to_string()),
                poster: Some("late.jpg".to_string()),
            })
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_timeout_moves_on_to_next_provider() {
        let fast = provider_returning(
            "fast",
            MovieDetails {
                plot: None,
                poster: Some("fast.jpg".to_string()),
            },
        );
        let chain = EnrichmentChain::new(Duration::from_millis(20), PLACEHOLDER)
            .with_provider(Arc::new(SlowProvider))
            .with_provider(Arc::new(fast));

        let movie = chain.enrich(&summary("Inception")).await;
        assert_eq!(movie.poster, "fast.jpg");
        assert_eq!(movie.plot, "");
    }

    #[tokio::test]
    async fn test_enrich_all_preserves_order() {
        let mut provider = MockDetailsProvider::new();
        provider.expect_fetch_details().returning(|title| {
            Ok(MovieDetails {
                plot: Some(format!("About {title}")),
                poster: None,
            })
        });
        provider.expect_name().return_const("echo");

        let chain = chain().with_provider(Arc::new(provider));
        let movies = chain
            .enrich_all(vec![summary("One"), summary("Two"), summary("Three")])
            .await;

        let plots: Vec<&str> = movies.iter().map(|m| m.plot.as_str()).collect();
        assert_eq!(plots, vec!["About One", "About Two", "About Three"]);
        assert!(movies.iter().all(|m| m.poster == PLACEHOLDER));
    }

    #[test]
    fn test_from_config_skips_unconfigured_providers() {
        let mut config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert!(EnrichmentChain::from_config(&config).provider_names().is_empty());

        config.tmdb_api_key = Some("key".to_string());
        assert_eq!(
            EnrichmentChain::from_config(&config).provider_names(),
            vec!["tmdb"]
        );

        config.omdb_api_key = Some("key".to_string());
        assert_eq!(
            EnrichmentChain::from_config(&config).provider_names(),
            vec!["omdb", "tmdb"]
        );
    }
}
