/// TMDB search provider
///
/// Uses `/3/search/movie` and takes the first result. Poster paths are
/// relative and get joined onto the configured image base URL.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::{known, DetailsProvider};
use crate::{
    error::{AppError, AppResult},
    models::MovieDetails,
};

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    overview: Option<String>,
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, image_base: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            image_base,
        }
    }

    fn details_from_search(&self, search: TmdbSearchResponse) -> MovieDetails {
        let Some(first) = search.results.into_iter().next() else {
            return MovieDetails::default();
        };
        MovieDetails {
            plot: known(first.overview),
            poster: known(first.poster_path).map(|path| {
                format!("{}{}", self.image_base.trim_end_matches('/'), path)
            }),
        }
    }
}

#[async_trait::async_trait]
impl DetailsProvider for TmdbProvider {
    async fn fetch_details(&self, title: &str) -> AppResult<MovieDetails> {
        let url = format!("{}/3/search/movie", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        let details = self.details_from_search(search);

        tracing::debug!(
            title = %title,
            has_plot = details.plot.is_some(),
            has_poster = details.poster.is_some(),
            provider = "tmdb",
            "Details fetched"
        );

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TmdbProvider {
        TmdbProvider::new(
            "test_key".to_string(),
            "http://test.local".to_string(),
            "https://image.tmdb.org/t/p/w500".to_string(),
        )
    }

    #[test]
    fn test_first_result_poster_is_absolute() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 27205, "title": "Inception", "poster_path": "/inception.jpg", "overview": "Dreams within dreams."},
                {"id": 1, "title": "Other", "poster_path": "/other.jpg", "overview": "Other."}
            ]
        }"#;

        let search: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        let details = provider().details_from_search(search);
        assert_eq!(
            details.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/inception.jpg")
        );
        assert_eq!(details.plot.as_deref(), Some("Dreams within dreams."));
    }

    #[test]
    fn test_null_poster_path() {
        let json = r#"{"results": [{"poster_path": null, "overview": ""}]}"#;
        let search: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        let details = provider().details_from_search(search);
        assert_eq!(details, MovieDetails::default());
    }

    #[test]
    fn test_no_results() {
        let search: TmdbSearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(provider().details_from_search(search), MovieDetails::default());
    }
}
