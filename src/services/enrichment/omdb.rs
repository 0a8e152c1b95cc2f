/// OMDb API provider
///
/// Looks titles up with `?t=<title>`, which returns the single best match
/// with both plot and poster.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::{known, DetailsProvider};
use crate::{
    error::{AppError, AppResult},
    models::MovieDetails,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OmdbResponse {
    fn into_details(self) -> MovieDetails {
        if self.response != "True" {
            tracing::debug!(error = ?self.error, provider = "omdb", "Title not found");
            return MovieDetails::default();
        }
        MovieDetails {
            plot: known(self.plot),
            poster: known(self.poster),
        }
    }
}

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl DetailsProvider for OmdbProvider {
    async fn fetch_details(&self, title: &str) -> AppResult<MovieDetails> {
        let url = format!("{}/", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[("t", title), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let body: OmdbResponse = response.json().await?;
        let details = body.into_details();

        tracing::debug!(
            title = %title,
            has_plot = details.plot.is_some(),
            has_poster = details.poster.is_some(),
            provider = "omdb",
            "Details fetched"
        );

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
