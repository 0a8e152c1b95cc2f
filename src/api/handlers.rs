use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    index::IdfWeighting,
    models::{EnrichedMovie, ScoredMovie},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Absent and blank titles are both rejected by `required_title`
    #[serde(default)]
    pub title: String,
    /// `false` skips the external plot/poster lookups
    #[serde(default)]
    pub enrich: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub title: String,
    pub found: bool,
    pub recommendations: Vec<EnrichedMovie>,
}

#[derive(Debug, Serialize)]
pub struct ScoredResponse {
    pub title: String,
    pub found: bool,
    pub recommendations: Vec<ScoredMovie>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub movie_count: usize,
    pub recommendation_limit: usize,
    pub vocabulary_size: Option<usize>,
    pub idf_weighting: Option<IdfWeighting>,
    pub built_at: Option<DateTime<Utc>>,
    pub enrichment_providers: Vec<&'static str>,
}

fn required_title(raw: &str) -> AppResult<&str> {
    if raw.trim().is_empty() {
        return Err(AppError::InvalidInput("title is required".to_string()));
    }
    Ok(raw)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Catalog and index metadata
pub async fn get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let context = state.recommender.context();
    let manifest = context.manifest();

    Json(CatalogResponse {
        movie_count: state.recommender.catalog_len(),
        recommendation_limit: state.recommender.limit(),
        vocabulary_size: manifest.map(|m| m.vocabulary_size),
        idf_weighting: manifest.map(|m| m.idf_weighting),
        built_at: manifest.map(|m| m.built_at),
        enrichment_providers: state.enrichment.provider_names(),
    })
}

/// Recommendations for an exact catalog title, enriched with plot and poster
///
/// Ranking finishes before any provider is contacted; an unknown title is a
/// normal `found: false` response.
pub async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let title = required_title(&params.title)?;

    if !state.recommender.contains(title) {
        tracing::info!(title = %title, "Movie not found in catalog");
        return Ok(Json(RecommendationResponse {
            title: title.to_string(),
            found: false,
            recommendations: Vec::new(),
        }));
    }

    let summaries = state.recommender.recommend(title);

    let recommendations = if params.enrich.unwrap_or(true) {
        state.enrichment.enrich_all(summaries).await
    } else {
        summaries
            .into_iter()
            .map(|s| EnrichedMovie {
                title: s.title,
                genre: s.genre,
                plot: String::new(),
                poster: String::new(),
            })
            .collect()
    };

    tracing::info!(
        title = %title,
        results = recommendations.len(),
        "Recommendations served"
    );

    Ok(Json(RecommendationResponse {
        title: title.to_string(),
        found: true,
        recommendations,
    }))
}

/// Ranked neighbours with raw similarity scores, no enrichment
pub async fn recommend_scored(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<ScoredResponse>> {
    let title = required_title(&params.title)?;
    let ranked = state.recommender.recommend_scored(title);

    Ok(Json(ScoredResponse {
        title: title.to_string(),
        found: ranked.is_some(),
        recommendations: ranked.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_title_rejects_blank() {
        assert!(matches!(
            required_title("   "),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_required_title_keeps_exact_value() {
        // No trimming: lookups are exact
        assert_eq!(required_title(" Heat").unwrap(), " Heat");
    }
}
