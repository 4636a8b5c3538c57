use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{RecommendationPage, ScoredGrant, UserId};
use super::engine::{RankRequest, RecommendError, RecommendationEngine};
use super::providers::{GrantCatalog, PreferenceStore, SimilarityProvider};

/// Router builder exposing the ranking endpoint.
pub fn recommendation_router<P, C, S>(engine: Arc<RecommendationEngine<P, C, S>>) -> Router
where
    P: PreferenceStore + 'static,
    C: GrantCatalog + 'static,
    S: SimilarityProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/recommendations",
            get(recommendations_handler::<P, C, S>),
        )
        .with_state(engine)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecommendationQuery {
    pub(crate) limit: Option<usize>,
    pub(crate) offset: Option<usize>,
    pub(crate) min_score: Option<f64>,
    pub(crate) exclude_overdue: Option<bool>,
    /// As-of date override (YYYY-MM-DD) for previewing future rankings.
    pub(crate) today: Option<chrono::NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecommendationResponse {
    pub(crate) grants: Vec<ScoredGrant>,
    pub(crate) total: usize,
    pub(crate) limit: usize,
    pub(crate) offset: usize,
}

pub(crate) async fn recommendations_handler<P, C, S>(
    State(engine): State<Arc<RecommendationEngine<P, C, S>>>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> Response
where
    P: PreferenceStore + 'static,
    C: GrantCatalog + 'static,
    S: SimilarityProvider + 'static,
{
    let mut request = RankRequest::new(UserId(user_id), engine.config());
    if let Some(limit) = query.limit {
        request.limit = limit;
    }
    if let Some(offset) = query.offset {
        request.offset = offset;
    }
    if let Some(min_score) = query.min_score {
        request.min_score = min_score;
    }
    if let Some(exclude_overdue) = query.exclude_overdue {
        request.exclude_overdue = exclude_overdue;
    }
    request.today = query.today;

    match engine.rank(&request) {
        Ok(RecommendationPage { grants, total }) => {
            let body = RecommendationResponse {
                grants,
                total,
                limit: request.limit,
                offset: request.offset,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(err @ RecommendError::PreferencesNotFound(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err @ RecommendError::InvalidRequest(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(err @ (RecommendError::Preferences(_) | RecommendError::Catalog(_))) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}
