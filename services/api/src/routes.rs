use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use grantmatch::recommendation::{
    recommendation_router, GrantCatalog, PreferenceStore, RecommendationEngine, SimilarityProvider,
};

pub(crate) fn with_recommendation_routes<P, C, S>(
    engine: Arc<RecommendationEngine<P, C, S>>,
) -> axum::Router
where
    P: PreferenceStore + 'static,
    C: GrantCatalog + 'static,
    S: SimilarityProvider + 'static,
{
    recommendation_router(engine)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::infra::{
        seed_sample_data, InMemoryEmbeddingIndex, InMemoryGrantCatalog, InMemoryPreferenceStore,
        DEMO_USER,
    };
    use grantmatch::config::EngineConfig;
    use grantmatch::recommendation::RecommendationEngine;

    fn sample_app() -> axum::Router {
        let store = Arc::new(InMemoryPreferenceStore::default());
        let catalog = Arc::new(InMemoryGrantCatalog::default());
        let index = Arc::new(InMemoryEmbeddingIndex::default());
        let today = NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date");
        seed_sample_data(&store, &catalog, &index, today);

        let engine = Arc::new(RecommendationEngine::new(
            store,
            catalog,
            index,
            EngineConfig::default(),
        ));
        with_recommendation_routes(engine)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = sample_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_catalog_serves_recommendations() {
        let uri = format!(
            "/api/v1/users/{DEMO_USER}/recommendations?limit=10&today=2026-09-01"
        );
        let response = sample_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");

        let grants = body["grants"].as_array().expect("grants array");
        assert!(!grants.is_empty());
        // The robotics opportunity dominates the seeded rankings; the closed
        // one and the previously saved one never appear.
        assert_eq!(grants[0]["grant"]["id"], "nsf-robotics-24");
        for surfaced in grants {
            assert_ne!(surfaced["grant"]["id"], "nsf-expired-24");
            assert_ne!(surfaced["grant"]["id"], "nsf-robotics-23");
        }
    }
}
