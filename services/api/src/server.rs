use crate::cli::ServeArgs;
use crate::infra::{
    seed_sample_data, AppState, InMemoryEmbeddingIndex, InMemoryGrantCatalog,
    InMemoryPreferenceStore,
};
use crate::routes::with_recommendation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use grantmatch::config::AppConfig;
use grantmatch::error::AppError;
use grantmatch::recommendation::RecommendationEngine;
use grantmatch::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryPreferenceStore::default());
    let catalog = Arc::new(InMemoryGrantCatalog::default());
    let index = Arc::new(InMemoryEmbeddingIndex::default());
    seed_sample_data(&store, &catalog, &index, Local::now().date_naive());

    let engine = Arc::new(RecommendationEngine::new(
        store,
        catalog,
        index,
        config.engine.clone(),
    ));

    let app = with_recommendation_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "grant recommendation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
