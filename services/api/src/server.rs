use crate::cli::ServeArgs;
use crate::infra::{build_engine, open_catalog, AppState};
use crate::routes::with_decision_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loaner::config::AppConfig;
use loaner::error::AppError;
use loaner::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
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

    let catalog = open_catalog(&config.catalog);
    if let Some(every) = config.catalog.refresh_interval {
        info!(interval_secs = every.as_secs(), "offer catalog refresh enabled");
        catalog.clone().spawn_refresh(every);
    }

    let engine = Arc::new(build_engine(&config, catalog));
    let app = with_decision_routes(engine, config.decision.request_timeout)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        threshold = config.decision.approval_threshold,
        "loan decision service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
