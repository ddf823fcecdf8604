use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use petconnect::backend::HttpBackend;
use petconnect::config::AppConfig;
use petconnect::error::AppError;
use petconnect::telemetry;
use petconnect::workflows::{CoordinationService, MeetingScheduler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(url) = args.backend_url.take() {
        config.backend.base_url = url.trim_end_matches('/').to_string();
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let backend = Arc::new(HttpBackend::from_config(&config.backend)?);
    let scheduler = MeetingScheduler::new(config.scheduling.utc_offset);
    let service = Arc::new(CoordinationService::new(backend, scheduler));

    let app = with_application_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = %config.backend.base_url,
        utc_offset = %config.scheduling.utc_offset,
        "petconnect coordinator ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
