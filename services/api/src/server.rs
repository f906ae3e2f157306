use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::siting_router;
use atm_siting::config::AppConfig;
use atm_siting::error::AppError;
use atm_siting::telemetry;
use atm_siting::SiteScoringService;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let service = SiteScoringService::new(config.data.clone());

    // Warm the layer caches before accepting traffic.
    let warmup = service.clone();
    let statuses = tokio::task::spawn_blocking(move || warmup.layer_status())
        .await
        .map_err(|err| AppError::Server(axum::Error::new(err)))?;
    for status in &statuses {
        match &status.source {
            Some(source) => info!(layer = status.layer, rows = source.rows, "layer ready"),
            None => warn!(
                layer = status.layer,
                path = %status.path.display(),
                "layer not loaded at startup"
            ),
        }
    }

    let app = siting_router(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_dir = %config.data.data_dir.display(),
        "atm siting service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
