use crate::cli::ServeArgs;
use crate::demo::demo_fixtures;
use crate::infra::{AppState, InMemoryLotteryStore, LogAuditSink};
use crate::routes::with_lottery_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use housing_lottery::config::AppConfig;
use housing_lottery::error::AppError;
use housing_lottery::telemetry;
use housing_lottery::workflows::lottery::{LotteryService, PreferenceTable};
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

    // Until the listing and application service integrations land, the
    // server runs against seeded in-memory collaborators.
    let (listings, applications) = demo_fixtures();
    let store = Arc::new(InMemoryLotteryStore::default());
    let audit = Arc::new(LogAuditSink);
    let lottery_service = Arc::new(LotteryService::new(
        Arc::new(listings),
        Arc::new(applications),
        store,
        audit,
        PreferenceTable::standard(),
        config.lottery,
    ));

    let app = with_lottery_routes(lottery_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "housing lottery service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
