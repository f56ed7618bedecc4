//! threatmap HTTP microservice.
//!
//! Serves threat CRUD, demo seeding, hazard zones and evacuation planning
//! over a JSON-file threat store. Background tasks purge expired threats and,
//! when configured, poll a news feed for new ones.
//!
//! # Configuration
//!
//! See [`threatmap_service::config`] for the `THREATMAP_*` variables, plus:
//!
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `METRICS_ENABLED` - Prometheus recorder (default: true)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use threatmap_lib::{ExpiryJanitor, HttpNewsSource, IngestionPoller};
use threatmap_service::{
    init_logging, init_metrics, router, AppState, LoggingConfig, MetricsConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("threatmap");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env();
    info!(port = config.port, "starting threatmap service");

    let state = AppState::load(&config).map_err(|e| {
        error!(error = %e, "failed to load application state");
        e
    })?;
    info!(state = ?state, "application state loaded");

    let shutdown = CancellationToken::new();
    let mut tasks = vec![tokio::spawn(
        ExpiryJanitor::new(state.store_arc()).run(shutdown.clone()),
    )];

    if let (Some(pipeline), Some(news_url)) = (state.ingestion_arc(), config.news_url.as_deref()) {
        let source = HttpNewsSource::new(news_url, config.evacuation.collaborator_timeout)?;
        let poller = IngestionPoller::new(Arc::new(source), pipeline);
        tasks.push(tokio::spawn(poller.run(shutdown.clone())));
    }

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "background task ended abnormally");
        }
    }

    info!("threatmap service stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
    shutdown.cancel();
}
