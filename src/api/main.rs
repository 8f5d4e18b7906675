use manuscript_api::config::AppConfig;
use manuscript_api::middleware::{
    create_custom_cors_layer, create_rate_limiter_with_quota, init_tracing, rate_limit_middleware,
};
use manuscript_api::routes;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };
    init_tracing(config.log_format);
    info!(
        development = config.is_development,
        database = config.database_url.is_some(),
        "Application starting..."
    );

    let app_state = routes::create_app_state_with_storage(&config)
        .await
        .inspect_err(|e| error!("Storage initialization failed: {}", e))?;

    let limiter = create_rate_limiter_with_quota(config.rate_limit_per_minute);
    let app = routes::create_app(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_custom_cors_layer(&config.cors_allowed_origins))
            .layer(axum::middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            )),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
