use anyhow::Context;
use api::{build_app, init_domain_services};
use config::{ApiConfig, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first to get logging settings
    let config = ApiConfig::load_or_env().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        eprintln!("Application cannot start without a valid configuration.");
        std::process::exit(1);
    });

    init_tracing(&config.logging);

    let domain_services =
        init_domain_services(&config).context("failed to initialize the provider client")?;
    let app = build_app(domain_services);

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    tracing::info!(address = %bind_address, "Server started successfully");
    tracing::info!("API Endpoints:");
    tracing::info!("  - POST /v1/chat/completions (Chat Completions, sync or SSE)");
    tracing::info!("  - POST /v1/ai/chat (Assistant, streamed text)");
    tracing::info!("  - GET /v1/health");
    tracing::info!("  - GET /admin/ai_service/health");
    tracing::info!("  - GET /admin/ai_service/providers");
    tracing::info!("  - GET /api-docs/openapi.json");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failure")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(logging_config: &LoggingConfig) {
    let filter = logging_config.filter_directive();

    match logging_config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .init();
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, draining connections");
}
