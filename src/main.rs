use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use statement_relay::{build_app, telemetry, RelayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------
    // Environment / config
    // -----------------------------
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    let config = RelayConfig::from_env().context("loading configuration")?;

    // -----------------------------
    // Logging
    // -----------------------------
    telemetry::init(config.log_format);

    if !dotenv_loaded {
        warn!("no .env file found, using process environment only");
    }

    info!("🚀 Starting statement relay v{}", env!("CARGO_PKG_VERSION"));
    info!(
        model = %config.model,
        max_attempts = config.retry.max_attempts(),
        max_body_mb = config.max_body_bytes / (1024 * 1024),
        "configuration loaded"
    );

    // Keep serving so the frontend gets a JSON error instead of a dead socket.
    if !config.has_credential() {
        error!("GEMINI_API_KEY is not set; every analyze request will fail until it is configured");
    }

    // -----------------------------
    // Router
    // -----------------------------
    let app = build_app(&config)?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("🌐 HTTP listening on http://{addr}");
    info!("🛠 Analyze endpoint at http://{addr}/analyze-statement");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to listen for SIGTERM");
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

    info!("shutdown signal received, draining in-flight requests");
}
