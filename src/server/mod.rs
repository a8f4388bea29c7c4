//! Loan approval HTTP server
//!
//! Serves predictions from the persisted pipeline and model. Transform and
//! predict run on the blocking pool; the loaded artifacts are shared
//! read-only between requests.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::artifacts::ArtifactStore;
use crate::config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Start the server and block until ctrl+c
pub async fn run_server(config: ServerConfig, store: ArtifactStore) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        artifacts_dir = %store.config().dir.display(),
        started_at = %start_time.to_rfc3339(),
        "Initializing loan approval server"
    );

    let state = Arc::new(AppState::load(store));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, running until killed");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
