//! The exposure layer: state, handlers, routing and surface rendering

pub mod handlers;
pub mod notify;
pub mod router;
pub mod surface;

pub use handlers::AppState;
pub use notify::{LogNotifier, Notifier, OutboundMessage, RecordingNotifier};
pub use router::build_router;
pub use surface::{Surface, SurfaceError};

use crate::config::AppConfig;

/// Install the default tracing subscriber, honoring `RUST_LOG`
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Bind and serve the router until the process stops
pub async fn serve(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
