//! Standalone mock backend for local development.
//!
//! Seeds one account from [`BackendConfig`] and serves the full backend
//! contract until interrupted.

use mock_backend::{router, BackendConfig, MockBackend};
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = BackendConfig::from_env();
    let backend = MockBackend::new();
    if let Some(identity) = backend.register(&config.demo_email, &config.demo_password, Some("Demo")) {
        info!(user = %identity.id, email = %identity.email, "demo account seeded");
    }

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "mock backend listening");
    axum::serve(listener, router(backend)).await
}
