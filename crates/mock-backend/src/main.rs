//! Mock user/group backend binary.

use std::sync::Arc;

use mock_backend::{router, MockConfig, MockState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = MockConfig::from_env();
    let Some(ttl) = config.token_ttl() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "JWT_DURATION_MINUTES={} is out of range",
                config.token_ttl_minutes
            ),
        ));
    };
    if config.token_ttl_minutes <= 0 {
        warn!(
            minutes = config.token_ttl_minutes,
            "issued tokens will already be expired"
        );
    }

    let state = Arc::new(MockState::seeded(config.jwt_secret, ttl));

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(address = %addr, "mock backend listening (logins: admin/admin, zoe/zoe)");
    axum::serve(listener, router(state)).await
}
