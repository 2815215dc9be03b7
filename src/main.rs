use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use stepweave::handlers::builtin_registry;
use stepweave::service::{router, AppState};
use stepweave::telemetry;

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let bind = std::env::var("STEPWEAVE_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let state = Arc::new(AppState::new(builtin_registry()));
    let app = router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|err| miette::miette!("failed to bind {bind}: {err}"))?;
    info!(%bind, "stepweave listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|err| miette::miette!("server error: {err}"))?;

    Ok(())
}
