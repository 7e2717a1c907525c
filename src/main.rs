use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use seges_gpt::core::config::AppPaths;
use seges_gpt::server;
use seges_gpt::state::AppState;

const PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    seges_gpt::core::logging::init(&paths).context("Failed to initialize logging")?;

    let state = AppState::initialize(paths.clone()).context("Failed to initialize application")?;
    tracing::info!("Backend: {}", state.backend.kind().as_str());

    spawn_session_pruner(state.clone());

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.config.server.port);
    let bind_addr = format!("{}:{}", state.config.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on http://{}", addr);

    let app: Router = server::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn spawn_session_pruner(state: Arc<AppState>) {
    let max_idle = Duration::from_secs(state.config.server.session_idle_timeout_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state.sessions.prune_idle(max_idle);
            if removed > 0 {
                tracing::info!("Pruned {} idle sessions", removed);
            }
        }
    });
}
