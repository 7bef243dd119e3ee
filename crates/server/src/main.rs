use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadsync_server::{build_app_state, build_router};

fn load_config() -> leadsync_core::Config {
    leadsync_core::config::load_dotenv();
    leadsync_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let config = load_config();
    config.log_summary();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_app_state(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
