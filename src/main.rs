mod comments;
mod config;
mod error;
mod pipeline;
mod routes;
mod story;
#[cfg(test)]
mod test_support;
mod video_id;

use tracing::info;

use crate::config::Config;
use crate::routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let addr = format!("0.0.0.0:{}", config.port);
    info!(
        "Using model {} (openai configured: {}, youtube configured: {})",
        config.openai_model,
        config.openai_configured(),
        config.youtube_configured()
    );

    let app = router(AppState::from_config(config));

    info!("Starting story server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
