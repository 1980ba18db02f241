use anyhow::Context;

use taskflow_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    taskflow_observability::init(AppConfig::log_format_from_env()?);
    let config = AppConfig::from_env()?;

    let app = taskflow_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
