use assistant_service::config::AssistantConfig;
use assistant_service::startup::Application;
use service_core::observability::{init_tracing, otlp_endpoint};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let endpoint = otlp_endpoint();
    init_tracing("assistant-service", "info", endpoint.as_deref());

    let config = AssistantConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await?;

    tracing::info!("Assistant service stopped");
    Ok(())
}
