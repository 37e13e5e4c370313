use portal::config::get_configuration;
use portal::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "portal",
        &configuration.observability.log_level,
        configuration.observability.otlp_endpoint.as_deref(),
    );

    portal::services::metrics::init_metrics();

    let application = Application::build(configuration).await.map_err(|e| {
        tracing::error!("Failed to start portal: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    application.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
