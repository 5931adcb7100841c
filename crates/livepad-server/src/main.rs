use livepad_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Read .env before RUST_LOG is consulted
    livepad_server::config::load_dotenv();

    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,livepad=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    let config = ServerConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    let server = Server::bind(&config).await?;
    server.serve(shutdown_signal()).await?;

    tracing::info!("livepad stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
