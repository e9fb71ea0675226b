use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the subscriber so RUST_LOG can come from it
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinshare_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kinshare signaling server...");

    if let Err(e) = dotenv {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = kinshare_server::state::Config::load()?;
    let bind_address = config.bind_address();

    let (app, _state) = kinshare_server::create_app(config);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Signaling server listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
