use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use askgate_chat::ChatProxy;
use askgate_core::config::GatewayConfig;
use askgate_search::SearchClient;
use askgate_server::{AppState, ServerConfig};

#[derive(Parser)]
#[command(name = "askgate", about = "HTTP gateway for a streamed conversational AI service")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; deployed environments set variables directly.
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = GatewayConfig::from_env().context("gateway configuration incomplete")?;
    tracing::info!(realm = %config.realm, "Starting askgate");

    let state = AppState {
        proxy: Arc::new(ChatProxy::new(&config)),
        search: Arc::new(SearchClient::new(config.search_api_key.clone())),
    };

    let server_config = ServerConfig {
        port: args.port,
        ..Default::default()
    };
    let handle = askgate_server::start(server_config, state).await?;
    tracing::info!(port = handle.port, "askgate ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
