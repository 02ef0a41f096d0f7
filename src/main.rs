use std::sync::Arc;

use eos_user_mcp::{build_app, config::Config, eos_client::EosApiClient, logging, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let client = Arc::new(EosApiClient::new(
        config.eos_api_base_url.clone(),
        config.eos_api_timeout,
    )?);

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(client, config.dev_mode());
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        eos_api = %config.eos_api_base_url,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
