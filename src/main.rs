use promptshop::{create_router, init, AppState, Config, Result, ResultExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the application
    init()?;

    let config = Config::from_env()?;

    // Create the image directory if it doesn't exist
    if !config.image_dir.exists() {
        std::fs::create_dir_all(&config.image_dir)?;
    }

    // Initialize application state
    let addr = config.bind_addr;
    let state = AppState::from_config(config)?;

    let app = create_router(state);

    // Set up the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    log::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
