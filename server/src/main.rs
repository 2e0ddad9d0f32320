use anyhow::Context;
use tokio::net::TcpListener;

use sourcebook_lib::config::Config;
use sourcebook_lib::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    if config.api_key.is_none() {
        log::warn!("GOOGLE_GEMINI_API_KEY is not set; card generation will fail until it is");
    }
    log::info!("Using model {}", config.model);

    let state = AppState::from_config(&config).context("invalid provider configuration")?;
    let app = router(state, config.client_dir.clone());

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("Sourcebook server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Sourcebook server shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
