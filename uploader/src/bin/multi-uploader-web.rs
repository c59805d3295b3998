use eyre::Context;
use multi_uploader::web::{self, AppState};
use multi_uploader::{Config, Orchestrator};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    multi_uploader::init_tracing();
    let config = Config::from_env();

    let orchestrator = match Orchestrator::from_config(&config) {
        Ok(orchestrator) => Some(orchestrator),
        Err(e) => {
            tracing::warn!("uploaders not initialized, uploads are disabled: {e}");
            None
        }
    };

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    tracing::info!(
        videos_dir = %config.videos_dir.display(),
        "Multi-Uploader web interface running at http://localhost:{}",
        config.port
    );

    axum::serve(listener, web::router(AppState::new(&config, orchestrator)))
        .await
        .context("serve HTTP")?;
    Ok(())
}
