use sketchturn::{ServerConfig, SketchError, SketchServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SketchError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        selection_secs = config.game.selection_secs,
        guessing_secs = config.game.guessing_secs,
        max_rounds = config.game.max_rounds,
        "starting Sketchturn server"
    );

    let server = SketchServer::builder().config(config).build().await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
            }
            tracing::info!("shutting down");
        })
        .await
}
