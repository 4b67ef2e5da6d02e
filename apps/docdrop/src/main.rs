//! docdrop entry point.

mod app;
mod config;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    // Load .env first so it can supply both RUST_LOG and the settings.
    let dotenv_path = dotenv::dotenv().ok();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let config = config::Config::parse();
    config.validate()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting docdrop");

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(app::run(config));
    // Do not wait on a blocking FTP call that is still stuck in the socket.
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    result?;

    tracing::info!("docdrop shut down cleanly");
    Ok(())
}
