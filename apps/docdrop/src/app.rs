//! Wires the source, uploader and poll loop together.

use std::sync::Arc;

use anyhow::Context;
use docdrop_relay::{PollLoop, TransferOrchestrator};
use docdrop_source::FtpConnector;
use docdrop_uploader::Uploader;
use tracing::{info, warn};

use crate::config::Config;

/// Runs until a shutdown signal arrives, or for one cycle with `--once`.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let connector = FtpConnector::new(config.ftp_settings());
    let uploader =
        Uploader::new(config.uploader_config()).context("failed to build upload client")?;

    info!(
        host = %config.ftp_host,
        port = config.ftp_port,
        directory = %config.ftp_dir,
        endpoint = %config.http_endpoint,
        interval_secs = config.sleep_duration,
        "configuration loaded"
    );
    info!(tags = ?config.tags.as_slice(), "tags to be added to documents");

    let orchestrator =
        TransferOrchestrator::new(Arc::new(connector), Arc::new(uploader), config.ftp_dir.clone());
    let poll = PollLoop::new(orchestrator, config.interval());

    if config.once {
        poll.run_once().await?;
        return Ok(());
    }

    let cancel = poll.cancel_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, stopping after the current cycle");
        cancel.cancel();
    });

    poll.run().await;
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
