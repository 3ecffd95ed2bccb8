//! `start` script: run the dev server until Ctrl+C.

use anyhow::{Context, Result};

use crate::config::CasparConfig;
use crate::server::DevServer;
use crate::{debug, log};

/// Create, listen, print URLs, then wait for shutdown and close everything.
pub async fn start(config: &CasparConfig) -> Result<()> {
    let shutdown = crate::core::shutdown_signal();

    let server = DevServer::create(config.dev_server_options())
        .await
        .context("failed to start dev server")?;

    if let Err(e) = server.listen().await {
        if let Err(close) = server.close().await {
            debug!("start"; "{}", close);
        }
        return Err(e).context("failed to start dev server");
    }

    server.print_urls();
    if config.serve.open {
        open_browser(&server);
    }

    // Channel closes only if the signal was claimed elsewhere
    let _ = tokio::task::spawn_blocking(move || shutdown.recv()).await;

    server.close().await?;
    log!("start"; "stopped");
    Ok(())
}

fn open_browser(server: &DevServer) {
    let Some(url) = server.urls().into_iter().next() else {
        return;
    };
    if let Err(e) = open::that(&url) {
        log!("start"; "failed to open browser: {}", e);
    }
}
