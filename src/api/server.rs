//! Report API server lifecycle: bind, spawn the axum server in a
//! background task, return a handle with a shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::report_api_router;
use crate::api::types::ApiContext;

/// Handle to a running report server.
pub struct ReportServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ReportServer {
    /// Signals graceful shutdown and waits for the server task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Report server shutdown signal sent");
        }
        if let Err(e) = self.task.await {
            tracing::error!("Report server task failed: {e}");
        }
    }
}

/// Start the report server on `addr` (port 0 picks an ephemeral port).
pub async fn serve(ctx: ApiContext, addr: SocketAddr) -> std::io::Result<ReportServer> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let app = report_api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Report server received shutdown signal");
        };

        tracing::info!(%addr, "Report server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Report server error: {e}");
        }

        tracing::info!("Report server stopped");
    });

    Ok(ReportServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
