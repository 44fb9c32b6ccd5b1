use std::net::SocketAddr;

use tracing::info;

/// Serve `app` on all interfaces until the process receives Ctrl-C
pub async fn run_server(app: axum::Router, port: u16) -> crate::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server is running on port {}", listener.local_addr()?.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", err);
        std::future::pending::<()>().await;
    }
}
