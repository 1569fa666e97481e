use crate::common::EchoServerTrait;
use crate::http::{HttpConfig, HttpEchoServer};
use crate::{EchoError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Starts an HTTP echo server on an ephemeral loopback port for integration tests
///
/// The listener is bound before the server task is spawned, so the returned
/// address accepts connections immediately. The returned sender stops the
/// server when sent to.
pub async fn spawn_test_server(
    config: HttpConfig,
) -> Result<(JoinHandle<Result<()>>, SocketAddr, broadcast::Sender<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| EchoError::Config(format!("Failed to bind listener: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| EchoError::Config(format!("Failed to get local address: {e}")))?;

    let server = HttpEchoServer::new(config.with_bind_addr(addr));
    let shutdown = server.shutdown_signal();

    let server_handle = tokio::spawn(async move { server.serve(listener).await });

    Ok((server_handle, addr, shutdown))
}
