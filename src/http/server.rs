use super::codec::{HttpCodec, HttpError};
use super::config::HttpConfig;
use crate::common::EchoServerTrait;
use crate::echo::RequestProcessor;
use crate::security::ConnectionTracker;
use crate::{EchoError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::{signal, time::timeout};
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, error, info, warn};

/// HTTP echo server
///
/// Accepts connections, frames HTTP/1.x requests off each one and answers
/// every request through a shared [`RequestProcessor`]. Each connection
/// runs in its own task; nothing mutable is shared between them.
///
/// # Examples
///
/// ```no_run
/// use httpecho::http::{HttpConfig, HttpEchoServer};
/// use httpecho::common::EchoServerTrait;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = HttpEchoServer::new(HttpConfig::default().with_port(8000));
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct HttpEchoServer {
    config: HttpConfig,
    processor: RequestProcessor,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl HttpEchoServer {
    /// Creates a new HTTP echo server with the given configuration
    pub fn new(config: HttpConfig) -> Self {
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            processor: RequestProcessor::new(),
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Replaces the request processor
    pub fn with_processor(mut self, processor: RequestProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Serves connections from an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        // Build the descriptor before the first request needs it
        let paths = self.processor.descriptor().document()["paths"]
            .as_object()
            .map_or(0, |paths| paths.len());
        info!(address = %local_addr, documented_paths = paths, "HTTP echo server listening");

        let tracker = Arc::new(ConnectionTracker::new(self.config.max_connections));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let Some(guard) = tracker.try_acquire() else {
                                let metrics = tracker.metrics();
                                warn!(
                                    %addr,
                                    limit = metrics.max_connections,
                                    active = metrics.active_connections,
                                    total = metrics.total_connections,
                                    "Connection rejected: limit reached"
                                );
                                continue;
                            };
                            debug!(%addr, current = guard.active(), "Accepted connection");

                            let config = self.config.clone();
                            let processor = self.processor;
                            let span = tracing::info_span!("connection", %addr);

                            tokio::spawn(async move {
                                let result = Self::handle_connection(stream, addr, config, processor)
                                    .instrument(span)
                                    .await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                drop(guard);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("HTTP echo server stopped");
        Ok(())
    }

    /// Handles every request on one connection until it closes
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        config: HttpConfig,
        processor: RequestProcessor,
    ) -> Result<()> {
        let codec = HttpCodec::new(
            addr,
            config.max_headers,
            config.max_body_size,
            config.server_name.clone(),
        );
        let mut framed = Framed::new(stream, codec);

        loop {
            let request = match timeout(config.read_timeout, framed.next()).await {
                Ok(Some(Ok(request))) => request,
                Ok(Some(Err(e))) => {
                    return Self::reject(&mut framed, e, &config).await;
                }
                Ok(None) => {
                    debug!(%addr, "Client closed connection");
                    break;
                }
                Err(_) => {
                    debug!(%addr, "Read timeout");
                    break;
                }
            };

            let keep_alive = request.keep_alive;
            let response = processor.process(&request).with_close(!keep_alive);
            let status = response.status;

            match timeout(config.write_timeout, framed.send(response)).await {
                Ok(Ok(())) => {
                    debug!(%addr, status = status.as_u16(), "Sent response");
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(%addr, "Write timeout");
                    break;
                }
            }

            if !keep_alive {
                break;
            }
        }

        Ok(())
    }

    /// Answers a framing error when it deserves an answer, then gives up on
    /// the connection
    async fn reject(
        framed: &mut Framed<TcpStream, HttpCodec>,
        err: HttpError,
        config: &HttpConfig,
    ) -> Result<()> {
        let Some(response) = err.response() else {
            match err {
                HttpError::Incomplete => {
                    debug!("Client disconnected mid-request, discarding partial request");
                    return Ok(());
                }
                other => return Err(other.into()),
            }
        };

        warn!(status = response.status.as_u16(), error = %err, "Rejecting malformed request");
        match timeout(config.write_timeout, framed.send(response)).await {
            Ok(result) => result.map_err(EchoError::from),
            Err(_) => Err(EchoError::Timeout("writing error response".to_string())),
        }
    }
}

#[async_trait]
impl EchoServerTrait for HttpEchoServer {
    /// Binds the configured address and serves until shutdown
    async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}
