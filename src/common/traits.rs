use crate::Result;
use async_trait::async_trait;

/// Common trait for echo servers
///
/// Implementors accept connections until a shutdown is requested, either
/// through Ctrl-C or the sender returned by [`EchoServerTrait::shutdown_signal`].
#[async_trait]
pub trait EchoServerTrait {
    /// Starts the echo server and listens for connections
    async fn run(&self) -> Result<()>;

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()>;
}
