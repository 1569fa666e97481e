use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use httpecho::http::config::DEFAULT_PORT;
use httpecho::http::{HttpConfig, HttpEchoServer};
use httpecho::EchoServerTrait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Diagnostic HTTP echo server: reflects request metadata back as JSON
#[derive(Debug, Parser)]
#[command(name = "httpecho", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(env = "HTTPECHO_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind to
    #[arg(long, env = "HTTPECHO_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Maximum number of concurrent connections
    #[arg(long, env = "HTTPECHO_MAX_CONNECTIONS", default_value_t = 1000)]
    max_connections: usize,

    /// Seconds allowed to receive one complete request
    #[arg(long, env = "HTTPECHO_READ_TIMEOUT", default_value_t = 30)]
    read_timeout: u64,

    /// Seconds allowed to write one response
    #[arg(long, env = "HTTPECHO_WRITE_TIMEOUT", default_value_t = 30)]
    write_timeout: u64,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "HTTPECHO_MAX_BODY_SIZE", default_value_t = 1024 * 1024)]
    max_body_size: usize,
}

impl Cli {
    fn into_config(self) -> HttpConfig {
        HttpConfig::default()
            .with_bind_addr(SocketAddr::new(self.host, self.port))
            .with_max_connections(self.max_connections)
            .with_read_timeout(Duration::from_secs(self.read_timeout))
            .with_write_timeout(Duration::from_secs(self.write_timeout))
            .with_max_body_size(self.max_body_size)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("httpecho=info")),
        )
        .init();

    let config = Cli::parse().into_config();
    let server = HttpEchoServer::new(config.clone());

    info!(
        address = %config.bind_addr,
        max_connections = config.max_connections,
        "Echo Server running on http://localhost:{}",
        config.bind_addr.port()
    );
    server.run().await.wrap_err("Failed to run HTTP echo server")?;

    Ok(())
}
