use std::net::SocketAddr;
use std::time::Duration;

/// Port the server listens on when none is given
pub const DEFAULT_PORT: u16 = 8000;

/// Configuration for the HTTP echo server
///
/// # Examples
///
/// ```rust
/// use httpecho::http::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::default()
///     .with_port(9000)
///     .with_max_connections(50)
///     .with_read_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.bind_addr.port(), 9000);
/// assert_eq!(config.max_connections, 50);
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Network address to bind to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Time allowed to receive one complete request, body included
    pub read_timeout: Duration,
    /// Time allowed to write one response
    pub write_timeout: Duration,
    /// Largest Content-Length accepted, in bytes
    pub max_body_size: usize,
    /// Largest number of header lines accepted per request
    pub max_headers: usize,
    /// Value of the `Server` response header (omitted when `None`)
    pub server_name: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
            max_headers: 64,
            server_name: Some(format!("httpecho/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpConfig {
    /// Set the address to bind to
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Keep the bind host, change the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the largest accepted request body
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Set the largest accepted number of headers
    pub fn with_max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    /// Set or clear the `Server` response header
    pub fn with_server_name(mut self, server_name: Option<String>) -> Self {
        self.server_name = server_name;
        self
    }
}
