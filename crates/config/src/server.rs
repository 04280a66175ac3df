use std::net::SocketAddr;

use serde::Deserialize;

/// HTTP server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server binds to.
    ///
    /// When unset, the binary falls back to the `PORT` environment variable
    /// and finally to `0.0.0.0:8080`.
    pub listen_address: Option<SocketAddr>,
}
