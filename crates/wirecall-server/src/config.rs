//! Server configuration.

use std::net::SocketAddr;

/// Tunables for both listeners.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Channel (WebSocket) listener address.
    pub bind_address: SocketAddr,
    /// Optional HTTP ingress address for request/response traffic.
    pub http_address: Option<SocketAddr>,
    /// Path the HTTP ingress answers on.
    pub rpc_path: String,
    /// Largest accepted HTTP body, in bytes.
    pub max_body_size: usize,
    /// Frames buffered per channel between the hub and a slow writer.
    pub channel_buffer_size: usize,
    /// Suppress `rpc.on`/`rpc.off` and skip hub registration entirely.
    pub disable_internal_methods: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9464)),
            http_address: None,
            rpc_path: "/rpc".to_string(),
            max_body_size: 1024 * 1024,
            channel_buffer_size: 128,
            disable_internal_methods: false,
        }
    }
}
