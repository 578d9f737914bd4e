//! Server bootstrap: builder, bind/serve split, accept loops.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use wirecall_jsonrpc::{
    Capability, Dispatcher, FnCapability, MethodRegistry, RequestParams, RpcError,
};

use crate::channel;
use crate::config::ServerConfig;
use crate::http;
use crate::hub::EmissionHub;

/// Infrastructure failures. Protocol-level trouble never lands here; it
/// travels as [`wirecall_jsonrpc::RpcError`] frames to the peer.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Builder for [`RpcServer`].
///
/// ```rust,no_run
/// use wirecall_server::RpcServer;
/// use wirecall_jsonrpc::typed;
///
/// # async fn run() -> Result<(), wirecall_server::ServerError> {
/// let server = RpcServer::builder()
///     .bind_address("127.0.0.1:9464".parse().unwrap())
///     .register("ping", typed(|_: Option<serde_json::Value>| async move { Ok("pong") }))
///     .build();
/// server.run().await
/// # }
/// ```
pub struct RpcServerBuilder {
    config: ServerConfig,
    registry: MethodRegistry,
}

impl RpcServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: MethodRegistry::new(),
        }
    }

    /// Channel (WebSocket) listener address.
    pub fn bind_address(mut self, address: SocketAddr) -> Self {
        self.config.bind_address = address;
        self
    }

    /// Enable the HTTP ingress on the given address.
    pub fn http_address(mut self, address: SocketAddr) -> Self {
        self.config.http_address = Some(address);
        self
    }

    /// Ingress endpoint path (default `/rpc`).
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Ingress body-size ceiling in bytes.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.config.max_body_size = bytes;
        self
    }

    /// Push-pipe depth per channel; a full pipe counts as a write failure.
    pub fn channel_buffer_size(mut self, size: usize) -> Self {
        self.config.channel_buffer_size = size;
        self
    }

    /// Run without `rpc.on`/`rpc.off` or an emission hub; channels then
    /// carry request/response traffic only.
    pub fn disable_internal_methods(mut self) -> Self {
        self.config.disable_internal_methods = true;
        self
    }

    /// Add a method to the shared registry.
    pub fn register(mut self, name: impl Into<String>, capability: impl Capability + 'static) -> Self {
        self.registry.register(name, capability);
        self
    }

    /// Add a method backed by a plain async closure over raw params.
    pub fn register_fn<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<RequestParams>) -> BoxFuture<'static, Result<Value, RpcError>>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register(name, FnCapability::new(f));
        self
    }

    pub fn build(self) -> RpcServer {
        let hub = if self.config.disable_internal_methods {
            None
        } else {
            Some(Arc::new(EmissionHub::new(self.config.channel_buffer_size)))
        };
        RpcServer {
            dispatcher: Arc::new(Dispatcher::new(Arc::new(self.registry))),
            hub,
            config: self.config,
        }
    }
}

impl Default for RpcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured server, not yet listening.
pub struct RpcServer {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    hub: Option<Arc<EmissionHub>>,
}

impl RpcServer {
    pub fn builder() -> RpcServerBuilder {
        RpcServerBuilder::new()
    }

    /// The emission hub, for application code that wants to push.
    /// `None` with internal methods disabled.
    pub fn hub(&self) -> Option<Arc<EmissionHub>> {
        self.hub.as_ref().map(Arc::clone)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listeners without serving, so callers can learn the
    /// actual addresses (port 0 works).
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let channel_listener = TcpListener::bind(self.config.bind_address).await?;
        let channel_addr = channel_listener.local_addr()?;
        info!(address = %channel_addr, "channel listener bound");

        let mut http_listener = None;
        let mut http_addr = None;
        if let Some(address) = self.config.http_address {
            let listener = TcpListener::bind(address).await?;
            let addr = listener.local_addr()?;
            info!(address = %addr, path = %self.config.rpc_path, "ingress listener bound");
            http_listener = Some(listener);
            http_addr = Some(addr);
        }

        Ok(BoundServer {
            channel_listener,
            http_listener,
            channel_addr,
            http_addr,
            dispatcher: self.dispatcher,
            hub: self.hub,
            config: self.config,
        })
    }

    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.serve().await
    }
}

/// A server with bound listeners, ready to serve.
pub struct BoundServer {
    channel_listener: TcpListener,
    http_listener: Option<TcpListener>,
    channel_addr: SocketAddr,
    http_addr: Option<SocketAddr>,
    dispatcher: Arc<Dispatcher>,
    hub: Option<Arc<EmissionHub>>,
    config: ServerConfig,
}

impl BoundServer {
    pub fn channel_addr(&self) -> SocketAddr {
        self.channel_addr
    }

    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    /// Serve until the process stops or accept fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        if let Some(listener) = self.http_listener {
            let dispatcher = Arc::clone(&self.dispatcher);
            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(err) = http::serve(listener, dispatcher, config).await {
                    error!("ingress loop failed: {err}");
                }
            });
        }

        loop {
            let (stream, peer) = self.channel_listener.accept().await?;
            debug!(%peer, "channel connection accepted");
            let dispatcher = Arc::clone(&self.dispatcher);
            let hub = self.hub.as_ref().map(Arc::clone);
            tokio::spawn(channel::drive(stream, peer, dispatcher, hub));
        }
    }
}
