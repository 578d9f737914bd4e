//! # wirecall-client
//!
//! JSON-RPC 2.0 request/response client over HTTP POST: single calls,
//! notifications, array- and object-style batches, and per-call bearer
//! credentials. Every failure, whether the responder's or the transport's,
//! comes back as one [`RpcError`] shape.
//!
//! ```rust,no_run
//! use wirecall_client::RpcClient;
//! use wirecall_jsonrpc::RequestParams;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), wirecall_jsonrpc::RpcError> {
//! let client = RpcClient::from_url("http://127.0.0.1:9464/rpc")?;
//! let sum = client
//!     .call("add", RequestParams::from_value(json!({"a": 1, "b": 2})))
//!     .await?;
//! assert_eq!(sum, json!(3));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod surface;

pub use client::{BatchCall, CallOptions, ClientStats, RpcClient};
pub use config::{ClientConfig, TimeoutConfig};
pub use surface::{MethodSurface, RemoteMethod};

pub use wirecall_jsonrpc::{RequestId, RequestParams, RpcError};
