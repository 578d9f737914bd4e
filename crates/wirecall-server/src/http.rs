//! HTTP ingress: the request/response transport.
//!
//! Protocol failures ride `200 OK` like successes; HTTP statuses are
//! reserved for transport-level trouble. A dispatch that produces no
//! frame answers `204 No Content`.

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, error, warn};

use wirecall_jsonrpc::{Dispatcher, RpcError};

use crate::config::ServerConfig;
use crate::server::ServerError;

pub(crate) async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let config = Arc::new(config);
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "ingress connection accepted");

        let dispatcher = Arc::clone(&dispatcher);
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                handle(req, Arc::clone(&dispatcher), Arc::clone(&config))
            });
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                // Plain client disconnects are routine; keep them quiet.
                if err.to_string().contains("connection closed before message completed") {
                    debug!(%peer, "client disconnected: {err}");
                } else {
                    warn!(%peer, "connection error: {err}");
                }
            }
        });
    }
}

async fn handle<B>(
    req: Request<B>,
    dispatcher: Arc<Dispatcher>,
    config: Arc<ServerConfig>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
    B::Error: Display,
{
    if req.uri().path() != config.rpc_path {
        return Ok(plain(StatusCode::NOT_FOUND, "Not Found"));
    }
    if req.method() != Method::POST {
        return Ok(plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"));
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("application/json") {
        warn!("invalid content type: {content_type}");
        return Ok(plain(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Content-Type must be application/json",
        ));
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!("failed to read request body: {err}");
            return Ok(plain(StatusCode::BAD_REQUEST, "Failed to read request body"));
        }
    };
    if body.len() > config.max_body_size {
        warn!("request body too large: {} bytes", body.len());
        return Ok(plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"));
    }

    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(_) => {
            let err = RpcError::invalid_request(None, "body is not valid UTF-8");
            return Ok(json_response(&err));
        }
    };

    match dispatcher.dispatch_text(text).await {
        Some(frame) => Ok(json_response(&frame)),
        // Notifications and empty batches produce no frame; no-content is
        // how the other end finds out.
        None => Ok(no_content()),
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(message)))
        .unwrap()
}

fn no_content() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn json_response<T: Serialize>(value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap(),
        Err(err) => {
            error!("failed to serialize response: {err}");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
