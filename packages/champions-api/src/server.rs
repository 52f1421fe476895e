//! Hyper server setup and request handling.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::{Method, Request, Response, Result as HyperResult};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time;

use crate::router::{Router, RouterError};

/// HTTP server for the champion API.
pub struct Server {
    addr: SocketAddr,
    router: Arc<Router>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to
    /// * `router` - Request router
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self {
            addr,
            router: Arc::new(router),
        }
    }

    /// Binds the listener and serves connections until the task is dropped.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Server listening on http://{}", self.addr);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let router = Arc::clone(&self.router);

            tokio::task::spawn(async move {
                let builder = ConnectionBuilder::new(TokioExecutor::new());
                if let Err(err) = builder
                    .serve_connection(
                        io,
                        hyper::service::service_fn(move |req| handle_request(req, router.clone())),
                    )
                    .await
                {
                    tracing::warn!("Error serving connection from {}: {}", peer, err);
                }
            });
        }
    }
}

/// Handles an incoming HTTP request.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> HyperResult<Response<Full<Bytes>>> {
    let method = req.method().clone();
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let timeout_ms = router.state().config.request_timeout_ms;

    let body = match read_request_body_with_timeout(req, timeout_ms).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("{} {}: {}", method, target, err);
            return Ok(Response::from(err).map(Full::new));
        }
    };

    let body = match parse_json_body(&body) {
        Ok(value) => value,
        Err(err) => return Ok(Response::from(err).map(Full::new)),
    };

    let response = route_blocking(router, method.clone(), target.clone(), body).await;
    tracing::debug!("{} {} -> {}", method, target, response.status());
    Ok(response.map(Full::new))
}

/// Runs a request through the router on the blocking pool.
///
/// Handlers hold the store lock while the file is rewritten, so they must
/// stay off the async workers.
async fn route_blocking(
    router: Arc<Router>,
    method: Method,
    target: String,
    body: Value,
) -> Response<Bytes> {
    let task = tokio::task::spawn_blocking(move || router.route(&method, &target, body));
    match task.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Request handler failed: {}", e);
            RouterError::InternalError(e.to_string()).into()
        }
    }
}

/// Helper function to read request body with timeout
async fn read_request_body_with_timeout(
    req: Request<IncomingBody>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Parses a request body as JSON. An empty body is `Null`.
pub fn parse_json_body(body: &[u8]) -> Result<Value, RouterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|_| RouterError::BadRequest("Invalid JSON".to_string()))
}
