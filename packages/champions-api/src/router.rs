//! Ordered method + path-template routing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use hyper::{body::Bytes, Method, Response};
use serde_json::Value;

use crate::handlers;
use crate::path::RoutePath;
use crate::query::decode_query;
use champions_core::{config::DbConfig, error::DbError, Database};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Record store; locked for the whole of each handler's
    /// read-modify-persist sequence
    pub db: Arc<Mutex<Database>>,
    /// Database configuration
    pub config: Arc<DbConfig>,
}

impl AppState {
    pub fn new(db: Database, config: DbConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
        }
    }

    /// Locks the store, turning a poisoned lock into a 500.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Database>, RouterError> {
        self.db
            .lock()
            .map_err(|_| RouterError::InternalError(DbError::LockPoisoned.to_string()))
    }
}

/// Everything a handler gets to see about a request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Parsed JSON body, `Null` when the request had none
    pub body: Value,
    /// Named path parameters
    pub params: HashMap<String, String>,
    /// Decoded query string
    pub query: HashMap<String, String>,
}

impl RequestContext {
    /// Returns a path parameter, or an empty string if it is absent.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map_or("", String::as_str)
    }
}

/// Request handler function.
pub type Handler = fn(&AppState, &RequestContext) -> Result<Response<Bytes>, RouterError>;

struct Route {
    method: Method,
    path: RoutePath,
    handler: Handler,
}

/// A matched route, ready to run.
pub struct Dispatch {
    pub handler: Handler,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

/// HTTP request router.
///
/// Routes are tried in registration order; the first one whose method
/// and path both match wins.
pub struct Router {
    routes: Vec<Route>,
    state: AppState,
}

impl Router {
    /// Creates a router with no routes.
    pub fn empty(state: AppState) -> Self {
        Self {
            routes: Vec::new(),
            state,
        }
    }

    /// Creates a router serving the champion API.
    pub fn new(state: AppState) -> Result<Self, RouterError> {
        let mut router = Self::empty(state);
        handlers::register_routes(&mut router)?;
        Ok(router)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Adds a route after every existing one.
    pub fn register(
        &mut self,
        method: Method,
        template: &str,
        handler: Handler,
    ) -> Result<(), RouterError> {
        let path = RoutePath::compile(template)
            .map_err(|e| RouterError::InvalidRoute(format!("{}: {}", template, e)))?;
        self.routes.push(Route {
            method,
            path,
            handler,
        });
        Ok(())
    }

    /// Finds the first route matching `method` and `target`.
    ///
    /// # Arguments
    /// * `method` - HTTP method, compared exactly
    /// * `target` - request path with optional `?query`
    pub fn dispatch(&self, method: &Method, target: &str) -> Option<Dispatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                let matched = route.path.matches(target)?;
                tracing::debug!("{} {} matched {}", method, target, route.path.template());
                Some(Dispatch {
                    handler: route.handler,
                    params: matched.params,
                    query: matched
                        .query
                        .as_deref()
                        .map(decode_query)
                        .unwrap_or_default(),
                })
            })
    }

    /// Routes a request whose body has already been parsed.
    ///
    /// Unmatched requests get a 404 with an empty body; handler errors are
    /// rendered through [`RouterError`]'s response conversion.
    pub fn route(&self, method: &Method, target: &str, body: Value) -> Response<Bytes> {
        let Some(dispatch) = self.dispatch(method, target) else {
            tracing::debug!("No route for {} {}", method, target);
            return handlers::empty_response(404).unwrap_or_else(Response::from);
        };

        let ctx = RequestContext {
            body,
            params: dispatch.params,
            query: dispatch.query,
        };
        match (dispatch.handler)(&self.state, &ctx) {
            Ok(response) => response,
            Err(err) => {
                if let RouterError::InternalError(msg) = &err {
                    tracing::error!("{} {} failed: {}", method, target, msg);
                }
                err.into()
            }
        }
    }
}

/// Router error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    InternalError(String),
    InvalidRoute(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::InvalidRoute(msg) => write!(f, "Invalid route template {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl RouterError {
    /// HTTP status for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::InternalError(_) | RouterError::InvalidRoute(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) => 404,
        }
    }
}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        // Internal details stay in the log.
        let message = match err {
            RouterError::InternalError(_) | RouterError::InvalidRoute(_) => {
                "Internal Server Error".to_string()
            }
            RouterError::Timeout => "Request Timeout".to_string(),
            RouterError::BadRequest(msg) | RouterError::NotFound(msg) => msg,
        };

        let mut response = Response::new(Bytes::from(message));
        *response.status_mut() =
            hyper::StatusCode::from_u16(status).unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn first(_: &AppState, _: &RequestContext) -> Result<Response<Bytes>, RouterError> {
        handlers::text_response(200, "first")
    }

    fn second(_: &AppState, _: &RequestContext) -> Result<Response<Bytes>, RouterError> {
        handlers::text_response(200, "second")
    }

    fn echo_query(_: &AppState, ctx: &RequestContext) -> Result<Response<Bytes>, RouterError> {
        let page = ctx.query.get("page").cloned().unwrap_or_default();
        handlers::text_response(200, &format!("{}:{}", ctx.param("id"), page))
    }

    fn failing(_: &AppState, _: &RequestContext) -> Result<Response<Bytes>, RouterError> {
        Err(RouterError::InternalError("secret detail".to_string()))
    }

    fn test_router() -> (tempfile::TempDir, Router) {
        let dir = tempdir().unwrap();
        let config = DbConfig {
            data_file: dir.path().join("db.json"),
            ..Default::default()
        };
        let state = AppState::new(Database::open(&config).unwrap(), config);
        (dir, Router::empty(state))
    }

    #[test]
    fn test_first_registered_route_wins() {
        let (_dir, mut router) = test_router();
        router.register(Method::GET, "/items/:id", first).unwrap();
        router.register(Method::GET, "/items/:name", second).unwrap();

        let response = router.route(&Method::GET, "/items/abc", Value::Null);
        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"first");
    }

    #[test]
    fn test_method_must_match() {
        let (_dir, mut router) = test_router();
        router.register(Method::DELETE, "/items/:id", first).unwrap();
        router.register(Method::GET, "/items/:id", second).unwrap();

        let response = router.route(&Method::GET, "/items/1", Value::Null);
        assert_eq!(response.body().as_ref(), b"second");

        let response = router.route(&Method::POST, "/items/1", Value::Null);
        assert_eq!(response.status(), 404);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_params_and_query_injected() {
        let (_dir, mut router) = test_router();
        router.register(Method::GET, "/items/:id", echo_query).unwrap();

        let dispatch = router.dispatch(&Method::GET, "/items/7?page=3").unwrap();
        assert_eq!(dispatch.params["id"], "7");
        assert_eq!(dispatch.query["page"], "3");

        let response = router.route(&Method::GET, "/items/7?page=3", Value::Null);
        assert_eq!(response.body().as_ref(), b"7:3");
    }

    #[test]
    fn test_internal_error_is_opaque_500() {
        let (_dir, mut router) = test_router();
        router.register(Method::GET, "/boom", failing).unwrap();

        let response = router.route(&Method::GET, "/boom", Value::Null);
        assert_eq!(response.status(), 500);
        assert_eq!(response.body().as_ref(), b"Internal Server Error");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(RouterError::BadRequest(String::new()).status(), 400);
        assert_eq!(RouterError::NotFound(String::new()).status(), 404);
        assert_eq!(RouterError::Timeout.status(), 408);
        assert_eq!(RouterError::InternalError(String::new()).status(), 500);
    }
}
