//! REST API for the champion catalogue.
//!
//! Provides route-template matching, query string decoding, the
//! ordered router, the endpoint handlers and the hyper server.

pub mod handlers;
pub mod path;
pub mod query;
pub mod router;
pub mod server;
