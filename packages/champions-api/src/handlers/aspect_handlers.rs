//! Read and rebuild handlers for the aspect index.

use hyper::{body::Bytes, Response};

use crate::router::{AppState, RequestContext, RouterError};
use champions_core::aspects;

use super::response::json_response;

/// Names of the champions carrying a tag.
///
/// # Endpoint
/// `GET /championsAspecto/{aspecto}`
///
/// # Response
/// - **200 OK**: JSON array of names, empty for an unknown tag
///
/// # Example
/// ```bash
/// curl http://localhost:3333/championsAspecto/Punk
/// ```
pub fn champions_by_aspect(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let aspecto = ctx.param("aspecto");
    tracing::debug!("Looking up aspect {}", aspecto);

    let names = aspects::names_for(&*state.lock_db()?, aspecto);
    json_response(200, &names)
}

/// Every tag in the index.
///
/// # Endpoint
/// `GET /aspectos`
pub fn list_aspects(
    state: &AppState,
    _ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let tags = aspects::all_aspects(&*state.lock_db()?);
    json_response(200, &tags)
}

/// Clears and recomputes the aspect index from the champion table.
///
/// # Endpoint
/// `GET /dev`
///
/// # Response
/// - **200 OK**: the rebuilt index entries
pub fn rebuild_aspects(
    state: &AppState,
    _ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let entries = aspects::rebuild_all(&mut *state.lock_db()?);
    json_response(200, &entries)
}
