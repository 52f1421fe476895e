//! HTTP endpoint implementations for champions and aspects.

mod aspect_handlers;
mod champion_handlers;
mod response;

use hyper::Method;

use crate::router::{Router, RouterError};
use champions_core::error::DbError;

pub use aspect_handlers::{champions_by_aspect, list_aspects, rebuild_aspects};
pub use champion_handlers::{
    count_champions, create_champion, create_many_champions, delete_champion,
    delete_many_champions, get_champion_by_name, list_champions, update_champion,
};
pub use response::{empty_response, json_response, text_response};

/// Registers every endpoint, in matching order.
pub fn register_routes(router: &mut Router) -> Result<(), RouterError> {
    router.register(Method::GET, "/dev", rebuild_aspects)?;
    router.register(Method::GET, "/champions", list_champions)?;
    router.register(Method::GET, "/championsTotal", count_champions)?;
    router.register(Method::POST, "/champions", create_champion)?;
    router.register(Method::POST, "/championsMany", create_many_champions)?;
    router.register(Method::DELETE, "/champions/:id", delete_champion)?;
    router.register(Method::PUT, "/champions/:id", update_champion)?;
    router.register(Method::GET, "/championsAspecto/:aspecto", champions_by_aspect)?;
    router.register(Method::GET, "/champions/:nome", get_champion_by_name)?;
    router.register(Method::DELETE, "/champions", delete_many_champions)?;
    router.register(Method::GET, "/aspectos", list_aspects)?;
    Ok(())
}

/// Map DbError to appropriate RouterError
pub fn map_db_error_to_router_error(e: DbError) -> RouterError {
    match e {
        DbError::Validation { .. } | DbError::DuplicateName(_) => {
            RouterError::BadRequest(e.to_string())
        }
        DbError::RecordNotFound { .. } => RouterError::NotFound(e.to_string()),
        _ => RouterError::InternalError(format!("Store error: {}", e)),
    }
}
