//! Champion CRUD handlers.

use std::collections::HashSet;

use hyper::{body::Bytes, Response};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::router::{AppState, RequestContext, RouterError};
use champions_core::aspects;
use champions_core::champion::{Champion, ChampionPatch, ASPECTOS, CHAMPIONS_TABLE, CUSTO, NOME};
use champions_core::error::DbError;
use champions_core::{Database, Filter, Record};

use super::map_db_error_to_router_error;
use super::response::{json_response, text_response};

/// One page of the champion listing.
#[derive(Debug, Serialize)]
pub struct ChampionPage {
    pub page: usize,
    pub limit: usize,
    /// Matches across all pages
    pub total: usize,
    pub data: Vec<Record>,
}

#[derive(Debug, Serialize)]
struct ChampionCount {
    total: usize,
}

/// Lists champions with optional filters and pagination.
///
/// # Endpoint
/// `GET /champions`
///
/// # Query Parameters
/// - `name`: exact champion name
/// - `aspectos`: comma-separated tags; a champion must carry all of them
/// - `custo`: exact cost
/// - `page`: 1-based page number (default 1)
/// - `limit`: page size (default 10)
///
/// # Response
/// - **200 OK**
/// ```json
/// {"page": 1, "limit": 10, "total": 25, "data": [ ... ]}
/// ```
///
/// # Errors
/// - **400 Bad Request**: `custo` is not a number
///
/// # Example
/// ```bash
/// curl "http://localhost:3333/champions?aspectos=Punk,EDM&page=2&limit=5"
/// ```
pub fn list_champions(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let filter = listing_filter(ctx)?;
    let page = positive_or(ctx.query.get("page"), 1);
    let limit = positive_or(ctx.query.get("limit"), state.config.default_page_limit);

    let matches = {
        let db = state.lock_db()?;
        db.select(
            CHAMPIONS_TABLE,
            (!filter.is_empty()).then_some(&filter),
        )
    };

    let total = matches.len();
    let start = (page - 1).saturating_mul(limit);
    let data = matches.into_iter().skip(start).take(limit).collect();

    json_response(
        200,
        &ChampionPage {
            page,
            limit,
            total,
            data,
        },
    )
}

/// Counts all champions.
///
/// # Endpoint
/// `GET /championsTotal`
pub fn count_champions(
    state: &AppState,
    _ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let total = state.lock_db()?.count(CHAMPIONS_TABLE);
    json_response(200, &ChampionCount { total })
}

/// Creates a champion.
///
/// # Endpoint
/// `POST /champions`
///
/// # Request Body
/// ```json
/// {"nome": "Jinx", "aspectos": ["Punk", "EDM"], "custo": 3, "habilidade": "Zap"}
/// ```
///
/// # Response
/// - **201 Created**: the stored record, including its generated `id`
///
/// # Errors
/// - **400 Bad Request**: missing or invalid field, or `nome` already taken
///
/// # Notes
/// - `/` characters are stripped from every tag
/// - the champion is added to the aspect index
pub fn create_champion(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let champion = Champion::from_body(&ctx.body).map_err(map_db_error_to_router_error)?;

    let mut db = state.lock_db()?;
    if name_taken(&db, &champion.nome, None) {
        return Err(map_db_error_to_router_error(DbError::DuplicateName(
            champion.nome,
        )));
    }

    let stored = db.insert(CHAMPIONS_TABLE, champion.into_record());
    aspects::on_champion_created(&mut db, &stored);
    drop(db);

    tracing::info!("Created champion {}", stored[NOME]);
    json_response(201, &stored)
}

/// Creates several champions at once.
///
/// # Endpoint
/// `POST /championsMany`
///
/// # Request Body
/// A non-empty array of champion objects, as for `POST /champions`.
///
/// # Response
/// - **201 Created**: array of stored records
///
/// # Errors
/// - **400 Bad Request**: body is not a non-empty array, or any entry is
///   invalid or reuses a name (stored or earlier in the batch)
///
/// # Notes
/// Nothing is inserted unless every entry passes.
pub fn create_many_champions(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let entries = match ctx.body.as_array() {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            return Err(RouterError::BadRequest(
                "Expected a non-empty array of champions".to_string(),
            ))
        }
    };

    let champions = entries
        .iter()
        .enumerate()
        .map(|(i, body)| {
            Champion::from_body(body)
                .map_err(|e| RouterError::BadRequest(format!("Entry {}: {}", i, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut db = state.lock_db()?;
    let mut batch_names = HashSet::new();
    for (i, champion) in champions.iter().enumerate() {
        if name_taken(&db, &champion.nome, None) || !batch_names.insert(champion.nome.as_str()) {
            return Err(RouterError::BadRequest(format!(
                "Entry {}: {}",
                i,
                DbError::DuplicateName(champion.nome.clone())
            )));
        }
    }

    let mut created = Vec::with_capacity(champions.len());
    for champion in champions {
        let stored = db.insert(CHAMPIONS_TABLE, champion.into_record());
        aspects::on_champion_created(&mut db, &stored);
        created.push(stored);
    }
    drop(db);

    tracing::info!("Created {} champions", created.len());
    json_response(201, &created)
}

/// Partially updates a champion.
///
/// # Endpoint
/// `PUT /champions/{id}`
///
/// # Request Body
/// Any subset of `nome`, `aspectos`, `custo`, `habilidade`. `aspectos`
/// may be an array or a comma-separated string.
///
/// # Response
/// - **200 OK**: plain-text confirmation
///
/// # Errors
/// - **400 Bad Request**: no updatable field, an invalid field, or a
///   `nome` held by another champion
/// - **404 Not Found**: unknown id
pub fn update_champion(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let id = ctx.param("id");
    let patch = ChampionPatch::from_body(&ctx.body).map_err(map_db_error_to_router_error)?;
    if patch.is_empty() {
        return Err(RouterError::BadRequest("No fields to update".to_string()));
    }

    let mut db = state.lock_db()?;
    let before = db
        .find_by_id(CHAMPIONS_TABLE, id)
        .cloned()
        .ok_or_else(|| champion_not_found(id))?;

    if let Some(nome) = &patch.nome {
        if name_taken(&db, nome, Some(id)) {
            return Err(map_db_error_to_router_error(DbError::DuplicateName(
                nome.clone(),
            )));
        }
    }

    let touches_index = patch.touches_index();
    if !db.update(CHAMPIONS_TABLE, id, patch.into_record()) {
        return Err(champion_not_found(id));
    }
    if touches_index {
        if let Some(after) = db.find_by_id(CHAMPIONS_TABLE, id).cloned() {
            aspects::on_champion_updated(&mut db, &before, &after);
        }
    }

    text_response(200, "Champion updated")
}

/// Deletes a champion and drops it from the aspect index.
///
/// # Endpoint
/// `DELETE /champions/{id}`
///
/// # Errors
/// - **404 Not Found**: unknown id
pub fn delete_champion(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let id = ctx.param("id");
    let mut db = state.lock_db()?;

    if !remove_champion(&mut db, id) {
        return Err(champion_not_found(id));
    }
    text_response(200, "Champion removed")
}

/// Deletes every champion listed in `championIds`. Unknown ids are skipped.
///
/// # Endpoint
/// `DELETE /champions`
///
/// # Request Body
/// ```json
/// {"championIds": ["id-1", "id-2"]}
/// ```
pub fn delete_many_champions(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let ids = ctx
        .body
        .get("championIds")
        .and_then(Value::as_array)
        .ok_or_else(|| RouterError::BadRequest("Expected a championIds array".to_string()))?;

    let mut db = state.lock_db()?;
    let removed = ids
        .iter()
        .filter_map(Value::as_str)
        .filter(|id| remove_champion(&mut db, id))
        .count();
    drop(db);

    tracing::info!("Removed {} of {} requested champions", removed, ids.len());
    text_response(200, "Champions removed")
}

/// Looks up champions by exact name.
///
/// # Endpoint
/// `GET /champions/{nome}`
///
/// # Response
/// - **200 OK**: JSON array of matching records
///
/// # Errors
/// - **404 Not Found**: no champion has that name
pub fn get_champion_by_name(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Bytes>, RouterError> {
    let nome = ctx.param("nome");
    let mut filter = Filter::new();
    filter.insert(NOME.to_string(), Value::String(nome.to_string()));

    let matches = state.lock_db()?.select(CHAMPIONS_TABLE, Some(&filter));
    if matches.is_empty() {
        return Err(RouterError::NotFound("Champion not found".to_string()));
    }
    json_response(200, &matches)
}

fn champion_not_found(id: &str) -> RouterError {
    map_db_error_to_router_error(DbError::RecordNotFound {
        table: CHAMPIONS_TABLE.to_string(),
        id: id.to_string(),
    })
}

/// Builds the `select` filter from the listing's query parameters.
fn listing_filter(ctx: &RequestContext) -> Result<Filter, RouterError> {
    let mut filter = Filter::new();

    if let Some(name) = ctx.query.get("name") {
        filter.insert(NOME.to_string(), Value::String(name.clone()));
    }

    if let Some(csv) = ctx.query.get("aspectos") {
        let tags: Vec<Value> = csv
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(|tag| Value::String(tag.to_string()))
            .collect();
        if !tags.is_empty() {
            filter.insert(ASPECTOS.to_string(), Value::Array(tags));
        }
    }

    if let Some(raw) = ctx.query.get("custo") {
        let custo = raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| RouterError::BadRequest(format!("Invalid custo value '{}'", raw)))?;
        filter.insert(CUSTO.to_string(), Value::Number(custo));
    }

    Ok(filter)
}

/// Parses a positive integer, falling back to `default` when absent,
/// unparsable or zero. Negative values clamp to 1.
fn positive_or(raw: Option<&String>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&n| n != 0)
        .map_or(default, |n| n.max(1) as usize)
        .max(1)
}

/// Whether a champion other than `except_id` already uses `nome`.
fn name_taken(db: &Database, nome: &str, except_id: Option<&str>) -> bool {
    let mut filter = Filter::new();
    filter.insert(NOME.to_string(), Value::String(nome.to_string()));
    db.select(CHAMPIONS_TABLE, Some(&filter))
        .iter()
        .any(|row| except_id.is_none() || row.get("id").and_then(Value::as_str) != except_id)
}

/// Deletes a champion and unindexes it. `false` if the id is unknown.
fn remove_champion(db: &mut Database, id: &str) -> bool {
    let Some(champion) = db.find_by_id(CHAMPIONS_TABLE, id).cloned() else {
        tracing::warn!("Champion {} not found", id);
        return false;
    };
    if !db.delete(CHAMPIONS_TABLE, id) {
        return false;
    }
    aspects::on_champion_deleted(db, &champion);
    true
}
