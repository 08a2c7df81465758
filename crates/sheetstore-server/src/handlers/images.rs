//! Image store handler. Payloads are base64 text kept in `file_url`; the list
//! view leaves them out.

use serde_json::{json, Map, Value};
use sheetstore_shared::constants::IMAGE_METHODS;
use sheetstore_shared::{HandlerEvent, HandlerResponse};
use sheetstore_store::StoreError;

use super::{finish, int_query, int_value, parse_body, Connector};
use crate::error::HandlerError;

/// Entry point for one image request.
pub fn handle(event: &HandlerEvent, connector: &Connector) -> HandlerResponse {
    let method = event.method();
    if method == "OPTIONS" {
        return HandlerResponse::preflight(IMAGE_METHODS);
    }

    let outcome = match method.as_str() {
        "GET" => match int_query(event, "id") {
            Ok(Some(id)) => get_image(id, connector),
            Ok(None) => list_images(connector),
            Err(e) => Err(e),
        },
        "POST" => upload_image(event, connector),
        "DELETE" => delete_image(event, connector),
        _ => Err(HandlerError::MethodNotAllowed),
    };

    finish("images", &method, outcome)
}

fn list_images(connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    let db = connector.open()?;
    let images = db.list_images()?;

    Ok(HandlerResponse::ok(json!({ "images": images })))
}

fn get_image(id: i64, connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    let db = connector.open()?;
    let image = db.get_image(id).map_err(|e| match e {
        StoreError::NotFound => HandlerError::NotFound("Image not found".to_string()),
        other => HandlerError::Database(other),
    })?;

    Ok(HandlerResponse::ok(json!({ "image": image })))
}

fn upload_image(event: &HandlerEvent, connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    let body = parse_body(event)?;

    let (Some(file_name), Some(file_data)) =
        (non_empty(&body, "file_name"), non_empty(&body, "file_data"))
    else {
        return Err(HandlerError::validation("file_name and file_data required"));
    };

    let db = connector.open()?;
    let image = db.insert_image(file_name, file_data)?;

    tracing::info!(id = image.id, file_name, size = file_data.len(), "image uploaded");

    Ok(HandlerResponse::ok(json!({ "image": image })))
}

fn non_empty<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    match body.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn delete_image(event: &HandlerEvent, connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    // id from the query string, or from a JSON body as a fallback
    let id = match int_query(event, "id")? {
        Some(id) => Some(id),
        None => {
            let body = parse_body(event)?;
            int_value(body.get("id"), "id")?
        }
    };
    let id = id.ok_or_else(|| HandlerError::validation("id required"))?;

    let db = connector.open()?;
    let deleted = db.delete_image(id)?;
    tracing::debug!(id, deleted, "image delete");

    Ok(HandlerResponse::ok(json!({ "success": true })))
}
