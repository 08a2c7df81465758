//! The request handlers.
//!
//! Each handler takes one [`HandlerEvent`], opens its own database
//! connection, and returns one [`HandlerResponse`]. The connection lives only
//! as long as the call, so it is closed on every return path. Handlers are
//! synchronous; the HTTP adapter runs them on the blocking pool.

pub mod cells;
pub mod images;

use std::time::Duration;

use serde_json::{Map, Value};
use sheetstore_shared::{HandlerEvent, HandlerResponse};
use sheetstore_store::Database;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::HandlerError;

/// Opens a fresh database connection per request.
#[derive(Debug, Clone)]
pub struct Connector {
    url: String,
    busy_timeout: Duration,
}

impl Connector {
    pub fn new(url: impl Into<String>, busy_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            busy_timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.database_url.clone(), config.db_busy_timeout)
    }

    pub fn open(&self) -> Result<Database, HandlerError> {
        Database::connect(&self.url, self.busy_timeout)
            .map_err(|e| HandlerError::Connection(e.to_string()))
    }
}

/// Which handler an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Cells,
    Images,
}

impl HandlerKind {
    pub fn name(self) -> &'static str {
        match self {
            HandlerKind::Cells => "cells",
            HandlerKind::Images => "images",
        }
    }

    pub fn run(self, event: &HandlerEvent, connector: &Connector) -> HandlerResponse {
        match self {
            HandlerKind::Cells => cells::handle(event, connector),
            HandlerKind::Images => images::handle(event, connector),
        }
    }
}

/// Turn a handler outcome into the response envelope, logging failures.
fn finish(
    handler: &'static str,
    method: &str,
    outcome: Result<HandlerResponse, HandlerError>,
) -> HandlerResponse {
    match outcome {
        Ok(resp) => {
            debug!(handler, method, status = resp.status_code, "request handled");
            resp
        }
        Err(err) => {
            let status = err.status_code();
            if status >= 500 {
                tracing::error!(handler, method, status, error = %err, "request failed");
            } else {
                warn!(handler, method, status, error = %err, "request rejected");
            }
            err.into()
        }
    }
}

// ---------------------------------------------------------------------------
// Body helpers
// ---------------------------------------------------------------------------

/// Parse the event body as a JSON object. A missing body is `{}`.
fn parse_body(event: &HandlerEvent) -> Result<Map<String, Value>, HandlerError> {
    match serde_json::from_str::<Value>(event.body_or_empty()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(HandlerError::validation("JSON body must be an object")),
        Err(_) => Err(HandlerError::validation("Invalid JSON body")),
    }
}

/// Read an integer that may arrive as a JSON number or a numeric string.
/// `Ok(None)` when the key is missing or null.
fn int_value(value: Option<&Value>, key: &str) -> Result<Option<i64>, HandlerError> {
    let invalid = || HandlerError::validation(format!("{key} must be an integer"));

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                    _ => Err(invalid()),
                }
            }
        }
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Read a text field. Missing or null is empty; scalars are rendered as text.
fn text_value(value: Option<&Value>, key: &str) -> Result<String, HandlerError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(_) => Err(HandlerError::validation(format!("{key} must be text"))),
    }
}

/// Parse an integer query parameter. `Ok(None)` when absent or empty.
fn int_query(event: &HandlerEvent, key: &str) -> Result<Option<i64>, HandlerError> {
    event
        .query(key)
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| HandlerError::validation(format!("{key} must be an integer")))
        })
        .transpose()
}
