use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection, StringRejection},
        DefaultBodyLimit, Query, State,
    },
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::Serialize;
use sheetstore_shared::{HandlerEvent, HandlerResponse};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handlers::{Connector, HandlerKind};

#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<Connector>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            connector: Arc::new(Connector::from_config(&config)),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/cells", any(cells_http))
        .route("/images", any(images_http))
        .route("/invoke/cells", post(cells_invoke))
        .route("/invoke/images", post(images_invoke))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run a handler on the blocking pool; handlers hold a synchronous connection.
async fn invoke(
    state: &AppState,
    kind: HandlerKind,
    event: HandlerEvent,
) -> Result<HandlerResponse, ServerError> {
    let connector = state.connector.clone();
    tokio::task::spawn_blocking(move || kind.run(&event, &connector))
        .await
        .map_err(|e| ServerError::Internal(format!("{} handler task failed: {e}", kind.name())))
}

fn event_from_http(method: Method, params: HashMap<String, String>, body: String) -> HandlerEvent {
    HandlerEvent {
        http_method: method.as_str().to_string(),
        query_string_parameters: (!params.is_empty()).then_some(params),
        body: (!body.is_empty()).then_some(body),
    }
}

/// Write a handler envelope back as a plain HTTP response.
fn into_http_response(resp: HandlerResponse) -> Response {
    let status = StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut headers = HeaderMap::new();
    for (name, value) in &resp.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "dropping invalid response header"),
        }
    }

    (status, headers, resp.body).into_response()
}

// Extractor rejections are taken as `Result`s so that they come back through
// `ServerError` with a JSON body and the open origin header.

async fn cells_http(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Result<String, StringRejection>,
) -> Result<Response, ServerError> {
    let Query(params) = query?;
    let event = event_from_http(method, params, body?);
    let resp = invoke(&state, HandlerKind::Cells, event).await?;
    Ok(into_http_response(resp))
}

async fn images_http(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Result<String, StringRejection>,
) -> Result<Response, ServerError> {
    let Query(params) = query?;
    let event = event_from_http(method, params, body?);
    let resp = invoke(&state, HandlerKind::Images, event).await?;
    Ok(into_http_response(resp))
}

async fn cells_invoke(
    State(state): State<AppState>,
    event: Result<Json<HandlerEvent>, JsonRejection>,
) -> Result<Json<HandlerResponse>, ServerError> {
    let Json(event) = event?;
    Ok(Json(invoke(&state, HandlerKind::Cells, event).await?))
}

async fn images_invoke(
    State(state): State<AppState>,
    event: Result<Json<HandlerEvent>, JsonRejection>,
) -> Result<Json<HandlerResponse>, ServerError> {
    let Json(event) = event?;
    Ok(Json(invoke(&state, HandlerKind::Images, event).await?))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
