/// Application name
pub const APP_NAME: &str = "sheetstore";

/// Value of `Access-Control-Allow-Origin` on every response
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// Value of `Access-Control-Allow-Headers` on preflight responses
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Preflight cache lifetime in seconds (one day)
pub const CORS_MAX_AGE_SECS: u32 = 86_400;

/// Methods the cell handler answers
pub const CELL_METHODS: &str = "GET, POST, OPTIONS";

/// Methods the image handler answers
pub const IMAGE_METHODS: &str = "GET, POST, DELETE, OPTIONS";

/// Body assumed when an event arrives without one
pub const EMPTY_JSON_BODY: &str = "{}";

/// Maximum request body size in bytes (50 MiB, base64 images)
pub const MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;
