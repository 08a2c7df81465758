//! Request/response envelope exchanged with a handler.
//!
//! The field names follow the function-runtime convention (`httpMethod`,
//! `queryStringParameters`, `statusCode`, ...) so an event captured from a
//! gateway can be replayed against a handler unchanged.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CORS_ALLOW_HEADERS, CORS_ALLOW_ORIGIN, CORS_MAX_AGE_SECS, EMPTY_JSON_BODY,
};

/// One inbound request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HandlerEvent {
    /// HTTP verb. Missing means `GET`.
    #[serde(default = "default_method")]
    pub http_method: String,
    /// Query string, absent or `null` when the request had none.
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    /// Raw JSON body text.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl HandlerEvent {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            query_string_parameters: None,
            body: None,
        }
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Upper-cased HTTP method.
    pub fn method(&self) -> String {
        self.http_method.trim().to_ascii_uppercase()
    }

    /// Look up a query parameter. Empty values count as absent.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(key))
            .map(|value| value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Body text, `{}` when the event carried none.
    pub fn body_or_empty(&self) -> &str {
        match self.body.as_deref() {
            Some(body) if !body.trim().is_empty() => body,
            _ => EMPTY_JSON_BODY,
        }
    }
}

/// One outbound response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl HandlerResponse {
    /// JSON response with `Content-Type` and the permissive origin header.
    pub fn json(status_code: u16, body: serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            CORS_ALLOW_ORIGIN.to_string(),
        );

        Self {
            status_code,
            headers,
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }

    pub fn ok(body: serde_json::Value) -> Self {
        Self::json(200, body)
    }

    /// `{"error": message}` with the given status.
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::json(status_code, serde_json::json!({ "error": message.into() }))
    }

    /// Empty-bodied answer to a CORS preflight.
    pub fn preflight(allow_methods: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            CORS_ALLOW_ORIGIN.to_string(),
        );
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            allow_methods.to_string(),
        );
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            CORS_ALLOW_HEADERS.to_string(),
        );
        headers.insert(
            "Access-Control-Max-Age".to_string(),
            CORS_MAX_AGE_SECS.to_string(),
        );

        Self {
            status_code: 200,
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// Parse the body back into JSON. Fails on an empty (preflight) body.
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CELL_METHODS;

    #[test]
    fn test_event_defaults() {
        let event: HandlerEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event.method(), "GET");
        assert!(event.query("tab_id").is_none());
        assert_eq!(event.body_or_empty(), "{}");
    }

    #[test]
    fn test_event_wire_names() {
        let raw = r#"{
            "httpMethod": "post",
            "queryStringParameters": {"action": "sync_all", "tab_id": ""},
            "body": "{\"cells\": []}"
        }"#;
        let event: HandlerEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.method(), "POST");
        assert_eq!(event.query("action"), Some("sync_all"));
        assert_eq!(event.query("tab_id"), None);
        assert_eq!(event.body_or_empty(), r#"{"cells": []}"#);
    }

    #[test]
    fn test_null_query_parameters() {
        let raw = r#"{"httpMethod": "GET", "queryStringParameters": null, "body": null}"#;
        let event: HandlerEvent = serde_json::from_str(raw).unwrap();
        assert!(event.query_string_parameters.is_none());
        assert_eq!(event.body_or_empty(), "{}");
    }

    #[test]
    fn test_json_response_headers() {
        let resp = HandlerResponse::ok(serde_json::json!({"success": true}));
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.headers["Content-Type"], "application/json");
        assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
        assert!(!resp.is_base64_encoded);
        assert_eq!(resp.body_json().unwrap()["success"], true);

        let wire = serde_json::to_value(&resp).unwrap();
        assert_eq!(wire["statusCode"], 200);
        assert_eq!(wire["isBase64Encoded"], false);
    }

    #[test]
    fn test_preflight_response() {
        let resp = HandlerResponse::preflight(CELL_METHODS);
        assert_eq!(resp.status_code, 200);
        assert!(resp.body.is_empty());
        assert_eq!(resp.headers["Access-Control-Allow-Methods"], "GET, POST, OPTIONS");
        assert_eq!(resp.headers["Access-Control-Allow-Headers"], "Content-Type");
        assert_eq!(resp.headers["Access-Control-Max-Age"], "86400");
        assert!(!resp.headers.contains_key("Content-Type"));
        assert!(resp.body_json().is_err());
    }
}
