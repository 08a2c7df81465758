//! Cell store handler: grid cells, per-cell headers, column names and the
//! full-sync replace.

use serde_json::{json, Map, Value};
use sheetstore_shared::constants::CELL_METHODS;
use sheetstore_shared::{HandlerEvent, HandlerResponse};
use sheetstore_store::{flatten_column_names, ColumnNameMap, NewCell};

use super::{finish, int_query, int_value, parse_body, text_value, Connector};
use crate::error::HandlerError;

const ACTION_GET_COLUMNS: &str = "get_columns";
const ACTION_SYNC_ALL: &str = "sync_all";

/// Entry point for one cell request.
pub fn handle(event: &HandlerEvent, connector: &Connector) -> HandlerResponse {
    let method = event.method();
    if method == "OPTIONS" {
        return HandlerResponse::preflight(CELL_METHODS);
    }

    let outcome = match (method.as_str(), event.query("action")) {
        ("GET", None) => list_cells(event, connector),
        ("GET", Some(ACTION_GET_COLUMNS)) => list_columns(connector),
        ("POST", None) => save_cell(event, connector),
        ("POST", Some(ACTION_SYNC_ALL)) => sync_all(event, connector),
        _ => Err(HandlerError::MethodNotAllowed),
    };

    finish("cells", &method, outcome)
}

fn list_cells(event: &HandlerEvent, connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    let tab_id = int_query(event, "tab_id")?;

    let db = connector.open()?;
    let cells = db.list_cells(tab_id)?;

    Ok(HandlerResponse::ok(json!({ "cells": cells })))
}

fn list_columns(connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    let db = connector.open()?;
    let columns = db.column_name_map()?;

    Ok(HandlerResponse::ok(json!({ "columns": columns })))
}

fn save_cell(event: &HandlerEvent, connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    let body = parse_body(event)?;
    let cell = cell_from_json(&body)?.ok_or_else(|| {
        HandlerError::validation("tab_id, row_index, col_index required")
    })?;

    let db = connector.open()?;
    let stored = db.upsert_cell(&cell)?;

    Ok(HandlerResponse::ok(json!({ "cell": stored })))
}

fn sync_all(event: &HandlerEvent, connector: &Connector) -> Result<HandlerResponse, HandlerError> {
    let body = parse_body(event)?;

    let cells = match body.get("cells") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let fields = item
                    .as_object()
                    .ok_or_else(|| HandlerError::validation("cells must be a list of objects"))?;
                cell_from_json(fields)?.ok_or_else(|| {
                    HandlerError::validation("each cell requires tab_id, row_index, col_index")
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(HandlerError::validation("cells must be a list")),
    };

    let columns = match body.get("column_names") {
        None | Some(Value::Null) => ColumnNameMap::new(),
        Some(value) => column_map_from_json(value)?,
    };

    let mut db = connector.open()?;
    let summary = db.replace_all(&cells, &flatten_column_names(&columns))?;

    tracing::info!(
        cells = summary.cells_saved,
        columns = summary.columns_saved,
        "sheet synced"
    );

    Ok(HandlerResponse::ok(json!({
        "success": true,
        "cells_saved": summary.cells_saved,
        "columns_saved": summary.columns_saved,
    })))
}

/// Read one cell from a JSON object. `Ok(None)` if a coordinate is missing.
fn cell_from_json(fields: &Map<String, Value>) -> Result<Option<NewCell>, HandlerError> {
    let tab_id = int_value(fields.get("tab_id"), "tab_id")?;
    let row_index = int_value(fields.get("row_index"), "row_index")?;
    let col_index = int_value(fields.get("col_index"), "col_index")?;

    let (Some(tab_id), Some(row_index), Some(col_index)) = (tab_id, row_index, col_index) else {
        return Ok(None);
    };

    let content = text_value(fields.get("content"), "content")?;
    let header = text_value(fields.get("header"), "header")?;

    Ok(Some(NewCell::new(tab_id, row_index, col_index, content).with_header(header)))
}

/// Read `{"<tab_id>": {"<col_index>": "<name>"}}`.
fn column_map_from_json(value: &Value) -> Result<ColumnNameMap, HandlerError> {
    let invalid_shape = || HandlerError::validation("column_names must map tab ids to column maps");
    let invalid_key = || HandlerError::validation("column_names keys must be integers");

    let tabs = value.as_object().ok_or_else(invalid_shape)?;

    let mut map = ColumnNameMap::new();
    for (tab_key, columns) in tabs {
        let tab_id = tab_key.trim().parse::<i64>().map_err(|_| invalid_key())?;
        let columns = columns.as_object().ok_or_else(invalid_shape)?;

        let names = map.entry(tab_id).or_default();
        for (col_key, name) in columns {
            let col_index = col_key.trim().parse::<i64>().map_err(|_| invalid_key())?;
            names.insert(col_index, text_value(Some(name), "column name")?);
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{broken_connector, temp_connector};

    fn post(body: Value) -> HandlerEvent {
        HandlerEvent::new("POST").with_body(body.to_string())
    }

    fn get_tab(tab_id: i64) -> HandlerEvent {
        HandlerEvent::new("GET").with_query("tab_id", tab_id.to_string())
    }

    fn sync(body: Value) -> HandlerEvent {
        post(body).with_query("action", ACTION_SYNC_ALL)
    }

    #[test]
    fn test_options_preflight() {
        // no database needed for a preflight
        let (connector, _dir) = broken_connector();
        let resp = handle(&HandlerEvent::new("OPTIONS"), &connector);

        assert_eq!(resp.status_code, 200);
        assert!(resp.body.is_empty());
        assert_eq!(resp.headers["Access-Control-Allow-Methods"], "GET, POST, OPTIONS");
        assert_eq!(resp.headers["Access-Control-Max-Age"], "86400");
    }

    #[test]
    fn test_write_overwrite_read() {
        let (connector, _dir) = temp_connector();

        let resp = handle(
            &post(json!({"tab_id": 1, "row_index": 0, "col_index": 0, "content": "Hello"})),
            &connector,
        );
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body_json().unwrap()["cell"]["content"], "Hello");

        let resp = handle(
            &post(json!({"tab_id": 1, "row_index": 0, "col_index": 0, "content": "World"})),
            &connector,
        );
        assert_eq!(resp.body_json().unwrap()["cell"]["content"], "World");

        let resp = handle(&get_tab(1), &connector);
        assert_eq!(resp.status_code, 200);
        let cells = resp.body_json().unwrap()["cells"].as_array().cloned().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0]["content"], "World");
        assert_eq!(cells[0]["header"], "");
        assert_eq!(cells[0]["row_index"], 0);
    }

    #[test]
    fn test_header_is_stored_and_overwritten() {
        let (connector, _dir) = temp_connector();

        handle(
            &post(json!({"tab_id": 2, "row_index": 1, "col_index": 1, "content": "x", "header": "Top"})),
            &connector,
        );
        let resp = handle(
            &post(json!({"tab_id": 2, "row_index": 1, "col_index": 1, "content": "y"})),
            &connector,
        );

        let cell = &resp.body_json().unwrap()["cell"];
        assert_eq!(cell["content"], "y");
        assert_eq!(cell["header"], "");
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let (connector, _dir) = temp_connector();
        let resp = handle(
            &post(json!({"tab_id": "3", "row_index": "4", "col_index": "5", "content": "ok"})),
            &connector,
        );
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body_json().unwrap()["cell"]["tab_id"], 3);
    }

    #[test]
    fn test_missing_coordinate_is_400() {
        let (connector, _dir) = temp_connector();
        let resp = handle(&post(json!({"tab_id": 1, "row_index": 0})), &connector);

        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.body_json().unwrap()["error"], "tab_id, row_index, col_index required");
    }

    #[test]
    fn test_missing_body_is_400() {
        let (connector, _dir) = temp_connector();
        let resp = handle(&HandlerEvent::new("POST"), &connector);
        assert_eq!(resp.status_code, 400);
    }

    #[test]
    fn test_invalid_tab_query_is_400() {
        let (connector, _dir) = temp_connector();
        let resp = handle(&HandlerEvent::new("GET").with_query("tab_id", "abc"), &connector);
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.body_json().unwrap()["error"], "tab_id must be an integer");
    }

    #[test]
    fn test_get_without_tab_returns_all() {
        let (connector, _dir) = temp_connector();
        for tab in 1..=3 {
            handle(
                &post(json!({"tab_id": tab, "row_index": 0, "col_index": 0, "content": "c"})),
                &connector,
            );
        }

        let resp = handle(&HandlerEvent::new("GET"), &connector);
        assert_eq!(resp.body_json().unwrap()["cells"].as_array().unwrap().len(), 3);

        let resp = handle(&get_tab(2), &connector);
        assert_eq!(resp.body_json().unwrap()["cells"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_sync_all_replaces_everything() {
        let (connector, _dir) = temp_connector();
        handle(
            &post(json!({"tab_id": 9, "row_index": 9, "col_index": 9, "content": "old"})),
            &connector,
        );

        let payload = json!({
            "cells": [
                {"tab_id": 1, "row_index": 0, "col_index": 0, "content": "A", "header": "H"},
                {"tab_id": 1, "row_index": 0, "col_index": 1, "content": ""},
                {"tab_id": 2, "row_index": 5, "col_index": 2, "content": "B"}
            ],
            "column_names": {"1": {"0": "Lesson 1", "1": "Lesson 2"}, "2": {"2": "Other"}}
        });

        let resp = handle(&sync(payload), &connector);
        assert_eq!(resp.status_code, 200);
        let body = resp.body_json().unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["cells_saved"], 2);
        assert_eq!(body["columns_saved"], 3);

        let all = handle(&HandlerEvent::new("GET"), &connector).body_json().unwrap();
        let cells = all["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c["content"] != ""));
        assert!(cells.iter().all(|c| c["tab_id"] != 9));

        let columns = handle(
            &HandlerEvent::new("GET").with_query("action", ACTION_GET_COLUMNS),
            &connector,
        )
        .body_json()
        .unwrap();
        assert_eq!(
            columns["columns"],
            json!({"1": {"0": "Lesson 1", "1": "Lesson 2"}, "2": {"2": "Other"}})
        );
    }

    #[test]
    fn test_sync_all_twice_is_stable() {
        let (connector, _dir) = temp_connector();
        let payload = json!({
            "cells": [{"tab_id": 1, "row_index": 0, "col_index": 0, "content": "A"}],
            "column_names": {"1": {"0": "First"}}
        });

        handle(&sync(payload.clone()), &connector);
        let first = handle(&HandlerEvent::new("GET"), &connector).body_json().unwrap();
        handle(&sync(payload), &connector);
        let second = handle(&HandlerEvent::new("GET"), &connector).body_json().unwrap();

        let contents = |v: &Value| -> Vec<(Value, Value, Value, Value)> {
            v["cells"]
                .as_array()
                .unwrap()
                .iter()
                .map(|c| (c["tab_id"].clone(), c["row_index"].clone(), c["col_index"].clone(), c["content"].clone()))
                .collect()
        };
        assert_eq!(contents(&first), contents(&second));
    }

    #[test]
    fn test_sync_all_counts_stored_rows() {
        let (connector, _dir) = temp_connector();
        let payload = json!({
            "cells": [
                {"tab_id": 1, "row_index": 0, "col_index": 0, "content": "old"},
                {"tab_id": 1, "row_index": 0, "col_index": 0, "content": "new"}
            ]
        });

        let body = handle(&sync(payload), &connector).body_json().unwrap();
        assert_eq!(body["cells_saved"], 1);
        assert_eq!(body["columns_saved"], 0);

        let all = handle(&get_tab(1), &connector).body_json().unwrap();
        assert_eq!(all["cells"].as_array().unwrap().len(), 1);
        assert_eq!(all["cells"][0]["content"], "new");
    }

    #[test]
    fn test_sync_all_empty_payload_clears() {
        let (connector, _dir) = temp_connector();
        handle(
            &post(json!({"tab_id": 1, "row_index": 0, "col_index": 0, "content": "x"})),
            &connector,
        );

        let resp = handle(&sync(json!({})), &connector);
        assert_eq!(resp.status_code, 200);

        let all = handle(&HandlerEvent::new("GET"), &connector).body_json().unwrap();
        assert!(all["cells"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_sync_all_bad_cell_leaves_data_untouched() {
        let (connector, _dir) = temp_connector();
        handle(
            &post(json!({"tab_id": 1, "row_index": 0, "col_index": 0, "content": "keep"})),
            &connector,
        );

        let resp = handle(
            &sync(json!({"cells": [{"tab_id": 1, "content": "no coords"}]})),
            &connector,
        );
        assert_eq!(resp.status_code, 400);

        let all = handle(&get_tab(1), &connector).body_json().unwrap();
        assert_eq!(all["cells"][0]["content"], "keep");
    }

    #[test]
    fn test_sync_all_bad_column_key_is_400() {
        let (connector, _dir) = temp_connector();
        let resp = handle(&sync(json!({"column_names": {"one": {"0": "A"}}})), &connector);
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.body_json().unwrap()["error"], "column_names keys must be integers");
    }

    #[test]
    fn test_unsupported_method_is_405() {
        let (connector, _dir) = temp_connector();
        for method in ["PUT", "DELETE", "PATCH"] {
            let resp = handle(&HandlerEvent::new(method), &connector);
            assert_eq!(resp.status_code, 405);
            assert_eq!(resp.body_json().unwrap()["error"], "Method not allowed");
        }

        let resp = handle(&HandlerEvent::new("GET").with_query("action", "explode"), &connector);
        assert_eq!(resp.status_code, 405);
    }

    #[test]
    fn test_connection_failure_is_500() {
        let (connector, _dir) = broken_connector();
        let resp = handle(&get_tab(1), &connector);

        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
        let message = resp.body_json().unwrap()["error"].as_str().unwrap().to_string();
        assert!(message.starts_with("Database connection failed: "));
    }
}
