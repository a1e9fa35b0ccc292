use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::ToolDeclaration;
use crate::client::{ClientError, StateContainer};
use crate::models::{BookingRequest, NewClient};

pub const GET_BUSINESS_STATS: &str = "get_business_stats";
pub const ADD_CLIENT: &str = "add_client";
pub const BOOK_APPOINTMENT: &str = "book_appointment";

pub fn declarations() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration {
            name: GET_BUSINESS_STATS.to_string(),
            description: "Counts of clients and appointments by status, upcoming and today's \
                          appointments, and the average rating."
                .to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        },
        ToolDeclaration {
            name: ADD_CLIENT.to_string(),
            description: "Adds a client to the client list.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Full name" },
                    "email": { "type": "string" },
                    "phone": { "type": "string" },
                    "notes": { "type": "string" }
                },
                "required": ["name"]
            }),
        },
        ToolDeclaration {
            name: BOOK_APPOINTMENT.to_string(),
            description: "Books an appointment. An unknown client name creates the client."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "client_name": { "type": "string" },
                    "client_email": { "type": "string" },
                    "client_phone": { "type": "string" },
                    "date": { "type": "string", "description": "YYYY-MM-DD" },
                    "time": { "type": "string", "description": "HH:MM, 24h" },
                    "notes": { "type": "string" }
                },
                "required": ["client_name", "date", "time"]
            }),
        },
    ]
}

fn args<T: DeserializeOwned>(args: &Value) -> Result<T, String> {
    // Models send `null` for tools without parameters
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))
}

fn failure(message: impl std::fmt::Display) -> Value {
    json!({ "ok": false, "error": message.to_string() })
}

/// Runs a tool against the container. Errors come back as
/// `{"ok": false, "error": ...}` for the model to read.
pub fn run_tool(state: &StateContainer, name: &str, raw_args: &Value) -> Value {
    let result: Result<Value, String> = match name {
        GET_BUSINESS_STATS => Ok(json!({ "ok": true, "stats": state.stats() })),
        ADD_CLIENT => args::<NewClient>(raw_args).and_then(|input| {
            state
                .add_client(input)
                .map(|client| json!({ "ok": true, "client": client }))
                .map_err(|e: ClientError| e.to_string())
        }),
        BOOK_APPOINTMENT => args::<BookingRequest>(raw_args).and_then(|request| {
            state
                .book_appointment(request)
                .map(|booking| {
                    json!({
                        "ok": true,
                        "appointment": booking.appointment,
                        "created_client": booking.created_client,
                    })
                })
                .map_err(|e| e.to_string())
        }),
        other => Err(format!("Unknown tool '{}'", other)),
    };

    result.unwrap_or_else(|e| {
        log::warn!("⚠️  Tool {} failed: {}", name, e);
        failure(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeBackend;
    use crate::client::LocalStore;
    use std::sync::Arc;
    use std::time::Duration;

    async fn loaded_state(dir: &tempfile::TempDir) -> StateContainer {
        let state = StateContainer::new(
            Arc::new(FakeBackend::default()),
            LocalStore::new(dir.path()),
            "owner@x.com",
            None,
            Duration::from_millis(1500),
        )
        .unwrap();
        state.load_once().await;
        state
    }

    #[tokio::test]
    async fn test_booking_tool_creates_client_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_state(&dir).await;

        let result = run_tool(
            &state,
            BOOK_APPOINTMENT,
            &json!({ "client_name": "Carla", "date": "2026-07-01", "time": "14:00" }),
        );
        assert_eq!(result["ok"], json!(true));
        assert_eq!(result["created_client"]["name"], json!("Carla"));

        let stats = run_tool(&state, GET_BUSINESS_STATS, &Value::Null);
        assert_eq!(stats["stats"]["total_clients"], json!(1));
        assert_eq!(stats["stats"]["total_appointments"], json!(1));
    }

    #[tokio::test]
    async fn test_tool_errors_are_reported_to_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_state(&dir).await;

        let bad_date = run_tool(
            &state,
            BOOK_APPOINTMENT,
            &json!({ "client_name": "Carla", "date": "tomorrow", "time": "14:00" }),
        );
        assert_eq!(bad_date["ok"], json!(false));
        assert!(bad_date["error"].as_str().unwrap().contains("YYYY-MM-DD"));

        let missing_name = run_tool(&state, ADD_CLIENT, &json!({ "phone": "1" }));
        assert_eq!(missing_name["ok"], json!(false));

        let unknown = run_tool(&state, "delete_everything", &json!({}));
        assert_eq!(unknown["error"], json!("Unknown tool 'delete_everything'"));
        assert!(state.snapshot().clients.is_empty());
    }
}
