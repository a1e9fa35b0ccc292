use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::{AssistantError, ChatModel, ChatPart, ChatRole, ChatTurn, ToolDeclaration};
use crate::config::var;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    function_call: Option<WireFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    function_response: Option<WireFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl From<&ChatPart> for WirePart {
    fn from(part: &ChatPart) -> Self {
        let mut wire = WirePart { text: None, function_call: None, function_response: None };
        match part {
            ChatPart::Text(text) => wire.text = Some(text.clone()),
            ChatPart::FunctionCall { name, args } => {
                wire.function_call = Some(WireFunctionCall { name: name.clone(), args: args.clone() })
            }
            ChatPart::FunctionResponse { name, response } => {
                wire.function_response =
                    Some(WireFunctionResponse { name: name.clone(), response: response.clone() })
            }
        }
        wire
    }
}

impl WirePart {
    /// None for parts this client does not use (inline data, thoughts...)
    fn into_chat_part(self) -> Option<ChatPart> {
        if let Some(call) = self.function_call {
            Some(ChatPart::FunctionCall { name: call.name, args: call.args })
        } else if let Some(response) = self.function_response {
            Some(ChatPart::FunctionResponse { name: response.name, response: response.response })
        } else {
            self.text.map(ChatPart::Text)
        }
    }
}

/// Gemini `generateContent` REST client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, AssistantError> {
        if api_key.trim().is_empty() {
            return Err(AssistantError::NotConfigured("GEMINI_API_KEY is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistantError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(GeminiClient {
            http,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// `GEMINI_API_KEY` (required) and `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self, AssistantError> {
        let api_key = var("GEMINI_API_KEY")
            .ok_or_else(|| AssistantError::NotConfigured("GEMINI_API_KEY is not set".to_string()))?;
        let model = var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self::new(&api_key, &model, Duration::from_secs(30))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(system: &str, history: &[ChatTurn], tools: &[ToolDeclaration]) -> Value {
        let contents: Vec<WireContent> = history
            .iter()
            .map(|turn| WireContent {
                role: Some(match turn.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Model => "model".to_string(),
                }),
                parts: turn.parts.iter().map(WirePart::from).collect(),
            })
            .collect();

        json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": contents,
            "tools": [{ "functionDeclarations": tools }],
        })
    }

    fn parse_response(response: GenerateResponse) -> Result<ChatTurn, AssistantError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::InvalidResponse("No candidates returned".to_string()))?;

        let parts: Vec<ChatPart> = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(WirePart::into_chat_part)
            .collect();

        if parts.is_empty() {
            return Err(AssistantError::InvalidResponse(format!(
                "Empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(ChatTurn { role: ChatRole::Model, parts })
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(
        &self,
        system: &str,
        history: &[ChatTurn],
        tools: &[ToolDeclaration],
    ) -> Result<ChatTurn, AssistantError> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(system, history, tools))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
            };
            log::error!("❌ Gemini returned {}: {}", status, message);
            return Err(AssistantError::Api { status: status.as_u16(), message });
        }

        Self::parse_response(response.json::<GenerateResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tools;

    #[test]
    fn test_request_body_shape() {
        let history = vec![
            ChatTurn::user_text("How many clients?"),
            ChatTurn {
                role: ChatRole::Model,
                parts: vec![ChatPart::FunctionCall { name: "get_business_stats".into(), args: json!({}) }],
            },
            ChatTurn {
                role: ChatRole::User,
                parts: vec![ChatPart::FunctionResponse {
                    name: "get_business_stats".into(),
                    response: json!({ "ok": true }),
                }],
            },
        ];

        let body = GeminiClient::request_body("be brief", &history, &tools::declarations());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], json!("be brief"));
        assert_eq!(body["contents"][0], json!({ "role": "user", "parts": [{ "text": "How many clients?" }] }));
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], json!("get_business_stats"));
        assert_eq!(body["contents"][2]["parts"][0]["functionResponse"]["response"]["ok"], json!(true));
        assert_eq!(body["tools"][0]["functionDeclarations"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_function_call_response() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Booking it." },
                        { "functionCall": { "name": "book_appointment", "args": { "client_name": "Ana" } },
                          "thoughtSignature": "abc" }
                    ]
                },
                "finishReason": "STOP"
            }]
        });
        let turn = GeminiClient::parse_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(turn.text(), "Booking it.");
        assert_eq!(turn.function_calls(), vec![("book_appointment", &json!({ "client_name": "Ana" }))]);

        let empty = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        assert!(matches!(
            GeminiClient::parse_response(serde_json::from_value(empty).unwrap()),
            Err(AssistantError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_endpoint_and_missing_key() {
        let client = GeminiClient::new("k", DEFAULT_MODEL, Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://127.0.0.1:8080/");
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(matches!(
            GeminiClient::new("  ", DEFAULT_MODEL, Duration::from_secs(5)),
            Err(AssistantError::NotConfigured(_))
        ));
    }
}
