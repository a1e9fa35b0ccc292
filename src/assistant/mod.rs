//! Chat assistant that can act on the signed-in account's data through a
//! small set of tools.

pub mod gemini;
pub mod tools;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::client::StateContainer;

/// Tool rounds allowed for a single user message
pub const MAX_TOOL_ROUNDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatPart {
    Text(String),
    FunctionCall { name: String, args: Value },
    FunctionResponse { name: String, response: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub parts: Vec<ChatPart>,
}

impl ChatTurn {
    pub fn user_text(text: &str) -> Self {
        ChatTurn {
            role: ChatRole::User,
            parts: vec![ChatPart::Text(text.to_string())],
        }
    }

    pub fn model_text(text: &str) -> Self {
        ChatTurn {
            role: ChatRole::Model,
            parts: vec![ChatPart::Text(text.to_string())],
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ChatPart::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn function_calls(&self) -> Vec<(&str, &Value)> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ChatPart::FunctionCall { name, args } => Some((name.as_str(), args)),
                _ => None,
            })
            .collect()
    }
}

/// Function the model may call, described with a JSON schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug)]
pub enum AssistantError {
    NotConfigured(String),
    Network(String),
    Api { status: u16, message: String },
    InvalidResponse(String),
    TooManyToolRounds,
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantError::NotConfigured(msg) => write!(f, "Assistant not configured: {}", msg),
            AssistantError::Network(msg) => write!(f, "Network error: {}", msg),
            AssistantError::Api { status, message } => write!(f, "Model API error {}: {}", status, message),
            AssistantError::InvalidResponse(msg) => write!(f, "Invalid model response: {}", msg),
            AssistantError::TooManyToolRounds => {
                write!(f, "Model kept calling tools after {} rounds", MAX_TOOL_ROUNDS)
            }
        }
    }
}

impl std::error::Error for AssistantError {}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AssistantError::InvalidResponse(e.to_string())
        } else {
            AssistantError::Network(e.to_string())
        }
    }
}

/// A chat model that supports function calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model's next turn for the conversation so far.
    async fn generate(
        &self,
        system: &str,
        history: &[ChatTurn],
        tools: &[ToolDeclaration],
    ) -> Result<ChatTurn, AssistantError>;
}

/// One conversation with the model. Tool calls run against the state
/// container, so their changes are saved like any other edit.
pub struct ChatAssistant {
    model: Arc<dyn ChatModel>,
    state: StateContainer,
    tools: Vec<ToolDeclaration>,
    history: Vec<ChatTurn>,
}

impl ChatAssistant {
    pub fn new(model: Arc<dyn ChatModel>, state: StateContainer) -> Self {
        ChatAssistant {
            model,
            state,
            tools: tools::declarations(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn system_prompt(&self) -> String {
        let business = self.state.read(|doc| doc.business_profile.name.trim().to_string());
        let business = if business.is_empty() { "a small business".to_string() } else { business };
        format!(
            "You are the scheduling assistant of {}. Today is {}. \
             Use the tools to look up statistics, add clients and book appointments. \
             Dates are YYYY-MM-DD and times HH:MM. Answer briefly.",
            business,
            chrono::Local::now().format("%Y-%m-%d"),
        )
    }

    /// Sends a user message and returns the model's final text. Tool changes
    /// already applied stay applied when a later model call fails.
    pub async fn send_message(&mut self, text: &str) -> Result<String, AssistantError> {
        let system = self.system_prompt();
        self.history.push(ChatTurn::user_text(text));

        let mut rounds = 0;
        loop {
            let reply = self.model.generate(&system, &self.history, &self.tools).await?;
            self.history.push(reply.clone());

            let calls = reply.function_calls();
            if calls.is_empty() {
                return Ok(reply.text());
            }
            if rounds == MAX_TOOL_ROUNDS {
                log::warn!("⚠️  Assistant stopped after {} tool rounds", rounds);
                return Err(AssistantError::TooManyToolRounds);
            }
            rounds += 1;

            let parts = calls
                .into_iter()
                .map(|(name, args)| {
                    log::info!("🤖 Tool call {} {}", name, args);
                    ChatPart::FunctionResponse {
                        name: name.to_string(),
                        response: tools::run_tool(&self.state, name, args),
                    }
                })
                .collect();
            self.history.push(ChatTurn { role: ChatRole::User, parts });
        }
    }
}
