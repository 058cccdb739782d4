use anyhow::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::model::llm_decode::{decode_tool_call, ToolCall};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("model returned no choices")]
    NoChoices,

    #[error("model did not call a tool")]
    NoToolCall,

    #[error("unusable tool call: {0}")]
    BadArguments(String),
}

/// Where and how to reach an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL, e.g. `http://localhost:1234/v1`.
    pub endpoint: String,
    pub model: String,
    /// Taken from the environment, never written to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    /// Rewrite facts as prose with a second request.
    pub narrate: bool,
    /// Show the selected tool and raw game result in the chat.
    pub debug: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1".into(),
            model: "local-model".into(),
            api_key: None,
            temperature: 0.7,
            narrate: true,
            debug: false,
        }
    }
}

impl LlmSettings {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }
}

/* ===== Wire types ===== */

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".into(),
            content: content.to_string(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".into(),
            content: content.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallResponse>,
}

#[derive(Deserialize)]
pub struct ToolCallResponse {
    pub function: FunctionCall,
}

#[derive(Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ChatCompletionResponse {
    /// First tool call of the first choice.
    pub fn tool_call(self) -> Result<ToolCall, LlmError> {
        let choice = self.choices.into_iter().next().ok_or(LlmError::NoChoices)?;
        let call = choice
            .message
            .tool_calls
            .into_iter()
            .next()
            .ok_or(LlmError::NoToolCall)?;
        decode_tool_call(&call.function.name, &call.function.arguments)
            .map_err(LlmError::BadArguments)
    }

    pub fn text(self) -> Result<String, LlmError> {
        let choice = self.choices.into_iter().next().ok_or(LlmError::NoChoices)?;
        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

/* ===== Client ===== */

/// The two model calls of a turn.
pub trait LanguageModel: Send {
    fn select_tool(&self, system: &str, tools: &[Value], query: &str) -> Result<ToolCall, LlmError>;
    fn narrate(&self, system: &str, request: &str) -> Result<String, LlmError>;
}

pub struct LlmClient {
    settings: LlmSettings,
    client: Client,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    fn complete(&self, req: &ChatCompletionRequest) -> Result<ChatCompletionResponse, LlmError> {
        let mut builder = self
            .client
            .post(self.settings.url("chat/completions"))
            .timeout(REQUEST_TIMEOUT)
            .json(req);
        if let Some(key) = self.settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send()?;
        if !resp.status().is_success() {
            return Err(LlmError::Status(resp.status()));
        }
        Ok(resp.json::<ChatCompletionResponse>()?)
    }

    fn request(&self, system: &str, user: &str, max_tokens: u32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.settings.temperature,
            max_tokens: Some(max_tokens),
            tools: Vec::new(),
            tool_choice: None,
        }
    }
}

impl LanguageModel for LlmClient {
    fn select_tool(&self, system: &str, tools: &[Value], query: &str) -> Result<ToolCall, LlmError> {
        let mut req = self.request(system, query, 200);
        req.tools = tools.to_vec();
        req.tool_choice = Some("required".into());
        log::debug!("Tool selection prompt:\n{}\n{} tools, query: {}", system, tools.len(), query);

        let call = self.complete(&req)?.tool_call()?;
        log::debug!("Model selected {} {}", call.name, call.arguments);
        Ok(call)
    }

    fn narrate(&self, system: &str, request: &str) -> Result<String, LlmError> {
        let req = self.request(system, request, 150);
        log::debug!("Narration request:\n{}", request);
        self.complete(&req)?.text()
    }
}

pub fn test_connection(settings: &LlmSettings) -> Result<String> {
    let client = Client::new();

    let mut builder = client.get(settings.url("models")).timeout(Duration::from_secs(10));
    if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
        builder = builder.bearer_auth(key);
    }
    let resp: Value = builder.send()?.error_for_status()?.json()?;

    Ok(format!(
        "Connected ({} models available)",
        resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
    ))
}
