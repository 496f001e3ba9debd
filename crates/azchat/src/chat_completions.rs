use crate::transcript::Transcript;
use crate::{Error, Result};
use async_trait::async_trait;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Low, near-deterministic sampling temperature sent with every turn.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged entry of the conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatCompletionMessage {
    role: Role,
    content: String,
}

impl ChatCompletionMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder, PartialEq)]
#[builder(pattern = "mutable")]
#[builder(setter(into, strip_option))]
#[builder(derive(Debug))]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatCompletionMessage>,
    #[builder(default = "None")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[builder(default = "None")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatCompletionRequest {
    /// Snapshot of the whole transcript with the fixed generation parameters.
    pub fn from_transcript(transcript: &Transcript) -> Result<Self> {
        Ok(ChatCompletionRequestBuilder::default()
            .messages(transcript.messages().to_vec())
            .temperature(DEFAULT_TEMPERATURE)
            .stream(false)
            .build()?)
    }
}

/// The response envelope. Fields the client does not read (errors, content
/// filter results, fingerprints) are kept in `other` so the envelope can be
/// shown as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<ChatCompletionChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Kept as raw JSON so tool-call replies can be echoed back verbatim.
    #[serde(default)]
    pub message: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl ChatCompletionResponse {
    /// Extracts the reply of the first choice.
    ///
    /// When the message carries no `content` (e.g. a tool call), the whole
    /// message object is serialized and returned instead, so a successful
    /// exchange always yields some text.
    pub fn reply_text(&self) -> Result<String> {
        let Some(choice) = self.choices.iter().flatten().next() else {
            return Err(Error::Protocol(format!(
                "No choices in response: {}",
                serde_json::to_string(self)?
            )));
        };

        let empty = Map::new();
        let message = choice.message.as_ref().unwrap_or(&empty);
        match message.get("content") {
            Some(Value::String(content)) => Ok(content.clone()),
            None | Some(Value::Null) => Ok(serde_json::to_string(message)?),
            Some(other) => Ok(serde_json::to_string(other)?),
        }
    }
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;

    /// Sends the transcript as one completion call and returns the reply text.
    async fn complete(&self, transcript: &Transcript) -> Result<String> {
        let request = ChatCompletionRequest::from_transcript(transcript)?;
        let response = self.chat_completions(&request).await?;
        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "completion usage"
            );
        }
        response.reply_text()
    }
}
