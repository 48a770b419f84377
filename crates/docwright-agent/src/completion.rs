use serde::{Deserialize, Serialize};

use crate::{ChatMessage, ToolCall};

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    /// Natural completion
    Stop,
    /// Cut off by the token limit
    Length,
    /// The model requested tool calls
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(s) => s,
        }
    }

    /// Only a natural stop ends the conversation
    pub fn is_terminal(&self) -> bool {
        matches!(self, FinishReason::Stop)
    }
}

impl From<String> for FinishReason {
    fn from(s: String) -> Self {
        match s.as_str() {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Other(s),
        }
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        reason.as_str().to_string()
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool offered to the model: name, description and JSON Schema parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A single completion request
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub temperature: f32,
    pub messages: &'a [ChatMessage],
    /// `None` when no tools are registered
    pub tools: Option<&'a [ToolDefinition]>,
}

/// The assistant part of a completion response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Backend response, reduced to what the conversation loop needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub finish_reason: Option<FinishReason>,
    /// `None` when the backend produced no message at all
    pub message: Option<AssistantReply>,
}

/// What the model asked for on one turn
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// One or more tool invocations to run before the next turn
    Invocations {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
    /// Free text; final only if the finish reason is terminal
    Answer {
        content: Option<String>,
        finish_reason: Option<FinishReason>,
    },
}

impl AssistantReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    /// Classify the reply. Tool calls take precedence over the finish reason.
    pub fn into_turn(self, finish_reason: Option<FinishReason>) -> ModelTurn {
        if self.tool_calls.is_empty() {
            ModelTurn::Answer {
                content: self.content,
                finish_reason,
            }
        } else {
            ModelTurn::Invocations {
                content: self.content,
                calls: self.tool_calls,
            }
        }
    }
}

impl ModelTurn {
    pub fn is_terminal(&self) -> bool {
        match self {
            ModelTurn::Invocations { .. } => false,
            ModelTurn::Answer { finish_reason, .. } => {
                finish_reason.as_ref().is_some_and(FinishReason::is_terminal)
            }
        }
    }
}

impl ChatResponse {
    pub fn new(finish_reason: FinishReason, message: AssistantReply) -> Self {
        Self {
            finish_reason: Some(finish_reason),
            message: Some(message),
        }
    }
}
