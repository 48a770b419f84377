mod completion;
mod message;
mod openai;
mod traits;

pub use completion::{
    AssistantReply, ChatRequest, ChatResponse, FinishReason, ModelTurn, ToolDefinition,
};
pub use message::{ChatMessage, FunctionCall, Role, ToolCall};
pub use openai::OpenAiBackend;
pub use traits::{BackendConfig, BackendError, ChatBackend, DEFAULT_BASE_URL};

/// Create the default chat backend
pub fn create_backend(config: BackendConfig) -> Result<Box<dyn ChatBackend>, BackendError> {
    Ok(Box::new(OpenAiBackend::new(config)?))
}
