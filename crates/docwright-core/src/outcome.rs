use serde::Serialize;
use std::time::Duration;

use docwright_agent::ChatMessage;

/// Result of a completed conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    /// Final answer from the model
    pub text: String,
    pub turns: usize,
    pub invocations: usize,
    /// Full transcript including the final assistant message
    #[serde(skip)]
    pub transcript: Vec<ChatMessage>,
    pub total_duration_secs: f64,
}

impl ChatOutcome {
    pub fn new(
        text: String,
        turns: usize,
        invocations: usize,
        transcript: Vec<ChatMessage>,
        duration: Duration,
    ) -> Self {
        Self {
            text,
            turns,
            invocations,
            transcript,
            total_duration_secs: duration.as_secs_f64(),
        }
    }
}
