use std::time::{Duration, Instant};
use tracing::warn;

use docwright_agent::ChatMessage;

pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Settings fixed for the lifetime of a conversation loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// System directive placed first in every transcript
    pub system_prompt: String,
    pub model: String,
    pub temperature: f32,
    /// Maximum model round-trips per chat (None = unlimited)
    pub max_turns: Option<usize>,
}

impl LoopConfig {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_turns: Some(DEFAULT_MAX_TURNS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Ordered, append-only message history. Always starts with exactly one
/// system message.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(
        system_prompt: &str,
        history: impl IntoIterator<Item = ChatMessage>,
        user_message: &str,
    ) -> Self {
        let mut transcript = Self {
            messages: vec![ChatMessage::system(system_prompt)],
        };
        for message in history {
            transcript.push(message);
        }
        transcript.push(ChatMessage::user(user_message));
        transcript
    }

    /// Append a message. Additional system messages are dropped.
    pub fn push(&mut self, message: ChatMessage) {
        if matches!(message, ChatMessage::System { .. }) {
            warn!("Dropping extra system message from transcript");
            return;
        }
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

/// Mutable state of one `chat` call
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub transcript: Transcript,
    /// Model round-trips started so far
    pub turn: usize,
    /// Tool invocations executed so far
    pub invocations: usize,
    pub max_turns: Option<usize>,
    started_at: Instant,
}

impl ChatContext {
    pub fn new(transcript: Transcript, max_turns: Option<usize>) -> Self {
        Self {
            transcript,
            turn: 0,
            invocations: 0,
            max_turns,
            started_at: Instant::now(),
        }
    }

    pub fn increment_turn(&mut self) {
        self.turn += 1;
    }

    pub fn should_continue(&self) -> bool {
        match self.max_turns {
            Some(max) => self.turn < max,
            None => true,
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }
}
