use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use docwright_agent::{ChatBackend, ChatMessage, ChatRequest, ModelTurn, ToolCall, ToolDefinition};
use docwright_logging::{LogEvent, Logger};

use crate::context::{ChatContext, LoopConfig, Transcript};
use crate::dispatcher::{Dispatcher, InvocationResult};
use crate::error::LoopError;
use crate::outcome::ChatOutcome;
use crate::CapabilityRegistry;

/// Returned when the model finishes with empty or missing content
pub const NO_CONTENT_PLACEHOLDER: &str = "No content returned";

/// Drives the tool-calling conversation with a model backend
pub struct ChatLoop<'a> {
    backend: &'a dyn ChatBackend,
    registry: CapabilityRegistry,
    config: LoopConfig,
    logger: Option<Arc<Logger>>,
    interrupted: Arc<AtomicBool>,
}

impl<'a> ChatLoop<'a> {
    pub fn new(
        backend: &'a dyn ChatBackend,
        registry: CapabilityRegistry,
        config: LoopConfig,
    ) -> Self {
        Self {
            backend,
            registry,
            config,
            logger: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Get a handle to signal interruption
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    fn log(&self, event: LogEvent) {
        if let Some(ref logger) = self.logger {
            logger.log(&event);
        }
    }

    /// Send a user message and return the model's final answer
    pub async fn chat(
        &self,
        message: &str,
        history: Vec<ChatMessage>,
    ) -> Result<String, LoopError> {
        self.run(message, history).await.map(|outcome| outcome.text)
    }

    /// Run the conversation until the model gives a final answer
    pub async fn run(
        &self,
        message: &str,
        history: Vec<ChatMessage>,
    ) -> Result<ChatOutcome, LoopError> {
        let transcript = Transcript::new(&self.config.system_prompt, history, message);
        let mut context = ChatContext::new(transcript, self.config.max_turns);

        let definitions = self.registry.definitions();
        let tools = (!definitions.is_empty()).then_some(definitions.as_slice());

        loop {
            if self.interrupted.load(Ordering::SeqCst) {
                info!(turn = context.turn, "Conversation interrupted");
                return Err(LoopError::Interrupted);
            }

            if !context.should_continue() {
                self.log(LogEvent::MaxTurnsReached {
                    turns: context.turn,
                });
                return Err(LoopError::MaxTurnsReached(context.turn));
            }

            context.increment_turn();

            match self.run_turn(&mut context, tools).await {
                Ok(Some(text)) => {
                    let duration = context.total_duration();
                    self.log(LogEvent::RunCompleted {
                        turns: context.turn,
                        invocations: context.invocations,
                        duration_secs: duration.as_secs_f64(),
                    });
                    return Ok(ChatOutcome::new(
                        text,
                        context.turn,
                        context.invocations,
                        context.transcript.into_messages(),
                        duration,
                    ));
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(turn = context.turn, error = %e, "Conversation failed");
                    self.log(LogEvent::ErrorEncountered {
                        turn: context.turn,
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }
    }

    /// Run one model round-trip.
    /// Returns Some(text) when the model has finished, None to continue.
    async fn run_turn(
        &self,
        context: &mut ChatContext,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Option<String>, LoopError> {
        let turn = context.turn;

        self.log(LogEvent::TurnStarted {
            turn,
            messages: context.transcript.len(),
        });

        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: context.transcript.messages(),
            tools,
        };

        debug!(turn, backend = self.backend.name(), "Requesting completion");
        let response = self.backend.complete(&request).await?;

        let reply = response.message.ok_or(LoopError::NoResponse)?;

        self.log(LogEvent::ModelResponded {
            turn,
            finish_reason: response.finish_reason.as_ref().map(|r| r.to_string()),
            tool_calls: reply.tool_calls.len(),
        });

        let model_turn = reply.into_turn(response.finish_reason);
        let terminal = model_turn.is_terminal();

        match model_turn {
            ModelTurn::Invocations { content, calls } => {
                context
                    .transcript
                    .push(ChatMessage::assistant_with_tools(content, calls.clone()));

                let results = self.apply_invocations(turn, &calls).await;
                context.invocations += results.len();

                for result in results {
                    context.transcript.push(result.into_message());
                }

                Ok(None)
            }
            ModelTurn::Answer { content, .. } if terminal => {
                // Transcript keeps the reply as sent; only the caller sees the placeholder
                context
                    .transcript
                    .push(ChatMessage::assistant_with_tools(content.clone(), Vec::new()));
                let text = content
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| NO_CONTENT_PLACEHOLDER.to_string());
                Ok(Some(text))
            }
            ModelTurn::Answer { finish_reason, .. } => {
                // Cut off or otherwise unfinished: ask again with the same transcript
                let finish_reason = finish_reason.map(|r| r.to_string());
                warn!(turn, finish_reason = ?finish_reason, "Model stopped without finishing");
                self.log(LogEvent::TurnIncomplete {
                    turn,
                    finish_reason,
                });
                Ok(None)
            }
        }
    }

    async fn apply_invocations(&self, turn: usize, calls: &[ToolCall]) -> Vec<InvocationResult> {
        for call in calls {
            self.log(LogEvent::ToolInvoked {
                turn,
                call_id: call.id.clone(),
                tool: call.name().to_string(),
            });
        }

        let results = Dispatcher::new(&self.registry).dispatch(calls).await;

        for result in &results {
            self.log(LogEvent::ToolCompleted {
                turn,
                call_id: result.id.clone(),
                tool: result.capability.clone(),
                success: result.is_success(),
                error: result.error().map(|e| e.to_string()),
            });
        }

        results
    }
}
