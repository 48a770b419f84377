use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use docwright_agent::{ChatMessage, ToolCall};

use crate::{Capability, CapabilityRegistry};

/// Why a single invocation failed. Always contained: it is reported to the
/// model, never propagated out of the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("Tool {0} not found")]
    UnknownCapability(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),
}

/// Outcome of running one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutput {
    Success(Value),
    Failure(InvocationError),
}

/// Result of one invocation, matched back to its request by `id`
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub id: String,
    pub capability: String,
    pub output: InvocationOutput,
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self.output, InvocationOutput::Success(_))
    }

    pub fn error(&self) -> Option<&InvocationError> {
        match &self.output {
            InvocationOutput::Success(_) => None,
            InvocationOutput::Failure(e) => Some(e),
        }
    }

    /// JSON payload shown to the model, always carrying a `success` flag
    pub fn payload(&self) -> Value {
        match &self.output {
            InvocationOutput::Success(Value::Object(map)) => {
                let mut map = map.clone();
                map.entry("success").or_insert(Value::Bool(true));
                Value::Object(map)
            }
            InvocationOutput::Success(other) => json!({"success": true, "result": other}),
            InvocationOutput::Failure(e) => json!({"success": false, "error": e.to_string()}),
        }
    }

    /// Tool-result message for the transcript
    pub fn into_message(self) -> ChatMessage {
        let content = self.payload().to_string();
        ChatMessage::tool(self.id, content)
    }
}

/// Runs a batch of tool calls against a registry.
///
/// Every request yields exactly one result carrying its id; failures of one
/// request never affect its siblings.
pub struct Dispatcher<'a> {
    registry: &'a CapabilityRegistry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a CapabilityRegistry) -> Self {
        Self { registry }
    }

    /// Run all calls in request order
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Vec<InvocationResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.invoke(call).await);
        }
        results
    }

    /// Run a single call
    pub async fn invoke(&self, call: &ToolCall) -> InvocationResult {
        let output = match self.try_invoke(call).await {
            Ok(value) => InvocationOutput::Success(value),
            Err(e) => {
                warn!(tool = call.name(), id = %call.id, error = %e, "Tool invocation failed");
                InvocationOutput::Failure(e)
            }
        };

        InvocationResult {
            id: call.id.clone(),
            capability: call.name().to_string(),
            output,
        }
    }

    async fn try_invoke(&self, call: &ToolCall) -> Result<Value, InvocationError> {
        let capability = self
            .registry
            .resolve(call.name())
            .ok_or_else(|| InvocationError::UnknownCapability(call.name().to_string()))?;

        let arguments = parse_raw_arguments(call.arguments())?;
        check_required(capability, &arguments)?;

        debug!(tool = call.name(), id = %call.id, "Invoking tool");

        capability
            .execute(arguments)
            .await
            .map_err(|e| InvocationError::Execution(e.to_string()))
    }
}

/// Parse the model's raw argument string. An empty string means no arguments.
fn parse_raw_arguments(raw: &str) -> Result<Value, InvocationError> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| InvocationError::InvalidArguments(format!("malformed JSON: {}", e)))?;

    if !value.is_object() {
        return Err(InvocationError::InvalidArguments(
            "expected a JSON object".to_string(),
        ));
    }

    Ok(value)
}

fn check_required(capability: &dyn Capability, arguments: &Value) -> Result<(), InvocationError> {
    let schema = capability.parameters_schema();
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };

    for name in required.iter().filter_map(Value::as_str) {
        if arguments.get(name).map_or(true, Value::is_null) {
            return Err(InvocationError::InvalidArguments(format!(
                "missing required argument '{}'",
                name
            )));
        }
    }

    Ok(())
}
