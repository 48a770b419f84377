mod capability;
mod context;
mod dispatcher;
mod error;
mod loop_runner;
mod outcome;

pub use capability::{parse_arguments, Capability, CapabilityError, CapabilityRegistry};
pub use context::{
    ChatContext, LoopConfig, Transcript, DEFAULT_MAX_TURNS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
pub use dispatcher::{Dispatcher, InvocationError, InvocationOutput, InvocationResult};
pub use error::LoopError;
pub use loop_runner::{ChatLoop, NO_CONTENT_PLACEHOLDER};
pub use outcome::ChatOutcome;
