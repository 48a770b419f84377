use thiserror::Error;

/// Fatal errors that end a `chat` call
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Model backend error: {0}")]
    BackendError(#[from] docwright_agent::BackendError),

    #[error("No response from model backend")]
    NoResponse,

    #[error("Reached the maximum of {0} turns without a final answer")]
    MaxTurnsReached(usize),

    #[error("Conversation was interrupted")]
    Interrupted,
}

impl LoopError {
    pub fn exit_code(&self) -> i32 {
        match self {
            LoopError::MaxTurnsReached(_) => 1,
            LoopError::Interrupted => 130,
            _ => 2,
        }
    }
}
