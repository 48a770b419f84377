use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::fs;

use docwright_core::{parse_arguments, Capability, CapabilityError};

use crate::resolve_path;

/// Largest file `read` will return (1 MiB)
pub const MAX_READ_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ReadArgs {
    path: String,
}

/// Return the UTF-8 contents of a file
pub struct ReadTool {
    root: PathBuf,
}

impl ReadTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Capability for ReadTool {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file from the filesystem"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CapabilityError> {
        let args: ReadArgs = parse_arguments(arguments)?;
        let path = resolve_path(&self.root, &args.path);

        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| CapabilityError::Failed(format!("{}: {}", args.path, e)))?;

        if metadata.is_dir() {
            return Err(CapabilityError::Failed(format!(
                "{}: Path is a directory",
                args.path
            )));
        }

        if metadata.len() > MAX_READ_SIZE {
            return Err(CapabilityError::Failed(format!(
                "{}: File too large ({} bytes, max {})",
                args.path,
                metadata.len(),
                MAX_READ_SIZE
            )));
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| CapabilityError::Failed(format!("{}: {}", args.path, e)))?;

        Ok(json!({ "content": content }))
    }
}
