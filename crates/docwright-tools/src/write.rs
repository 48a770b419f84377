use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use docwright_core::{parse_arguments, Capability, CapabilityError};

use crate::resolve_path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteArgs {
    path: String,
    content: String,
    #[serde(default)]
    create_dir: bool,
}

/// Create or overwrite a file
pub struct WriteTool {
    root: PathBuf,
}

impl WriteTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Capability for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write content to a file on the filesystem, replacing any existing content"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file"
                },
                "createDir": {
                    "type": "boolean",
                    "description": "Whether to create parent directories if they do not exist",
                    "default": false
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CapabilityError> {
        let args: WriteArgs = parse_arguments(arguments)?;
        let path = resolve_path(&self.root, &args.path);

        if args.create_dir {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| CapabilityError::Failed(format!("{}: {}", args.path, e)))?;
            }
        }

        fs::write(&path, args.content.as_bytes())
            .await
            .map_err(|e| CapabilityError::Failed(format!("{}: {}", args.path, e)))?;

        debug!(path = %path.display(), bytes = args.content.len(), "Wrote file");

        Ok(json!({
            "path": args.path,
            "bytesWritten": args.content.len(),
        }))
    }
}
