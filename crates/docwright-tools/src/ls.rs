use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::PathBuf;
use tokio::fs;

use docwright_core::{parse_arguments, Capability, CapabilityError};

use crate::{is_hidden, resolve_path};

#[derive(Debug, Deserialize)]
struct LsArgs {
    #[serde(default = "default_path")]
    path: String,
    #[serde(default)]
    all: bool,
    #[serde(default)]
    long: bool,
}

fn default_path() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
enum EntryType {
    Directory,
    File,
}

#[derive(Debug, Serialize)]
struct LsEntry {
    name: String,
    #[serde(rename = "type")]
    entry_type: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<String>,
}

impl LsEntry {
    fn new(name: String, metadata: &Metadata, long: bool) -> Self {
        let entry_type = if metadata.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        };

        if !long {
            return Self {
                name,
                entry_type,
                size: None,
                modified: None,
                permissions: None,
            };
        }

        Self {
            name,
            entry_type,
            size: Some(metadata.len()),
            modified: metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Millis, true)),
            permissions: permissions(metadata),
        }
    }
}

#[cfg(unix)]
fn permissions(metadata: &Metadata) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;
    Some(format!("{:o}", metadata.permissions().mode()))
}

#[cfg(not(unix))]
fn permissions(_metadata: &Metadata) -> Option<String> {
    None
}

/// List the entries of one directory
pub struct LsTool {
    root: PathBuf,
}

impl LsTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Capability for LsTool {
    fn name(&self) -> &str {
        "ls"
    }

    fn description(&self) -> &str {
        "List directory contents"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory path to list (defaults to the project directory)"
                },
                "all": {
                    "type": "boolean",
                    "description": "Include hidden files and directories (default: false)"
                },
                "long": {
                    "type": "boolean",
                    "description": "Include size, modification time and permissions (default: false)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CapabilityError> {
        let args: LsArgs = parse_arguments(arguments)?;
        let path = resolve_path(&self.root, &args.path);

        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| CapabilityError::Failed(format!("{}: {}", args.path, e)))?;
        if !metadata.is_dir() {
            return Err(CapabilityError::Failed("Path is not a directory".to_string()));
        }

        let mut entries = fs::read_dir(&path)
            .await
            .map_err(|e| CapabilityError::Failed(format!("{}: {}", args.path, e)))?;

        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !args.all && is_hidden(&name) {
                continue;
            }

            // Follow symlinks; dangling ones fall back to the link itself
            let metadata = match fs::metadata(entry.path()).await {
                Ok(m) => m,
                Err(_) => entry.metadata().await?,
            };
            items.push(LsEntry::new(name, &metadata, args.long));
        }

        items.sort_by(|a, b| match a.entry_type.cmp(&b.entry_type) {
            Ordering::Equal => a.name.cmp(&b.name),
            other => other,
        });

        Ok(json!({ "items": serde_json::to_value(items)? }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "bb").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        dir
    }

    fn names(result: &Value) -> Vec<&str> {
        result["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_ls_directories_first_then_name() {
        let dir = fixture();
        let tool = LsTool::new(dir.path());

        let result = tool.execute(json!({})).await.unwrap();

        assert_eq!(names(&result), vec!["docs", "src", "a.txt", "b.txt"]);
        assert_eq!(result["items"][0], json!({"name": "docs", "type": "directory"}));
        assert_eq!(result["items"][2], json!({"name": "a.txt", "type": "file"}));
    }

    #[tokio::test]
    async fn test_ls_all_includes_hidden() {
        let dir = fixture();
        let tool = LsTool::new(dir.path());

        let result = tool.execute(json!({"all": true})).await.unwrap();

        assert_eq!(names(&result), vec!["docs", "src", ".env", "a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_ls_long_format() {
        let dir = fixture();
        let tool = LsTool::new(dir.path());

        let result = tool.execute(json!({"long": true})).await.unwrap();
        let b = &result["items"][3];

        assert_eq!(b["name"], "b.txt");
        assert_eq!(b["size"], 2);
        let modified = b["modified"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(modified).is_ok());
        #[cfg(unix)]
        assert!(b["permissions"].as_str().unwrap().starts_with("100"));
    }

    #[tokio::test]
    async fn test_ls_subdirectory_and_file_path() {
        let dir = fixture();
        std::fs::write(dir.path().join("docs/guide.md"), "# Guide").unwrap();
        let tool = LsTool::new(dir.path());

        let result = tool.execute(json!({"path": "docs"})).await.unwrap();
        assert_eq!(names(&result), vec!["guide.md"]);

        let err = tool.execute(json!({"path": "a.txt"})).await.unwrap_err();
        assert_eq!(err.to_string(), "Path is not a directory");
    }
}
