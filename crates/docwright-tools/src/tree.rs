use async_trait::async_trait;
use ignore::WalkBuilder;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use docwright_core::{parse_arguments, Capability, CapabilityError};

use crate::resolve_path;

pub const DEFAULT_TREE_DEPTH: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeArgs {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default)]
    show_hidden: bool,
    #[serde(default)]
    dirs_only: bool,
}

/// Render a directory hierarchy, honoring .gitignore
pub struct TreeTool {
    root: PathBuf,
}

impl TreeTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn label(&self, target: &Path) -> String {
        match target.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => target.to_string_lossy().into_owned(),
        }
    }
}

fn render(target: &Path, max_depth: usize, show_hidden: bool, dirs_only: bool) -> String {
    let mut builder = WalkBuilder::new(target);
    builder
        .hidden(!show_hidden)
        .ignore(false)
        .git_global(false)
        .git_exclude(false)
        .require_git(false)
        .max_depth(Some(max_depth))
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| entry.file_name() != ".git");

    let mut out = String::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable tree entry");
                continue;
            }
        };

        let depth = entry.depth();
        if depth == 0 {
            continue;
        }

        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if dirs_only && !is_dir {
            continue;
        }

        out.push_str(&"  ".repeat(depth - 1));
        out.push_str(&entry.file_name().to_string_lossy());
        if is_dir {
            out.push('/');
        }
        out.push('\n');
    }
    out
}

#[async_trait]
impl Capability for TreeTool {
    fn name(&self) -> &str {
        "tree"
    }

    fn description(&self) -> &str {
        "Display directory structure as a tree, skipping files ignored by .gitignore"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory path to display (defaults to the project directory)"
                },
                "maxDepth": {
                    "type": "integer",
                    "description": "Maximum depth to traverse (default: 3, 0 also means default)"
                },
                "showHidden": {
                    "type": "boolean",
                    "description": "Show hidden files and directories (default: false)"
                },
                "dirsOnly": {
                    "type": "boolean",
                    "description": "Show only directories (default: false)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CapabilityError> {
        let args: TreeArgs = parse_arguments(arguments)?;
        let target = resolve_path(&self.root, args.path.as_deref().unwrap_or("."));

        let metadata = fs::metadata(&target)
            .await
            .map_err(|e| CapabilityError::Failed(format!("{}: {}", target.display(), e)))?;
        if !metadata.is_dir() {
            return Err(CapabilityError::Failed("Path is not a directory".to_string()));
        }

        let label = self.label(&target);
        let max_depth = args
            .max_depth
            .filter(|depth| *depth > 0)
            .unwrap_or(DEFAULT_TREE_DEPTH);
        let (show_hidden, dirs_only) = (args.show_hidden, args.dirs_only);

        let body = tokio::task::spawn_blocking(move || {
            render(&target, max_depth, show_hidden, dirs_only)
        })
        .await
        .map_err(|e| CapabilityError::Failed(format!("Tree walk failed: {}", e)))?;

        Ok(json!({ "tree": format!("{}\n{}", label, body) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/lib")).unwrap();
        std::fs::create_dir_all(root.join("target/debug")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(root.join(".gitignore"), "target/\n").unwrap();
        std::fs::write(root.join("README.md"), "# Demo").unwrap();
        std::fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        std::fs::write(root.join("src/lib/mod.rs"), "").unwrap();
        std::fs::write(root.join("target/debug/demo"), "").unwrap();
        dir
    }

    async fn tree(tool: &TreeTool, args: Value) -> String {
        let result = tool.execute(args).await.unwrap();
        result["tree"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_tree_default() {
        let dir = fixture();
        let tool = TreeTool::new(dir.path());

        assert_eq!(
            tree(&tool, json!({})).await,
            ".\nREADME.md\nsrc/\n  lib/\n    mod.rs\n  main.rs\n"
        );
    }

    #[tokio::test]
    async fn test_tree_depth_and_dirs_only() {
        let dir = fixture();
        let tool = TreeTool::new(dir.path());

        assert_eq!(tree(&tool, json!({"maxDepth": 1})).await, ".\nREADME.md\nsrc/\n");
        assert_eq!(
            tree(&tool, json!({"dirsOnly": true})).await,
            ".\nsrc/\n  lib/\n"
        );
    }

    #[tokio::test]
    async fn test_tree_zero_depth_uses_default() {
        let dir = fixture();
        let tool = TreeTool::new(dir.path());

        assert_eq!(
            tree(&tool, json!({"maxDepth": 0})).await,
            tree(&tool, json!({})).await
        );
        assert_eq!(tool.parameters_schema()["properties"]["maxDepth"]["type"], "integer");
    }

    #[tokio::test]
    async fn test_tree_show_hidden_never_shows_git() {
        let dir = fixture();
        let tool = TreeTool::new(dir.path());

        let output = tree(&tool, json!({"showHidden": true, "maxDepth": 1})).await;

        assert_eq!(output, ".\n.gitignore\nREADME.md\nsrc/\n");
    }

    #[tokio::test]
    async fn test_tree_subdirectory_label() {
        let dir = fixture();
        let tool = TreeTool::new(dir.path());

        assert_eq!(
            tree(&tool, json!({"path": "src"})).await,
            "src\nlib/\n  mod.rs\nmain.rs\n"
        );
    }

    #[tokio::test]
    async fn test_tree_rejects_files() {
        let dir = fixture();
        let tool = TreeTool::new(dir.path());

        let err = tool
            .execute(json!({"path": "README.md"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Path is not a directory");
    }
}
