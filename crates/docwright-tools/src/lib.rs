//! Filesystem capabilities the model uses to inspect and edit a project.
//!
//! Every tool is rooted at a directory given at construction; relative paths
//! in arguments resolve against it.

mod ls;
mod read;
mod tree;
mod write;

use std::path::{Path, PathBuf};

use docwright_core::CapabilityRegistry;

pub use ls::LsTool;
pub use read::{ReadTool, MAX_READ_SIZE};
pub use tree::{TreeTool, DEFAULT_TREE_DEPTH};
pub use write::WriteTool;

/// Register `read`, `write`, `ls` and `tree`, all rooted at `root`
pub fn register_builtin(registry: &mut CapabilityRegistry, root: impl AsRef<Path>) {
    let root = root.as_ref();
    registry.register(ReadTool::new(root));
    registry.register(WriteTool::new(root));
    registry.register(LsTool::new(root));
    registry.register(TreeTool::new(root));
}

/// Resolve a tool argument path against the tool root
pub(crate) fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
