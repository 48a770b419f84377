//! # docwright-git
//!
//! Collects the repository changes that docwright asks the model to
//! document.
//!
//! ## Key Types
//!
//! - [`ChangeCollector`] - Builds a unified patch of working tree changes, or
//!   of the changes between two revisions
//! - [`PathFilter`] - Drops vendored, generated and binary files from the patch
//! - [`DiffSummary`] - File and line counts for a collected patch
//! - [`GitStatus`] - Changed paths grouped by kind
//!
//! ## Patch layout
//!
//! Working tree changes are grouped under `# Staged changes`,
//! `# Unstaged changes` and `# Untracked files` headings. Untracked files
//! appear as full-content additions. Empty sections are omitted, so an empty
//! patch means there is nothing to document.
//!
//! ```rust,ignore
//! use docwright_git::ChangeCollector;
//! use std::path::Path;
//!
//! let changes = ChangeCollector::new().changes(Path::new("."))?;
//! if changes.is_empty() {
//!     println!("Nothing to document");
//! }
//! ```

mod diff;
mod filter;
mod status;

pub use diff::{ChangeCollector, ChangeSet, DiffSummary, GitError};
pub use filter::PathFilter;
pub use status::GitStatus;
