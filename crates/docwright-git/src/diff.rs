use git2::{
    Delta, Diff, DiffDelta, DiffFormat, DiffOptions, ErrorCode, Repository, StatusOptions, Tree,
};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::{GitStatus, PathFilter};

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepo(String),

    #[error("Repository has no working directory: {0}")]
    BareRepository(String),

    #[error("Unknown revision: {0}")]
    InvalidRevision(String),

    #[error("Git operation failed: {0}")]
    GitOperationFailed(#[from] git2::Error),
}

/// Summary of diff statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

/// Collected patch text together with its statistics
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub patch: String,
    pub summary: DiffSummary,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.patch.trim().is_empty()
    }
}

#[derive(Default)]
struct PatchText {
    text: String,
    files: BTreeSet<PathBuf>,
    insertions: usize,
    deletions: usize,
}

impl PatchText {
    fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Gathers the changes the model should document
#[derive(Debug, Clone, Default)]
pub struct ChangeCollector {
    filter: PathFilter,
}

impl ChangeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Staged, unstaged and untracked changes as one patch. Empty when there
    /// is nothing to document.
    pub fn collect(&self, working_dir: &Path) -> Result<String, GitError> {
        Ok(self.changes(working_dir)?.patch)
    }

    /// Diff between two revisions
    pub fn collect_between(
        &self,
        working_dir: &Path,
        base: &str,
        head: &str,
    ) -> Result<String, GitError> {
        Ok(self.changes_between(working_dir, base, head)?.patch)
    }

    pub fn summary(&self, working_dir: &Path) -> Result<DiffSummary, GitError> {
        Ok(self.changes(working_dir)?.summary)
    }

    /// Working tree changes split into sections
    pub fn changes(&self, working_dir: &Path) -> Result<ChangeSet, GitError> {
        let repo = open(working_dir)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::BareRepository(working_dir.display().to_string()))?
            .to_path_buf();
        let head = head_tree(&repo)?;

        let staged = repo.diff_tree_to_index(head.as_ref(), None, None)?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        let worktree = repo.diff_index_to_workdir(None, Some(&mut opts))?;

        let staged_paths =
            self.included_paths(&staged, |path| self.filter.includes(&workdir, path));
        let worktree_paths =
            self.included_paths(&worktree, |path| self.filter.includes(&workdir, path));

        let sections = [
            (
                "# Staged changes",
                render(&staged, |d| is_listed(d, &staged_paths))?,
            ),
            (
                "# Unstaged changes",
                render(&worktree, |d| {
                    d.status() != Delta::Untracked && is_listed(d, &worktree_paths)
                })?,
            ),
            (
                "# Untracked files",
                render(&worktree, |d| {
                    d.status() == Delta::Untracked && is_listed(d, &worktree_paths)
                })?,
            ),
        ];

        let change_set = assemble(&sections);
        debug!(
            files = change_set.summary.files_changed,
            patch_bytes = change_set.patch.len(),
            "Collected working tree changes"
        );
        Ok(change_set)
    }

    /// Changes between two revisions. Paths are filtered without reading the
    /// working tree, since it need not match either revision.
    pub fn changes_between(
        &self,
        working_dir: &Path,
        base: &str,
        head: &str,
    ) -> Result<ChangeSet, GitError> {
        let repo = open(working_dir)?;
        let base_tree = rev_tree(&repo, base)?;
        let head_tree = rev_tree(&repo, head)?;

        let diff = repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)?;
        let paths = self.included_paths(&diff, |path| {
            !self.filter.is_vendored(path) && !self.filter.has_binary_extension(path)
        });

        let patch = render(&diff, |d| !d.flags().is_binary() && is_listed(d, &paths))?;

        let change_set = assemble(&[("", patch)]);
        debug!(
            base,
            head,
            files = change_set.summary.files_changed,
            "Collected changes between revisions"
        );
        Ok(change_set)
    }

    /// Capture current working directory status
    pub fn status(&self, working_dir: &Path) -> Result<GitStatus, GitError> {
        let repo = open(working_dir)?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);

        let statuses = repo.statuses(Some(&mut opts))?;

        let mut status = GitStatus::default();

        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let path = path.to_string();
            let st = entry.status();

            if st.is_wt_modified() || st.is_index_modified() {
                status.modified.push(path.clone());
            }
            if st.is_wt_new() {
                status.untracked.push(path.clone());
            }
            if st.is_index_new() {
                status.added.push(path.clone());
            }
            if st.is_wt_deleted() || st.is_index_deleted() {
                status.deleted.push(path);
            }
        }

        debug!(
            modified = status.modified.len(),
            added = status.added.len(),
            deleted = status.deleted.len(),
            untracked = status.untracked.len(),
            "Captured git status"
        );

        Ok(status)
    }

    fn included_paths(&self, diff: &Diff<'_>, keep: impl Fn(&Path) -> bool) -> HashSet<PathBuf> {
        diff.deltas()
            .filter_map(|delta| delta_path(&delta))
            .filter(|path| keep(path))
            .collect()
    }
}

fn open(working_dir: &Path) -> Result<Repository, GitError> {
    Repository::discover(working_dir).map_err(|e| match e.code() {
        ErrorCode::NotFound => GitError::NotARepo(working_dir.display().to_string()),
        _ => GitError::GitOperationFailed(e),
    })
}

/// HEAD's tree, or None before the first commit
fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(GitError::GitOperationFailed(e)),
    }
}

fn rev_tree<'r>(repo: &'r Repository, rev: &str) -> Result<Tree<'r>, GitError> {
    let object = repo
        .revparse_single(rev)
        .map_err(|_| GitError::InvalidRevision(rev.to_string()))?;
    Ok(object.peel_to_tree()?)
}

fn delta_path(delta: &DiffDelta<'_>) -> Option<PathBuf> {
    delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())
        .map(Path::to_path_buf)
}

fn is_listed(delta: &DiffDelta<'_>, paths: &HashSet<PathBuf>) -> bool {
    delta_path(delta).is_some_and(|path| paths.contains(&path))
}

/// Print the deltas accepted by `keep` in unified patch format
fn render(diff: &Diff<'_>, keep: impl Fn(&DiffDelta<'_>) -> bool) -> Result<PatchText, GitError> {
    let mut patch = PatchText::default();

    diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        if !keep(&delta) {
            return true;
        }
        if let Some(path) = delta_path(&delta) {
            patch.files.insert(path);
        }

        match line.origin() {
            '+' => {
                patch.insertions += 1;
                patch.text.push('+');
            }
            '-' => {
                patch.deletions += 1;
                patch.text.push('-');
            }
            ' ' => patch.text.push(' '),
            _ => {}
        }
        patch.text.push_str(&String::from_utf8_lossy(line.content()));

        true
    })?;

    Ok(patch)
}

/// Join non-empty sections, each under its heading when it has one
fn assemble(sections: &[(&str, PatchText)]) -> ChangeSet {
    let mut out = String::new();
    let mut files = BTreeSet::new();
    let mut summary = DiffSummary::default();

    for (heading, patch) in sections {
        if patch.is_empty() {
            continue;
        }
        if !heading.is_empty() {
            out.push_str(heading);
            out.push('\n');
        }
        out.push_str(&patch.text);
        out.push('\n');

        files.extend(patch.files.iter().cloned());
        summary.insertions += patch.insertions;
        summary.deletions += patch.deletions;
    }

    summary.files_changed = files.len();
    ChangeSet {
        patch: out,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Commit, IndexAddOption, Signature};
    use tempfile::TempDir;

    fn init() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn write(dir: &TempDir, path: &str, content: impl AsRef<[u8]>) {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }

    fn stage(repo: &Repository, path: &str) {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
    }

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_clean_repo_has_no_changes() {
        let (dir, repo) = init();
        write(&dir, "README.md", "# Demo\n");
        commit_all(&repo, "initial");

        let changes = ChangeCollector::new().changes(dir.path()).unwrap();
        assert!(changes.is_empty());
        assert_eq!(changes.summary, DiffSummary::default());
    }

    #[test]
    fn test_unstaged_modification() {
        let (dir, repo) = init();
        write(&dir, "src/lib.rs", "pub fn old() {}\n");
        commit_all(&repo, "initial");
        write(&dir, "src/lib.rs", "pub fn new() {}\n");

        let patch = ChangeCollector::new().collect(dir.path()).unwrap();

        assert!(patch.starts_with("# Unstaged changes\n"));
        assert!(patch.contains("-pub fn old() {}"));
        assert!(patch.contains("+pub fn new() {}"));
        assert!(!patch.contains("# Staged changes"));
        assert!(!patch.contains("# Untracked files"));
    }

    #[test]
    fn test_staged_and_untracked_sections() {
        let (dir, repo) = init();
        write(&dir, "README.md", "# Demo\n");
        commit_all(&repo, "initial");

        write(&dir, "README.md", "# Demo\n\nMore.\n");
        stage(&repo, "README.md");
        write(&dir, "notes/todo.md", "hello\n");

        let patch = ChangeCollector::new().collect(dir.path()).unwrap();

        let staged = patch.find("# Staged changes").unwrap();
        let untracked = patch.find("# Untracked files").unwrap();
        assert!(staged < untracked);
        assert!(patch.contains("+More."));
        assert!(patch.contains("notes/todo.md"));
        assert!(patch.contains("+hello"));
        assert!(!patch.contains("# Unstaged changes"));
    }

    #[test]
    fn test_vendored_and_binary_files_excluded() {
        let (dir, repo) = init();
        write(&dir, "README.md", "# Demo\n");
        commit_all(&repo, "initial");

        write(&dir, "node_modules/pkg/index.js", "module.exports = 1;\n");
        write(&dir, "logo.png", "fake image");
        write(&dir, "blob.dat", b"abc\0def");
        write(&dir, "CHANGELOG.md", "- added things\n");

        let changes = ChangeCollector::new().changes(dir.path()).unwrap();

        assert!(changes.patch.contains("CHANGELOG.md"));
        assert!(!changes.patch.contains("node_modules"));
        assert!(!changes.patch.contains("logo.png"));
        assert!(!changes.patch.contains("blob.dat"));
        assert_eq!(changes.summary.files_changed, 1);
    }

    #[test]
    fn test_unborn_head() {
        let (dir, repo) = init();
        write(&dir, "main.rs", "fn main() {}\n");
        stage(&repo, "main.rs");

        let patch = ChangeCollector::new().collect(dir.path()).unwrap();

        assert!(patch.starts_with("# Staged changes\n"));
        assert!(patch.contains("+fn main() {}"));
    }

    #[test]
    fn test_summary_counts_each_file_once() {
        let (dir, repo) = init();
        write(&dir, "a.txt", "one\ntwo\n");
        commit_all(&repo, "initial");

        write(&dir, "a.txt", "one\n2\n");
        stage(&repo, "a.txt");
        write(&dir, "a.txt", "1\n2\n");
        write(&dir, "b.txt", "new\n");

        let summary = ChangeCollector::new().summary(dir.path()).unwrap();

        assert_eq!(
            summary,
            DiffSummary {
                files_changed: 2,
                insertions: 3,
                deletions: 2,
            }
        );
    }

    #[test]
    fn test_collect_between_revisions() {
        let (dir, repo) = init();
        write(&dir, "README.md", "# v1\n");
        commit_all(&repo, "first");
        write(&dir, "README.md", "# v2\n");
        write(&dir, "dist/bundle.js", "minified();\n");
        commit_all(&repo, "second");
        write(&dir, "README.md", "# v3 uncommitted\n");

        let patch = ChangeCollector::new()
            .collect_between(dir.path(), "HEAD~1", "HEAD")
            .unwrap();

        assert!(patch.contains("-# v1"));
        assert!(patch.contains("+# v2"));
        assert!(!patch.contains("v3"));
        assert!(!patch.contains("bundle.js"));
        assert!(patch.starts_with("diff --git"));
    }

    #[test]
    fn test_unknown_revision() {
        let (dir, repo) = init();
        write(&dir, "README.md", "# v1\n");
        commit_all(&repo, "first");

        let err = ChangeCollector::new()
            .collect_between(dir.path(), "no-such-branch", "HEAD")
            .unwrap_err();
        assert!(matches!(err, GitError::InvalidRevision(rev) if rev == "no-such-branch"));
    }

    #[test]
    fn test_status_lists() {
        let (dir, repo) = init();
        write(&dir, "keep.md", "keep\n");
        write(&dir, "gone.md", "gone\n");
        commit_all(&repo, "initial");

        write(&dir, "keep.md", "changed\n");
        std::fs::remove_file(dir.path().join("gone.md")).unwrap();
        write(&dir, "new.md", "new\n");

        let status = ChangeCollector::new().status(dir.path()).unwrap();

        assert_eq!(status.modified, vec!["keep.md"]);
        assert_eq!(status.deleted, vec!["gone.md"]);
        assert_eq!(status.untracked, vec!["new.md"]);
        assert_eq!(status.total_changes(), 3);
        assert!(!status.is_clean());
    }

    #[test]
    fn test_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let err = ChangeCollector::new().collect(dir.path()).unwrap_err();
        assert!(matches!(err, GitError::NotARepo(_)));
    }
}
