use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path};

/// Bytes inspected when sniffing for binary content
const SNIFF_LEN: usize = 8000;

/// Directory or file names that mark generated, vendored or tool state paths
const VENDORED_COMPONENTS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    ".idea",
    ".vscode",
    ".cache",
    ".temp",
    ".tmp",
    "vendor",
    "target",
    ".gradle",
    ".maven",
    ".next",
    ".nuxt",
    ".svelte-kit",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    "venv",
    "env",
    ".venv",
];

const VENDORED_FILES: &[&str] = &[
    ".DS_Store",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

const BINARY_EXTENSIONS: &[&str] = &[
    // executables and objects
    "exe", "dll", "so", "dylib", "bin", "obj", "o", "a", "lib", "class", "jar", "war", "ear",
    // images
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "svg", "webp",
    // audio and video
    "mp3", "mp4", "avi", "mov", "wmv", "flv", "mkv", "wav", "ogg",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // archives
    "zip", "rar", "7z", "tar", "gz", "bz2", "xz",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
];

/// Decides which changed paths are worth showing to the model
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    extra_components: Vec<String>,
}

impl PathFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also exclude paths containing a component with this name
    pub fn with_excluded(mut self, name: impl Into<String>) -> Self {
        self.extra_components.push(name.into());
        self
    }

    /// True for paths under vendored or generated directories, lock files,
    /// logs and dotenv files. `path` is relative to the repository root.
    pub fn is_vendored(&self, path: &Path) -> bool {
        if path.extension().is_some_and(|ext| ext == "log") {
            return true;
        }

        path.components().any(|component| {
            let Component::Normal(name) = component else {
                return false;
            };
            let name = name.to_string_lossy();
            VENDORED_COMPONENTS.contains(&name.as_ref())
                || VENDORED_FILES.contains(&name.as_ref())
                || name.starts_with(".env")
                || self.extra_components.iter().any(|c| *c == name)
        })
    }

    pub fn has_binary_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Binary check for a file on disk. Missing files are judged by
    /// extension alone; unreadable ones count as binary.
    pub fn is_binary(&self, file: &Path) -> bool {
        if self.has_binary_extension(file) {
            return true;
        }

        match sniff_nul(file) {
            Ok(found) => found,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(_) => true,
        }
    }

    /// Whether a changed path should appear in the collected patch
    pub fn includes(&self, workdir: &Path, path: &Path) -> bool {
        !self.is_vendored(path) && !self.is_binary(&workdir.join(path))
    }
}

fn sniff_nul(file: &Path) -> io::Result<bool> {
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    File::open(file)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut buf)?;
    Ok(buf.contains(&0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_vendored_paths() {
        let filter = PathFilter::new();

        for path in [
            "node_modules/left-pad/index.js",
            "web/dist/app.js",
            "target/debug/docwright",
            "yarn.lock",
            "frontend/package-lock.json",
            "logs/server.log",
            ".env",
            ".env.local",
            "python/__pycache__/mod.pyc",
            ".vscode/settings.json",
        ] {
            assert!(filter.is_vendored(Path::new(path)), "{} should be vendored", path);
        }

        for path in ["README.md", "src/main.rs", "docs/environment.md", "builder.rs"] {
            assert!(!filter.is_vendored(Path::new(path)), "{} should be kept", path);
        }
    }

    #[test]
    fn test_extra_exclusions() {
        let filter = PathFilter::new().with_excluded("fixtures");
        assert!(filter.is_vendored(Path::new("tests/fixtures/big.json")));
        assert!(!PathFilter::new().is_vendored(Path::new("tests/fixtures/big.json")));
    }

    #[test]
    fn test_binary_detection() {
        let dir = TempDir::new().unwrap();
        let filter = PathFilter::new();

        std::fs::write(dir.path().join("notes.txt"), "plain text").unwrap();
        std::fs::write(dir.path().join("blob.dat"), b"abc\0def").unwrap();
        std::fs::write(dir.path().join("logo.PNG"), "not really a png").unwrap();

        assert!(!filter.is_binary(&dir.path().join("notes.txt")));
        assert!(filter.is_binary(&dir.path().join("blob.dat")));
        assert!(filter.is_binary(&dir.path().join("logo.PNG")));
    }

    #[test]
    fn test_deleted_files_judged_by_extension() {
        let dir = TempDir::new().unwrap();
        let filter = PathFilter::new();

        assert!(!filter.is_binary(&dir.path().join("gone.md")));
        assert!(filter.is_binary(&dir.path().join("gone.zip")));
    }

    #[test]
    fn test_includes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README.md"), "# Hi").unwrap();
        let filter = PathFilter::new();

        assert!(filter.includes(dir.path(), Path::new("README.md")));
        assert!(!filter.includes(dir.path(), Path::new("dist/README.md")));
        assert!(!filter.includes(dir.path(), Path::new("font.woff2")));
    }
}
