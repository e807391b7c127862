//! Project file discovery: gitignore-respecting, `.java`-only. Based on
//! `core::walker::FileWalker`, narrowed to a single extension and with the
//! vendor-directory skip list trimmed to what a Java tree actually grows.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

const SKIP_DIRS: &[&str] = &["target", "build", ".gradle", "out", "bin"];

pub struct FileWalker {
    root: PathBuf,
}

impl FileWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn find_java_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("java") {
                continue;
            }
            if is_in_skipped_dir(path, &self.root) {
                continue;
            }
            debug!(file = %path.display(), "discovered java source file");
            files.push(path.to_path_buf());
        }
        files.sort();
        files
    }
}

fn is_in_skipped_dir(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| {
            let s = c.as_os_str().to_string_lossy();
            SKIP_DIRS.contains(&s.as_ref())
        })
}
