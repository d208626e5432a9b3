//! File Classifier
//!
//! Partitions every file under a repository root into code, documentation,
//! or ignored, based only on the file name.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::error::{DigestError, Result};

/// Suffixes that exclude a file from both lists. Checked first.
pub const BINARY_SUFFIXES: &[&str] = &[".pdf", ".png", ".jpg", ".jpeg", ".gif", ".zip", ".tar", ".gz"];

/// Suffixes of source files
pub const CODE_SUFFIXES: &[&str] = &[
    ".py", ".js", ".java", ".cpp", ".go", ".rs", ".swift", ".kt", ".cs", ".toml",
];

/// Suffixes of documentation files
pub const DOC_SUFFIXES: &[&str] = &[".md", ".rst", ".txt"];

/// Exact names of documentation files
pub const DOC_NAMES: &[&str] = &["LICENSE", "CONTRIBUTING", "CODE_OF_CONDUCT"];

/// Bucket a file name falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Code,
    Documentation,
    Ignored,
}

impl Classification {
    /// Classify a bare file name. Binary suffixes win over every other rule,
    /// and code wins over documentation. A suffix match on a doc name also
    /// covers the exact-name case.
    pub fn of(name: &str) -> Self {
        if is_binary_name(name) {
            Self::Ignored
        } else if ends_with_any(name, CODE_SUFFIXES) {
            Self::Code
        } else if ends_with_any(name, DOC_SUFFIXES) || ends_with_any(name, DOC_NAMES) {
            Self::Documentation
        } else {
            Self::Ignored
        }
    }
}

/// True for names excluded as binary content
pub fn is_binary_name(name: &str) -> bool {
    ends_with_any(name, BINARY_SUFFIXES)
}

fn ends_with_any(name: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| name.ends_with(suffix))
}

/// A discovered file, anchored as (workspace root, relative suffix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    root: PathBuf,
    relative: PathBuf,
}

impl FileRecord {
    pub fn new(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            relative: relative.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn absolute(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    /// Key used in prompt maps
    pub fn key(&self) -> String {
        self.relative.to_string_lossy().into_owned()
    }
}

/// Files selected for prompt generation
#[derive(Debug, Clone, Default)]
pub struct ClassifiedFiles {
    pub code: Vec<FileRecord>,
    pub doc: Vec<FileRecord>,
}

/// Walk `repo_root` recursively and classify every file.
///
/// Each record is re-anchored under `workspace_root`, so keys stay consistent
/// however the repository root was reached. Any traversal error aborts the
/// whole classification.
pub fn classify(repo_root: &Path, workspace_root: &Path) -> Result<ClassifiedFiles> {
    let mut files = ClassifiedFiles::default();

    for entry in WalkDir::new(repo_root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            error!("Error finding files: {}", e);
            DigestError::Traversal {
                path: e.path().unwrap_or(repo_root).to_path_buf(),
                message: e.to_string(),
            }
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let relative = path
            .strip_prefix(repo_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(name.to_string()));

        match Classification::of(&name) {
            Classification::Code => {
                info!("Added code file: {}", relative.display());
                files.code.push(FileRecord::new(workspace_root, relative));
            }
            Classification::Documentation => {
                info!("Added doc file: {}", relative.display());
                files.doc.push(FileRecord::new(workspace_root, relative));
            }
            Classification::Ignored => {
                debug!("Skipping file: {}", relative.display());
            }
        }
    }

    Ok(files)
}
