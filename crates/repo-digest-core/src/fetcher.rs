//! Repository Fetcher
//!
//! Clones a remote repository into the workspace.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info, warn};

use crate::error::{DigestError, Result};

/// URL schemes accepted without a warning
pub const KNOWN_SCHEMES: &[&str] = &["http://", "https://", "git://"];

/// Copies a remote repository's working tree into a local directory
pub trait RepositoryFetcher {
    /// Clone `url` into `destination` and return the repository root
    fn clone_repository(&self, url: &str, destination: &Path) -> Result<PathBuf>;
}

/// Best-effort URL check. Unknown schemes are only logged, never rejected.
pub fn has_known_scheme(url: &str) -> bool {
    KNOWN_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// Fetcher backed by the `git` command line client
#[derive(Debug, Clone)]
pub struct GitFetcher {
    program: String,
}

impl GitFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new("git")
    }
}

impl RepositoryFetcher for GitFetcher {
    fn clone_repository(&self, url: &str, destination: &Path) -> Result<PathBuf> {
        if !has_known_scheme(url) {
            warn!("Repository URL {} may not be in a valid format", url);
        }

        info!("Cloning repository: {}", url);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let output = Command::new(&self.program)
            .arg("clone")
            .arg(url)
            .arg(destination)
            .output()
            .map_err(|e| {
                error!("Failed to run {}: {}", self.program, e);
                DigestError::Clone {
                    url: url.to_string(),
                    message: format!("failed to spawn {}: {}", self.program, e),
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("Git clone failed: {}", stderr);
            return Err(DigestError::Clone {
                url: url.to_string(),
                message: stderr,
            });
        }

        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_schemes() {
        assert!(has_known_scheme("https://github.com/user/repo.git"));
        assert!(has_known_scheme("http://example.com/repo"));
        assert!(has_known_scheme("git://example.com/repo.git"));
        assert!(!has_known_scheme("github.com/user/repo"));
        assert!(!has_known_scheme("/local/path"));
        assert!(!has_known_scheme("ssh://git@example.com/repo"));
    }

    #[test]
    fn test_default_program() {
        assert_eq!(GitFetcher::default().program(), "git");
    }

    #[test]
    fn test_missing_program_is_clone_error() {
        let temp = TempDir::new().unwrap();
        let fetcher = GitFetcher::new("repo-digest-no-such-git-binary");

        let err = fetcher
            .clone_repository("https://example.com/repo.git", &temp.path().join("dest"))
            .unwrap_err();

        assert!(matches!(err, DigestError::Clone { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("fake-git");
        fs::write(&script, "#!/bin/sh\necho \"fatal: repository not found\" >&2\nexit 128\n")
            .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let fetcher = GitFetcher::new(script.to_string_lossy());
        let err = fetcher
            .clone_repository("not-a-url", &temp.path().join("dest"))
            .unwrap_err();

        match err {
            DigestError::Clone { url, message } => {
                assert_eq!(url, "not-a-url");
                assert_eq!(message, "fatal: repository not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_returns_destination() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("fake-git");
        // $3 is the destination: `clone <url> <dest>`
        fs::write(&script, "#!/bin/sh\nmkdir -p \"$3\"\necho hi > \"$3/README.md\"\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let dest = temp.path().join("dest");
        let fetcher = GitFetcher::new(script.to_string_lossy());
        let root = fetcher
            .clone_repository("https://example.com/repo.git", &dest)
            .unwrap();

        assert_eq!(root, dest);
        assert!(dest.join("README.md").exists());
    }
}
