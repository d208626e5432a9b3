//! Repository Analyzer
//!
//! Clone -> classify -> render -> tree, inside a workspace that is removed on
//! every exit path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::classify;
use crate::error::Result;
use crate::fetcher::{GitFetcher, RepositoryFetcher};
use crate::prompt::{PromptGenerator, PromptMap};
use crate::tree::{build_tree, FileTree};
use crate::workspace::Workspace;

/// Everything the ingestion core produces for one repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub filetree: FileTree,
    pub doc: PromptMap,
    pub code: PromptMap,
}

impl AnalysisResult {
    /// True when neither code nor documentation produced any entry
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty() && self.code.is_empty()
    }

    /// Indented UTF-8 JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One-shot analyzer for a single repository URL
pub struct RepositoryAnalyzer {
    url: String,
    workspace: Workspace,
    fetcher: Box<dyn RepositoryFetcher>,
    generator: PromptGenerator,
}

impl RepositoryAnalyzer {
    /// Create an analyzer with `git` and the default renderer. A fresh
    /// workspace is allocated unless `temp_dir` is given.
    pub fn new(url: impl Into<String>, temp_dir: Option<PathBuf>) -> Result<Self> {
        let url = url.into();
        let workspace = Workspace::from_option(temp_dir)?;
        debug!("Initialized analyzer with repo: {}", url);
        debug!("Using temporary directory: {}", workspace.path().display());

        Ok(Self {
            url,
            workspace,
            fetcher: Box::new(GitFetcher::default()),
            generator: PromptGenerator::default(),
        })
    }

    pub fn with_fetcher(mut self, fetcher: impl RepositoryFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_generator(mut self, generator: PromptGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Run the whole ingestion. Consumes the analyzer; the workspace is
    /// dropped (and removed) when this returns, success or failure.
    pub fn analyze(self) -> Result<AnalysisResult> {
        let workspace_root = self.workspace.path();

        let repo_root = self.fetcher.clone_repository(&self.url, workspace_root)?;
        let files = classify(&repo_root, workspace_root)?;
        info!(
            "Found {} code files and {} doc files",
            files.code.len(),
            files.doc.len()
        );

        let code = self.generator.render(&files.code);
        let doc = self.generator.render(&files.doc);
        let filetree = build_tree(&repo_root);

        Ok(AnalysisResult {
            filetree,
            doc,
            code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestError;
    use crate::tree::TreeEntry;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    /// Writes a fixed set of files into the destination instead of cloning
    struct FixtureFetcher {
        files: Vec<(&'static str, Vec<u8>)>,
        dirs: Vec<&'static str>,
    }

    impl RepositoryFetcher for FixtureFetcher {
        fn clone_repository(&self, _url: &str, destination: &Path) -> Result<PathBuf> {
            fs::create_dir_all(destination)?;
            for dir in &self.dirs {
                fs::create_dir_all(destination.join(dir))?;
            }
            for (path, content) in &self.files {
                let path = destination.join(path);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, content)?;
            }
            Ok(destination.to_path_buf())
        }
    }

    /// Leaves a partial checkout behind, then fails like git would
    struct FailingFetcher;

    impl RepositoryFetcher for FailingFetcher {
        fn clone_repository(&self, url: &str, destination: &Path) -> Result<PathBuf> {
            fs::create_dir_all(destination.join(".git"))?;
            fs::write(destination.join(".git/HEAD"), "partial")?;
            Err(DigestError::Clone {
                url: url.to_string(),
                message: "fatal: repository not found".to_string(),
            })
        }
    }

    fn scenario_fetcher() -> FixtureFetcher {
        FixtureFetcher {
            files: vec![
                ("src/main.py", b"print(1)".to_vec()),
                ("README.md", b"# Title".to_vec()),
                ("logo.png", vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff]),
            ],
            dirs: vec!["dist"],
        }
    }

    fn raw_generator() -> PromptGenerator {
        PromptGenerator::new("repo-digest-no-such-renderer")
    }

    #[test]
    fn test_analyze_scenario() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path().join("ws");

        let analyzer = RepositoryAnalyzer::new("https://example.com/repo.git", Some(ws.clone()))
            .unwrap()
            .with_fetcher(scenario_fetcher())
            .with_generator(raw_generator());
        let result = analyzer.analyze().unwrap();

        let mut src = FileTree::new();
        src.insert(
            "main.py".into(),
            TreeEntry::File(ws.join("src/main.py").to_string_lossy().into_owned()),
        );
        let mut expected_tree = FileTree::new();
        expected_tree.insert("src".into(), TreeEntry::Dir(src));
        expected_tree.insert(
            "README.md".into(),
            TreeEntry::File(ws.join("README.md").to_string_lossy().into_owned()),
        );

        assert_eq!(result.filetree, expected_tree);
        assert_eq!(
            result.code,
            BTreeMap::from([("src/main.py".to_string(), "print(1)".to_string())])
        );
        assert_eq!(
            result.doc,
            BTreeMap::from([("README.md".to_string(), "# Title".to_string())])
        );
        assert!(!ws.exists());
    }

    #[test]
    fn test_workspace_removed_after_success() {
        let analyzer = RepositoryAnalyzer::new("https://example.com/repo.git", None)
            .unwrap()
            .with_fetcher(scenario_fetcher())
            .with_generator(raw_generator());
        let path = analyzer.workspace_path().to_path_buf();
        assert!(path.exists());

        analyzer.analyze().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_removed_after_clone_failure() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path().join("ws");

        let analyzer = RepositoryAnalyzer::new("not a url", Some(ws.clone()))
            .unwrap()
            .with_fetcher(FailingFetcher);
        let err = analyzer.analyze().unwrap_err();

        assert!(matches!(err, DigestError::Clone { .. }));
        assert!(!ws.exists());
    }

    #[test]
    fn test_malformed_url_fails_in_git_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path().join("ws");

        let analyzer = RepositoryAnalyzer::new("definitely-not-a-repository", Some(ws.clone()))
            .unwrap()
            .with_fetcher(GitFetcher::new("repo-digest-no-such-git-binary"));
        let err = analyzer.analyze().unwrap_err();

        assert!(matches!(err, DigestError::Clone { .. }));
        assert!(!ws.exists());
    }

    #[test]
    fn test_result_json_shape() {
        let mut result = AnalysisResult::default();
        assert!(result.is_empty());
        result.doc.insert("README.md".into(), "# Título".into());
        assert!(!result.is_empty());

        let json = result.to_json_pretty().unwrap();
        assert!(json.contains("\"filetree\": {}"));
        assert!(json.contains("# Título"));
        assert!(json.contains('\n'));
    }
}
