//! Report pipeline
//!
//! Ingests a repository, runs the agent swarm over the serialized corpus and
//! wraps the answer with a timestamp.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::{default_swarm, ChatModel};
use crate::analyzer::{AnalysisResult, RepositoryAnalyzer};
use crate::config::Config;
use crate::error::{DigestError, Result};
use crate::fetcher::GitFetcher;
use crate::prompt::PromptGenerator;

/// Saved result of one full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// RFC 3339, local time
    pub timestamp: String,
    pub repo_url: String,
    pub analysis: String,
}

impl Report {
    pub fn new(repo_url: impl Into<String>, analysis: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            repo_url: repo_url.into(),
            analysis: analysis.into(),
        }
    }

    /// Write as indented JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Results saved to {}", path.display());
        Ok(())
    }
}

/// Build an analyzer wired to the tools named in `config`
pub fn analyzer_from_config(
    url: &str,
    temp_dir: Option<PathBuf>,
    config: &Config,
) -> Result<RepositoryAnalyzer> {
    Ok(RepositoryAnalyzer::new(url, temp_dir)?
        .with_fetcher(GitFetcher::new(&config.tools.git))
        .with_generator(PromptGenerator::new(&config.tools.renderer)))
}

/// Serialize an analysis result as the swarm's task, rejecting empty corpora
pub fn corpus_task(result: &AnalysisResult) -> Result<String> {
    if result.is_empty() {
        return Err(DigestError::EmptyResult);
    }
    result.to_json_pretty()
}

/// Run the agent swarm over an already-analyzed repository
pub fn summarize(
    url: &str,
    result: &AnalysisResult,
    model: Arc<dyn ChatModel>,
    retry_attempts: u32,
) -> Result<Report> {
    let task = corpus_task(result)?;
    let swarm = default_swarm(model, retry_attempts);
    let analysis = swarm.run(&task)?;
    Ok(Report::new(url, analysis))
}

/// Clone, analyze and summarize `url`
pub fn generate_report(
    analyzer: RepositoryAnalyzer,
    model: Arc<dyn ChatModel>,
    config: &Config,
) -> Result<Report> {
    let url = analyzer.url().to_string();
    let result = analyzer.analyze()?;
    summarize(&url, &result, model, config.model.retry_attempts)
}
