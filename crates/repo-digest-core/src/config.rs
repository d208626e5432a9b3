use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::{ModelConfig, Provider};
use crate::error::{DigestError, Result};

const CONFIG_FILE: &str = "config.toml";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# repo-digest configuration file
# Location: ~/.repo-digest/config.toml

[tools]
# Version-control client used to clone repositories
git = "git"

# External prompt renderer, invoked as `<renderer> <file> --output=<file>`.
# When it is not installed, files are read as plain UTF-8 text instead.
renderer = "code2prompt"

[model]
# "openai" (chat completions over HTTP) or "command" (CLI reading stdin)
provider = "openai"
name = "gpt-4o-mini"
temperature = 0.1

# Environment variable holding the API key (a .env file is honored)
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.openai.com/v1"

# Program run with `--print` when provider = "command"
command = "claude"

# Total attempts per agent call
retry_attempts = 3

[output]
# Where `repo-digest report` writes its result
path = "analysis_results.json"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// External programs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_git")]
    pub git: String,

    #[serde(default = "default_renderer")]
    pub renderer: String,
}

fn default_git() -> String {
    "git".to_string()
}

fn default_renderer() -> String {
    "code2prompt".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: default_git(),
            renderer: default_renderer(),
        }
    }
}

/// Report output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("analysis_results.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

const KEYS: &[&str] = &[
    "tools.git",
    "tools.renderer",
    "model.provider",
    "model.name",
    "model.temperature",
    "model.api_key_env",
    "model.base_url",
    "model.command",
    "model.retry_attempts",
    "output.path",
];

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| DigestError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "tools.git" => self.tools.git.clone(),
            "tools.renderer" => self.tools.renderer.clone(),
            "model.provider" => self.model.provider.as_str().to_string(),
            "model.name" => self.model.name.clone(),
            "model.temperature" => self.model.temperature.to_string(),
            "model.api_key_env" => self.model.api_key_env.clone(),
            "model.base_url" => self.model.base_url.clone(),
            "model.command" => self.model.command.clone(),
            "model.retry_attempts" => self.model.retry_attempts.to_string(),
            "output.path" => self.output.path.display().to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || DigestError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let trimmed = value.trim();

        match key {
            "tools.git" => self.tools.git = trimmed.to_string(),
            "tools.renderer" => self.tools.renderer = trimmed.to_string(),
            "model.provider" => self.model.provider = Provider::parse(trimmed).ok_or_else(invalid)?,
            "model.name" => self.model.name = trimmed.to_string(),
            "model.temperature" => {
                let temperature: f32 = trimmed.parse().map_err(|_| invalid())?;
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(invalid());
                }
                self.model.temperature = temperature;
            }
            "model.api_key_env" => self.model.api_key_env = trimmed.to_string(),
            "model.base_url" => self.model.base_url = trimmed.to_string(),
            "model.command" => self.model.command = trimmed.to_string(),
            "model.retry_attempts" => {
                let attempts: u32 = trimmed.parse().map_err(|_| invalid())?;
                if attempts == 0 {
                    return Err(invalid());
                }
                self.model.retry_attempts = attempts;
            }
            "output.path" => self.output.path = PathBuf::from(trimmed),
            _ => {
                return Err(DigestError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }

        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }
}
