use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("git clone failed for {url}: {message}")]
    Clone { url: String, message: String },

    #[error("Failed to traverse {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Empty analysis result: no code or documentation files found")]
    EmptyResult,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidConfigValue { key: String, value: String },

    #[error("Model not configured: {message}")]
    ModelNotConfigured { message: String },

    #[error("Agent '{agent}' failed: {message}")]
    Model { agent: String, message: String },

    #[error("Agent '{agent}' returned an empty response")]
    EmptyResponse { agent: String },
}

pub type Result<T> = std::result::Result<T, DigestError>;

impl DigestError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Clone { .. } => 2,
            Self::Traversal { .. } => 3,
            Self::EmptyResult => 4,
            Self::ModelNotConfigured { .. } | Self::Model { .. } | Self::EmptyResponse { .. } => 5,
            Self::ConfigParse { .. }
            | Self::ConfigKeyNotFound { .. }
            | Self::InvalidConfigValue { .. } => 6,
            _ => 1,
        }
    }
}
