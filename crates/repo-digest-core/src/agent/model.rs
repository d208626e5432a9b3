//! Chat models
//!
//! The agent pipeline talks to a language model only through [`ChatModel`].
//! Two backends are provided: an OpenAI-compatible HTTP endpoint and an
//! external CLI that reads the prompt from stdin.

use std::env;
use std::io::{self, Write as IoWrite};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DigestError, Result};

// ============================================================================
// Configuration
// ============================================================================

/// Which backend serves completions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Command,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Command => "command",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "command" => Some(Self::Command),
            _ => None,
        }
    }
}

/// Model settings shared by every agent of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,

    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Environment variable holding the API key (openai provider)
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Program run for the command provider
    #[serde(default = "default_command")]
    pub command: String,

    /// Total attempts per agent call
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_command() -> String {
    "claude".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model_name(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            command: default_command(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

// ============================================================================
// Model trait
// ============================================================================

/// Blocking text completion
pub trait ChatModel: Send + Sync {
    /// Complete `input` under `system_prompt`, returning the model's text
    fn complete(&self, system_prompt: &str, input: &str) -> Result<String>;
}

/// Build the model described by `config`
pub fn build_model(config: &ModelConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider {
        Provider::OpenAi => Ok(Arc::new(OpenAiChatModel::from_config(config)?)),
        Provider::Command => Ok(Arc::new(CommandChatModel::new(&config.command))),
    }
}

// ============================================================================
// OpenAI-compatible HTTP backend
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Chat completions over HTTP
pub struct OpenAiChatModel {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    temperature: f32,
    endpoint: String,
}

impl OpenAiChatModel {
    /// Reads the API key from `config.api_key_env`
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DigestError::ModelNotConfigured {
                message: format!("{} not found in environment variables", config.api_key_env),
            })?;

        Ok(Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            model: config.name.clone(),
            temperature: config.temperature,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    fn model_error(&self, message: String) -> DigestError {
        DigestError::Model {
            agent: self.model.clone(),
            message,
        }
    }
}

impl ChatModel for OpenAiChatModel {
    fn complete(&self, system_prompt: &str, input: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
        };

        debug!("POST {} (model {})", self.endpoint, self.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.model_error(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| self.model_error(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(self.model_error(format!("API error ({}): {}", status.as_u16(), message)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| self.model_error(format!("failed to parse response: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .collect::<String>())
    }
}

// ============================================================================
// CLI backend
// ============================================================================

/// Runs `<program> --print` with the prompt on stdin
#[derive(Debug, Clone)]
pub struct CommandChatModel {
    program: String,
}

impl CommandChatModel {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn model_error(&self, message: String) -> DigestError {
        DigestError::Model {
            agent: self.program.clone(),
            message,
        }
    }
}

impl ChatModel for CommandChatModel {
    fn complete(&self, system_prompt: &str, input: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .arg("--print")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.model_error(format!("failed to spawn {}: {}", self.program, e)))?;

        // Fed from its own thread so a child filling stdout cannot stall the write
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = format!("{}\n\n{}", system_prompt, input);
            thread::spawn(move || stdin.write_all(prompt.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| self.model_error(format!("execution failed: {}", e)))?;

        let written = match writer {
            Some(handle) => handle
                .join()
                .map_err(|_| self.model_error("prompt writer panicked".to_string()))?,
            None => Ok(()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.model_error(format!("exited with error: {}", stderr.trim())));
        }

        match written {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(self.model_error(format!("failed to write prompt: {}", e)));
            }
            _ => {}
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
