//! Agents and the mixture-of-agents runner

use std::sync::Arc;

use tracing::{info, warn};

use super::model::ChatModel;
use super::prompts::{CODE_ANALYZE_PROMPT, DOC_ANALYZE_PROMPT, SUMMARY_AGENT_PROMPT};
use crate::error::{DigestError, Result};

/// A named system prompt bound to an injected model
#[derive(Clone)]
pub struct Agent {
    name: String,
    system_prompt: String,
    model: Arc<dyn ChatModel>,
    retry_attempts: u32,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            model,
            retry_attempts: 3,
        }
    }

    /// Total attempts per call (at least one)
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run the agent on `task` under its own system prompt
    pub fn run(&self, task: &str) -> Result<String> {
        self.run_with_prompt(&self.system_prompt, task)
    }

    fn run_with_prompt(&self, system_prompt: &str, task: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            info!("Running agent {} (attempt {}/{})", self.name, attempt, self.retry_attempts);
            match self.model.complete(system_prompt, task) {
                Ok(text) if text.trim().is_empty() => {
                    return Err(DigestError::EmptyResponse {
                        agent: self.name.clone(),
                    })
                }
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("Agent {} attempt {} failed: {}", self.name, attempt, e);
                    last_error = Some(e);
                }
            }
        }

        Err(DigestError::Model {
            agent: self.name.clone(),
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts made".to_string()),
        })
    }
}

/// Runs worker agents on a task, then hands their outputs to an aggregator
pub struct MixtureOfAgents {
    agents: Vec<Agent>,
    aggregator: Agent,
    aggregator_system_prompt: String,
}

impl MixtureOfAgents {
    pub fn new(
        agents: Vec<Agent>,
        aggregator: Agent,
        aggregator_system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            agents,
            aggregator,
            aggregator_system_prompt: aggregator_system_prompt.into(),
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn aggregator(&self) -> &Agent {
        &self.aggregator
    }

    pub fn run(&self, task: &str) -> Result<String> {
        let mut outputs = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let output = agent.run(task)?;
            outputs.push((agent.name(), output));
        }

        let input = aggregator_input(task, &outputs);
        info!("Aggregating {} agent outputs", outputs.len());
        self.aggregator
            .run_with_prompt(&self.aggregator_system_prompt, &input)
    }
}

fn aggregator_input(task: &str, outputs: &[(&str, String)]) -> String {
    let mut input = format!("# Task\n\n{}\n", task);
    for (name, output) in outputs {
        input.push_str(&format!("\n# Output of {}\n\n{}\n", name, output));
    }
    input
}

/// Code analyzer, doc analyzer and summarizer sharing one model. The
/// summarizer also aggregates.
pub fn default_swarm(model: Arc<dyn ChatModel>, retry_attempts: u32) -> MixtureOfAgents {
    let code = Agent::new("Code-Analyze", CODE_ANALYZE_PROMPT, Arc::clone(&model))
        .with_retry_attempts(retry_attempts);
    let doc = Agent::new("Doc-Analyze", DOC_ANALYZE_PROMPT, Arc::clone(&model))
        .with_retry_attempts(retry_attempts);
    let summarizer =
        Agent::new("Summarizer", SUMMARY_AGENT_PROMPT, model).with_retry_attempts(retry_attempts);

    MixtureOfAgents::new(
        vec![code, doc, summarizer.clone()],
        summarizer,
        SUMMARY_AGENT_PROMPT,
    )
}
