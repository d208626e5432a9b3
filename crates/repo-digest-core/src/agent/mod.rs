//! Agent pipeline
//!
//! Consumes the serialized analysis corpus and returns a synthesized report.
//! Models are injected into each agent; nothing here is global.

pub mod model;
pub mod prompts;
pub mod swarm;

pub use model::{build_model, ChatModel, CommandChatModel, ModelConfig, OpenAiChatModel, Provider};
pub use swarm::{default_swarm, Agent, MixtureOfAgents};
