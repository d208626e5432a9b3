pub mod agent;
pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod prompt;
pub mod report;
pub mod tree;
pub mod workspace;

pub use agent::{
    build_model, default_swarm, Agent, ChatModel, CommandChatModel, MixtureOfAgents, ModelConfig,
    OpenAiChatModel, Provider,
};
pub use analyzer::{AnalysisResult, RepositoryAnalyzer};
pub use classifier::{classify, Classification, ClassifiedFiles, FileRecord};
pub use config::Config;
pub use error::{DigestError, Result};
pub use fetcher::{GitFetcher, RepositoryFetcher};
pub use prompt::{PromptGenerator, PromptMap, RenderError};
pub use report::{analyzer_from_config, generate_report, summarize, Report};
pub use tree::{build_tree, FileTree, TreeEntry};
pub use workspace::Workspace;
