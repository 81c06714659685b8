//! commity - AI-generated git commit messages.
//!
//! # Overview
//!
//! commity reads the working tree, sends a truncated diff of the files the
//! user selects to an OpenAI-compatible chat endpoint, and turns the model's
//! structured answer into one commit or a split into several. The user
//! reviews each message before it is committed.

pub mod commit;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod llm;
pub mod session;

// Re-export commonly used types
pub use commit::{CommitMessage, GenerateResult, Generator, PromptRequest};
pub use config::Config;
pub use diff::{TruncationLimits, truncate_diff};
pub use error::{ConfigError, GenerateError, GitError, SessionError};
pub use git::{GitRepository, VersionControl};
pub use llm::{ChatProvider, OpenAiClient};
pub use session::{Session, SessionOutcome};
