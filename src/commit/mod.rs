//! AI-generated commit messages: prompt, response protocol and cycle driver.

pub mod generate;
pub mod message;
pub mod prompt;
pub mod protocol;

pub use generate::{CycleState, Generator, previous_message_for};
pub use message::{CommitMessage, GenerateResult};
pub use prompt::{PromptRequest, build_prompt, system_prompt};
pub use protocol::{SPLIT_COMMITS_TOOL, SUBMIT_COMMIT_TOOL, parse_response, tool_schemas};
