//! Prompt construction for AI-generated commit messages.

use crate::diff::{TruncationLimits, truncate_diff};

/// Fixed system prompt sent with every request.
const SYSTEM_PROMPT: &str = r#"You are an expert software engineer who writes clear, professional git commit messages. Your goal is to help developers maintain a clean, atomic git history.

## Your Task
Analyze the provided diff and generate commit message(s). Prefer splitting into multiple atomic commits when changes serve different purposes.

## When to Split Commits
PREFER split_commits when you see:
- Different types of changes (feat + fix, refactor + docs, etc.)
- Changes to unrelated parts of the codebase
- A bug fix alongside a new feature
- Formatting/style changes mixed with logic changes
- Test additions for existing code + new feature code
- Multiple independent improvements

Use submit_commit ONLY when ALL changes serve a single, cohesive purpose.

## Commit Message Format
- Subject: imperative mood, max 72 characters, no period at end
- Body (optional): wrapped at 72 characters, explains why not what

## Examples

Good single-line commits:
- feat: add user authentication via OAuth2
- fix: prevent crash when config file is missing
- refactor: extract validation logic into separate module

Good commit with body:
fix: handle empty response from payment API

The payment provider occasionally returns empty responses
during maintenance windows. This adds retry logic with
exponential backoff to improve reliability.

## Tools
- split_commits: Use this for most cases with multiple distinct changes (PREFERRED)
- submit_commit: Use only when all changes are tightly related to one purpose"#;

/// Everything the prompt is built from for one generation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptRequest {
    /// Selected paths, in selection order.
    pub files: Vec<String>,
    /// Raw diff text for the selected paths.
    pub diff: String,
    pub conventional: bool,
    /// Allowed commit types, in the configured order.
    pub types: Vec<String>,
    pub custom_instructions: Option<String>,
    /// Rendering of the commit shown in the previous cycle. Present only
    /// when regenerating.
    pub previous_message: Option<String>,
    /// Operator feedback collected between cycles.
    pub feedback: Option<String>,
}

impl PromptRequest {
    /// Whether this request regenerates a previous message.
    pub fn is_regeneration(&self) -> bool {
        non_empty(&self.previous_message).is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// The fixed system prompt.
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Build the user prompt for a generation or regeneration request.
///
/// Layout: framing (with the previous message and feedback when
/// regenerating), the file list, the truncated diff, the allowed commit
/// types when conventional mode is on, custom instructions, and the closing
/// single-vs-split instruction.
pub fn build_prompt(request: &PromptRequest, limits: &TruncationLimits) -> String {
    let mut prompt = String::new();

    match non_empty(&request.previous_message) {
        None => prompt.push_str("Generate a commit message for these changes:\n\n"),
        Some(previous) => {
            prompt.push_str("The user wants you to regenerate the commit message.\n\n");
            prompt.push_str(&format!("Previous message:\n```\n{previous}\n```\n\n"));
            if let Some(feedback) = non_empty(&request.feedback) {
                prompt.push_str(&format!("User feedback: {feedback}\n\n"));
            }
            prompt.push_str("Generate an improved commit message based on the feedback.\n\n");
        }
    }

    prompt.push_str("Files changed:\n");
    for file in &request.files {
        prompt.push_str(&format!("- {file}\n"));
    }

    prompt.push_str("\nDiff:\n```\n");
    prompt.push_str(&truncate_diff(&request.diff, limits));
    prompt.push_str("\n```\n");

    if request.conventional {
        prompt.push_str(&format!(
            "\nUse conventional commit format with one of these types: {}\n",
            request.types.join(", ")
        ));
    }

    if let Some(instructions) = non_empty(&request.custom_instructions) {
        prompt.push_str(&format!("\nAdditional instructions: {instructions}\n"));
    }

    prompt.push_str(
        "\nAnalyze the changes and decide: use `submit_commit` for related changes, or `split_commits` if changes should be separate commits.",
    );

    prompt
}
