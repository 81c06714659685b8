//! Structured response protocol between the prompt and the model.
//!
//! The model answers through one of two tools: `submit_commit` for a single
//! cohesive commit, or `split_commits` for several atomic commits. Field
//! names and required sets are part of the contract with the provider.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::commit::message::{CommitMessage, GenerateResult};
use crate::error::GenerateError;
use crate::llm::{ModelResponse, ToolSchema};

/// Tool name for a single commit covering all selected files.
pub const SUBMIT_COMMIT_TOOL: &str = "submit_commit";

/// Tool name for several commits, each with its own files.
pub const SPLIT_COMMITS_TOOL: &str = "split_commits";

const TYPE_DESCRIPTION: &str = "Commit type (feat, fix, docs, style, refactor, test, chore)";
const SUBJECT_DESCRIPTION: &str = "Short commit subject line WITHOUT the type prefix (max 72 chars). Example: 'add user authentication' not 'feat: add user authentication'";

/// Both tool schemas, in the order they are offered to the model.
pub fn tool_schemas() -> Vec<ToolSchema> {
    vec![submit_commit_schema(), split_commits_schema()]
}

fn submit_commit_schema() -> ToolSchema {
    ToolSchema {
        name: SUBMIT_COMMIT_TOOL.to_string(),
        description: "Submit a single commit for all changes. Use this when all changes are related."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "type": { "type": "string", "description": TYPE_DESCRIPTION },
                "scope": { "type": "string", "description": "Optional scope of the change" },
                "subject": { "type": "string", "description": SUBJECT_DESCRIPTION },
                "body": { "type": "string", "description": "Optional longer description" }
            },
            "required": ["type", "subject"]
        }),
    }
}

fn split_commits_schema() -> ToolSchema {
    ToolSchema {
        name: SPLIT_COMMITS_TOOL.to_string(),
        description: "Split changes into multiple logical commits. Use this when changes are unrelated and should be separate commits."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "commits": {
                    "type": "array",
                    "description": "Array of commits, each with its own message and files",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": { "type": "string", "description": TYPE_DESCRIPTION },
                            "scope": { "type": "string", "description": "Optional scope of the change" },
                            "subject": { "type": "string", "description": SUBJECT_DESCRIPTION },
                            "body": { "type": "string", "description": "Optional longer description" },
                            "files": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "List of file paths for this commit"
                            }
                        },
                        "required": ["type", "subject", "files"]
                    }
                }
            },
            "required": ["commits"]
        }),
    }
}

/// Arguments of a `submit_commit` call.
#[derive(Debug, Deserialize)]
struct SubmitCommitArgs {
    #[serde(rename = "type")]
    commit_type: String,
    #[serde(default)]
    scope: Option<String>,
    subject: String,
    #[serde(default)]
    body: Option<String>,
}

/// One entry of a `split_commits` call.
#[derive(Debug, Deserialize)]
struct SplitCommitArgs {
    #[serde(rename = "type")]
    commit_type: String,
    #[serde(default)]
    scope: Option<String>,
    subject: String,
    #[serde(default)]
    body: Option<String>,
    files: Vec<String>,
}

/// Arguments of a `split_commits` call.
#[derive(Debug, Deserialize)]
struct SplitCommitsArgs {
    commits: Vec<SplitCommitArgs>,
}

/// A decoded tool invocation.
#[derive(Debug)]
enum StructuredResponse {
    Submit(SubmitCommitArgs),
    Split(SplitCommitsArgs),
}

impl StructuredResponse {
    /// Decode tool arguments by tool name. Unknown tools yield `Ok(None)`.
    fn decode(name: &str, arguments: &str) -> Result<Option<Self>, GenerateError> {
        let decoded = match name {
            SUBMIT_COMMIT_TOOL => serde_json::from_str(arguments).map(StructuredResponse::Submit),
            SPLIT_COMMITS_TOOL => serde_json::from_str(arguments).map(StructuredResponse::Split),
            _ => return Ok(None),
        };

        decoded.map(Some).map_err(|e| {
            debug!("Raw {} arguments: {}", name, arguments);
            GenerateError::Protocol(format!("failed to parse {name} arguments: {e}"))
        })
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_subject(subject: String, context: &str) -> Result<String, GenerateError> {
    let subject = subject.trim().to_string();
    if subject.is_empty() {
        return Err(GenerateError::Protocol(format!("{context} has an empty subject")));
    }
    Ok(subject)
}

fn submit_to_result(
    args: SubmitCommitArgs,
    selected: &[String],
) -> Result<GenerateResult, GenerateError> {
    let commit = CommitMessage {
        commit_type: args.commit_type.trim().to_string(),
        scope: normalize(args.scope),
        subject: require_subject(args.subject, SUBMIT_COMMIT_TOOL)?,
        body: normalize(args.body),
        files: Vec::new(),
    };
    Ok(GenerateResult::single(commit, selected))
}

fn split_to_result(args: SplitCommitsArgs) -> Result<GenerateResult, GenerateError> {
    if args.commits.is_empty() {
        return Err(GenerateError::Protocol(format!(
            "{SPLIT_COMMITS_TOOL} returned no commits"
        )));
    }

    let commits = args
        .commits
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let context = format!("{SPLIT_COMMITS_TOOL} commit {}", index + 1);
            let subject = require_subject(entry.subject, &context)?;
            if entry.files.is_empty() {
                return Err(GenerateError::Protocol(format!("{context} lists no files")));
            }
            Ok(CommitMessage {
                commit_type: entry.commit_type.trim().to_string(),
                scope: normalize(entry.scope),
                subject,
                body: normalize(entry.body),
                files: entry.files,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GenerateResult::split(commits))
}

/// Turn a model response into a [`GenerateResult`].
///
/// - `submit_commit` → one commit covering `selected`.
/// - `split_commits` → one commit per entry, files as given.
/// - No known tool call → non-empty text becomes an untyped commit
///   covering `selected`.
///
/// Malformed or invalid tool arguments are a protocol error and are never
/// downgraded to the text fallback. A response with neither a usable tool
/// call nor text is a protocol error as well.
pub fn parse_response(
    response: &ModelResponse,
    selected: &[String],
) -> Result<GenerateResult, GenerateError> {
    if let Some(call) = &response.tool_call {
        match StructuredResponse::decode(&call.name, &call.arguments)? {
            Some(StructuredResponse::Submit(args)) => return submit_to_result(args, selected),
            Some(StructuredResponse::Split(args)) => return split_to_result(args),
            None => warn!("Ignoring unknown tool call '{}'", call.name),
        }
    }

    match response.content.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            debug!("No structured response, using text fallback");
            Ok(GenerateResult::single(
                CommitMessage::plain(text, Vec::new()),
                selected,
            ))
        }
        _ => Err(GenerateError::Protocol(
            "AI did not return a commit message".to_string(),
        )),
    }
}
