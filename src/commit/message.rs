//! Commit messages produced by the model and their canonical rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single commit message plus the files it covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    /// Conventional commit type (`feat`, `fix`, ...). Empty for plain
    /// messages such as the free-text fallback or an operator edit.
    #[serde(rename = "type", default)]
    pub commit_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Paths belonging to this commit. Filled from the selected set when
    /// the model does not attribute files.
    #[serde(default)]
    pub files: Vec<String>,
}

impl CommitMessage {
    /// A plain, untyped message.
    pub fn plain(subject: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            files,
            ..Self::default()
        }
    }

    /// Render the message as it is committed and displayed.
    ///
    /// ```text
    /// type(scope): subject
    ///
    /// body
    /// ```
    ///
    /// Without a type the message is just the subject (and body).
    pub fn render(&self) -> String {
        let mut msg = String::new();

        if !self.commit_type.is_empty() {
            msg.push_str(&self.commit_type);
            if let Some(scope) = self.scope.as_deref().filter(|s| !s.is_empty()) {
                msg.push('(');
                msg.push_str(scope);
                msg.push(')');
            }
            msg.push_str(": ");
        }

        msg.push_str(&self.subject);

        if let Some(body) = self.body.as_deref().filter(|b| !b.is_empty()) {
            msg.push_str("\n\n");
            msg.push_str(body);
        }

        msg
    }

    /// Files to stage for this commit, falling back to `selected`.
    pub fn files_or<'a>(&'a self, selected: &'a [String]) -> &'a [String] {
        if self.files.is_empty() {
            selected
        } else {
            &self.files
        }
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Outcome of one generation cycle: either a single commit or a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResult {
    pub commits: Vec<CommitMessage>,
    pub is_split: bool,
}

impl GenerateResult {
    /// A single commit covering every selected file.
    pub fn single(mut commit: CommitMessage, selected: &[String]) -> Self {
        commit.files = selected.to_vec();
        Self {
            commits: vec![commit],
            is_split: false,
        }
    }

    /// Multiple commits, each carrying its own files.
    pub fn split(commits: Vec<CommitMessage>) -> Self {
        Self {
            commits,
            is_split: true,
        }
    }
}
