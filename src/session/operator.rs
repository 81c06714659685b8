//! Operator interaction: the questions the session asks a human.

use dialoguer::{Confirm, Editor, Input, MultiSelect, Password, Select};

use crate::config::Config;
use crate::error::SessionError;
use crate::git::FileStatus;

/// What to do with the commit on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Commit,
    Regenerate,
    Edit,
    Cancel,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Commit,
        Action::Regenerate,
        Action::Edit,
        Action::Cancel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::Commit => "Yes, commit",
            Action::Regenerate => "Regenerate",
            Action::Edit => "Edit message",
            Action::Cancel => "Cancel",
        }
    }
}

/// Outcome of the file-selection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    Files(Vec<String>),
    /// Open the settings form, then ask again.
    Settings,
}

const SETTINGS_ITEM: &str = "Settings...";

/// Questions asked during a session.
///
/// This abstraction allows scripting the operator in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Operator {
    /// Settings form, used on first run and from file selection. Edits
    /// `config` in place.
    fn setup(&self, config: &mut Config) -> Result<(), SessionError>;

    /// Pick the paths to commit, or ask for settings. Staged paths start
    /// selected.
    fn select_files(&self, files: &[FileStatus]) -> Result<FileSelection, SessionError>;

    fn choose_action(&self) -> Result<Action, SessionError>;

    /// Optional guidance for the next generation. `None` when skipped.
    fn feedback(&self) -> Result<Option<String>, SessionError>;

    /// Edit `message`. `None` when the edit was aborted.
    fn edit(&self, message: &str) -> Result<Option<String>, SessionError>;
}

/// Terminal prompts via dialoguer.
pub struct TerminalOperator;

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Operator for TerminalOperator {
    fn setup(&self, config: &mut Config) -> Result<(), SessionError> {
        println!("Welcome to commity! Let's set up your configuration.");
        println!();

        let base_url: String = Input::new()
            .with_prompt("API base URL (empty for OpenAI)")
            .with_initial_text(config.ai.base_url.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        config.ai.base_url = optional(base_url);

        let key_prompt = if config.ai.api_key.is_some() {
            "API key (empty to keep current)"
        } else {
            "API key"
        };
        let api_key = Password::new()
            .with_prompt(key_prompt)
            .allow_empty_password(true)
            .interact()?;
        if let Some(key) = optional(api_key) {
            config.ai.api_key = Some(key);
        }

        config.ai.model = Input::new()
            .with_prompt("Model")
            .default(config.ai.model.clone())
            .interact_text()?;

        config.commit.conventional = Confirm::new()
            .with_prompt("Use Conventional Commits?")
            .default(config.commit.conventional)
            .interact()?;

        let instructions: String = Input::new()
            .with_prompt("Custom instructions (optional)")
            .with_initial_text(config.ai.custom_instructions.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        config.ai.custom_instructions = optional(instructions);

        Ok(())
    }

    fn select_files(&self, files: &[FileStatus]) -> Result<FileSelection, SessionError> {
        let mut items: Vec<String> = files
            .iter()
            .map(|f| format!("[{}] {}", f.change.code(), f.path))
            .collect();
        items.push(SETTINGS_ITEM.to_string());
        let mut defaults: Vec<bool> = files.iter().map(|f| f.staged).collect();
        defaults.push(false);

        let chosen = MultiSelect::new()
            .with_prompt("Select files to commit")
            .items(&items)
            .defaults(&defaults)
            .interact()?;

        if chosen.contains(&files.len()) {
            return Ok(FileSelection::Settings);
        }
        Ok(FileSelection::Files(
            chosen.into_iter().map(|i| files[i].path.clone()).collect(),
        ))
    }

    fn choose_action(&self) -> Result<Action, SessionError> {
        let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
        let choice = Select::new()
            .with_prompt("Commit with this message?")
            .items(&labels)
            .default(0)
            .interact()?;
        Ok(Action::ALL[choice])
    }

    fn feedback(&self) -> Result<Option<String>, SessionError> {
        let text: String = Input::new()
            .with_prompt("Feedback (optional)")
            .allow_empty(true)
            .interact_text()?;
        Ok(optional(text))
    }

    fn edit(&self, message: &str) -> Result<Option<String>, SessionError> {
        let edited = Editor::new()
            .edit(message)
            .map_err(|e| SessionError::Prompt(e.to_string()))?;
        Ok(edited.and_then(optional))
    }
}
