//! Interactive commit session.
//!
//! status → file selection (or settings) → generation → per-commit review
//! (commit / regenerate / edit / cancel) → summary.

pub mod operator;

use std::future::Future;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::commit::{
    CommitMessage, GenerateResult, Generator, PromptRequest, previous_message_for,
};
use crate::config::Config;
use crate::error::{ConfigError, GenerateError, SessionError};
use crate::git::{FileStatus, VersionControl};
use crate::llm::ChatProvider;

pub use operator::{Action, FileSelection, Operator, TerminalOperator};

/// How a session ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Rendered messages of the commits created, in order.
    pub committed: Vec<String>,
    /// The operator stopped before every commit was made.
    pub cancelled: bool,
}

/// The commits under review and the position of the one on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    result: GenerateResult,
    index: usize,
}

impl Review {
    pub fn new(result: GenerateResult) -> Self {
        Self { result, index: 0 }
    }

    pub fn current(&self) -> Option<&CommitMessage> {
        self.result.commits.get(self.index)
    }

    /// 1-based position and total.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.result.commits.len())
    }

    pub fn is_split(&self) -> bool {
        self.result.is_split
    }

    /// Rendering of the commit on screen, for regeneration context.
    pub fn previous_message(&self) -> Option<String> {
        previous_message_for(&self.result, self.index)
    }

    /// Replace the current commit with operator text. The edit becomes an
    /// untyped message and keeps the commit's files.
    pub fn apply_edit(&mut self, text: &str) {
        if let Some(commit) = self.result.commits.get_mut(self.index) {
            let files = std::mem::take(&mut commit.files);
            *commit = CommitMessage::plain(text, files);
        }
    }

    /// Move past the current commit. Returns whether more remain.
    pub fn advance(&mut self) -> bool {
        self.index += 1;
        self.index < self.result.commits.len()
    }
}

/// First-run setup: ask for settings and write them to `path`.
pub fn first_run_setup<O: Operator>(
    operator: &O,
    config: &mut Config,
    path: &Path,
) -> Result<(), SessionError> {
    operator.setup(config)?;
    config.validate()?;
    config.save(path)?;
    println!("Saved configuration to {}", path.display());
    println!();
    Ok(())
}

/// Resolves once `signal` fires. If the signal cannot be watched the
/// returned future never resolves, so generation runs uncancelled.
pub async fn until_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Cannot listen for interrupts, cancellation disabled: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Builds a provider from the configuration.
type Connect<'a, P> = Box<dyn Fn(&Config) -> Result<P, ConfigError> + 'a>;

/// Where settings changed during a session are saved, and how the provider
/// is rebuilt from them.
struct SettingsTarget<'a, P> {
    path: &'a Path,
    connect: Connect<'a, P>,
}

/// Drives one interactive session against a repository and a model.
pub struct Session<'a, V, P, O>
where
    V: VersionControl,
    P: ChatProvider,
    O: Operator,
{
    vcs: &'a V,
    generator: &'a mut Generator<P>,
    operator: &'a O,
    config: &'a mut Config,
    settings: Option<SettingsTarget<'a, P>>,
}

impl<'a, V, P, O> Session<'a, V, P, O>
where
    V: VersionControl,
    P: ChatProvider,
    O: Operator,
{
    pub fn new(
        vcs: &'a V,
        generator: &'a mut Generator<P>,
        operator: &'a O,
        config: &'a mut Config,
    ) -> Self {
        Self {
            vcs,
            generator,
            operator,
            config,
            settings: None,
        }
    }

    /// Enable the settings form: changes are saved to `path` and the
    /// provider is rebuilt with `connect`.
    pub fn with_settings<C>(mut self, path: &'a Path, connect: C) -> Self
    where
        C: Fn(&Config) -> Result<P, ConfigError> + 'a,
    {
        self.settings = Some(SettingsTarget {
            path,
            connect: Box::new(connect),
        });
        self
    }

    /// Run the session. `cancel` is called once per generation cycle; when
    /// the future it returns resolves, that cycle is abandoned.
    pub async fn run<C, F>(&mut self, mut cancel: C) -> Result<SessionOutcome, SessionError>
    where
        C: FnMut() -> F,
        F: Future<Output = ()>,
    {
        let files = self.vcs.status()?;
        if files.is_empty() {
            return Err(SessionError::NoChanges);
        }

        let selected = loop {
            match self.operator.select_files(&files)? {
                FileSelection::Files(paths) => break paths,
                FileSelection::Settings => self.open_settings()?,
            }
        };
        if selected.is_empty() {
            return Err(GenerateError::NoFilesSelected.into());
        }
        debug!(selected = selected.len(), "Files selected");

        println!("Generating commit message...");
        let mut review = Review::new(self.generate(&selected, None, None, cancel()).await?);
        let mut outcome = SessionOutcome::default();

        while let Some(commit) = review.current().cloned() {
            self.show(&review, &commit, &files, &selected)?;

            match self.operator.choose_action()? {
                Action::Commit => {
                    let paths = commit.files_or(&selected);
                    let message = commit.render();
                    self.vcs.add(paths)?;
                    let oid = self.vcs.commit(&message)?;
                    debug!(%oid, "Committed");
                    outcome.committed.push(message);

                    if !review.advance() {
                        break;
                    }
                }
                Action::Regenerate => {
                    let feedback = self.operator.feedback()?;
                    let previous = review.previous_message();
                    println!("Regenerating commit message...");
                    let result = self
                        .generate(&selected, previous, feedback, cancel())
                        .await?;
                    review = Review::new(result);
                }
                Action::Edit => {
                    if let Some(text) = self.operator.edit(&commit.render())? {
                        review.apply_edit(&text);
                    }
                }
                Action::Cancel => {
                    outcome.cancelled = true;
                    break;
                }
            }
        }

        print_summary(&outcome);
        Ok(outcome)
    }

    /// Run the settings form. Accepted changes are saved and take effect for
    /// the next generation; rejected ones leave everything as it was.
    fn open_settings(&mut self) -> Result<(), SessionError> {
        let Some(target) = &self.settings else {
            println!("Settings cannot be changed in this session.");
            return Ok(());
        };

        let mut updated = self.config.clone();
        self.operator.setup(&mut updated)?;

        let applied = updated
            .validate()
            .and_then(|()| (target.connect)(&updated))
            .and_then(|provider| updated.save(target.path).map(|()| provider));
        match applied {
            Ok(provider) => {
                self.generator.reconfigure(provider, updated.diff);
                *self.config = updated;
                info!(path = %target.path.display(), "Settings updated");
                println!("Settings saved.");
            }
            Err(e) => {
                warn!("Settings rejected: {}", e);
                println!("Settings not saved: {}", e);
            }
        }
        println!();
        Ok(())
    }

    async fn generate<F>(
        &mut self,
        selected: &[String],
        previous_message: Option<String>,
        feedback: Option<String>,
        cancel: F,
    ) -> Result<GenerateResult, SessionError>
    where
        F: Future<Output = ()>,
    {
        let diff = self.vcs.diff_all(selected)?;
        let request = PromptRequest {
            files: selected.to_vec(),
            diff,
            conventional: self.config.commit.conventional,
            types: self.config.commit.types.clone(),
            custom_instructions: self.config.ai.custom_instructions.clone(),
            previous_message,
            feedback,
        };
        Ok(self.generator.generate_until(&request, cancel).await?)
    }

    fn show(
        &self,
        review: &Review,
        commit: &CommitMessage,
        files: &[FileStatus],
        selected: &[String],
    ) -> Result<(), SessionError> {
        let paths = commit.files_or(selected);
        let stats = self.vcs.diff_stats(paths)?;

        println!();
        println!("Branch: {}", self.vcs.branch());
        println!();
        println!("Files:");
        for path in paths {
            let code = files
                .iter()
                .find(|f| &f.path == path)
                .map(|f| f.change.code())
                .unwrap_or("M");
            println!("  {} {}", code, path);
        }
        println!(
            "\n{} files, +{} -{}",
            paths.len(),
            stats.insertions,
            stats.deletions
        );
        println!();

        if review.is_split() {
            let (n, total) = review.position();
            println!("Commit {} of {}:", n, total);
        } else {
            println!("Commit message:");
        }
        println!();
        for line in commit.render().lines() {
            println!("  {}", line);
        }
        println!();
        Ok(())
    }
}

fn print_summary(outcome: &SessionOutcome) {
    println!();
    match outcome.committed.len() {
        0 => println!("No commits created."),
        1 => println!("Committed successfully!"),
        n => println!("Created {} commits successfully!", n),
    }
    for message in &outcome.committed {
        let subject = message.lines().next().unwrap_or_default();
        println!("  {}", subject);
    }
}
