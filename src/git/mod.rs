//! Git operations using git2-rs.

pub mod patch;
pub mod status;

use std::path::Path;

use git2::{ErrorCode, Oid, Repository};
use tracing::debug;

use crate::error::GitError;

pub use patch::DiffStats;
pub use status::{ChangeKind, FileStatus};

/// Version-control operations the commit flow needs.
#[cfg_attr(test, mockall::automock)]
pub trait VersionControl {
    /// Changed paths, staged changes taking precedence.
    fn status(&self) -> Result<Vec<FileStatus>, GitError>;

    /// Patch text for `paths`: index vs HEAD when `staged`, worktree vs index
    /// otherwise.
    fn diff(&self, paths: &[String], staged: bool) -> Result<String, GitError>;

    /// Staged, unstaged and untracked changes for `paths` as one patch text.
    fn diff_all(&self, paths: &[String]) -> Result<String, GitError>;

    /// Stage `paths`, recording removals for paths gone from the worktree.
    fn add(&self, paths: &[String]) -> Result<(), GitError>;

    /// Commit the index on HEAD.
    fn commit(&self, message: &str) -> Result<Oid, GitError>;

    /// Current branch name, `"unknown"` when it cannot be determined.
    fn branch(&self) -> String;

    /// Line statistics across staged, unstaged and untracked changes.
    fn diff_stats(&self, paths: &[String]) -> Result<DiffStats, GitError>;
}

/// A non-bare git repository.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open the repository containing `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path.as_ref()).map_err(GitError::OpenRepository)?;
        if repo.is_bare() {
            return Err(GitError::BareRepository);
        }
        debug!(path = ?repo.workdir(), "Opened repository");
        Ok(Self { repo })
    }
}

impl VersionControl for GitRepository {
    fn status(&self) -> Result<Vec<FileStatus>, GitError> {
        status::collect_status(&self.repo)
    }

    fn diff(&self, paths: &[String], staged: bool) -> Result<String, GitError> {
        let diff = if staged {
            patch::staged_diff(&self.repo, paths)?
        } else {
            patch::unstaged_diff(&self.repo, paths, false)?
        };
        let mut text = String::new();
        patch::append_patch(&diff, &mut text)?;
        Ok(text)
    }

    fn diff_all(&self, paths: &[String]) -> Result<String, GitError> {
        let mut text = String::new();
        patch::append_patch(&patch::staged_diff(&self.repo, paths)?, &mut text)?;
        patch::append_patch(&patch::unstaged_diff(&self.repo, paths, true)?, &mut text)?;
        debug!(paths = paths.len(), bytes = text.len(), "Collected diff");
        Ok(text)
    }

    fn add(&self, paths: &[String]) -> Result<(), GitError> {
        let workdir = self.repo.workdir().ok_or(GitError::BareRepository)?;
        let mut index = self.repo.index().map_err(GitError::IndexFailed)?;

        for path in paths {
            let rel = Path::new(path);
            let result = if workdir.join(rel).exists() {
                index.add_path(rel)
            } else {
                index.remove_path(rel)
            };
            result.map_err(|source| GitError::StagingFailed {
                path: path.clone(),
                source,
            })?;
        }

        index.write().map_err(GitError::IndexFailed)
    }

    fn commit(&self, message: &str) -> Result<Oid, GitError> {
        let mut index = self.repo.index().map_err(GitError::IndexFailed)?;
        let tree_id = index.write_tree().map_err(GitError::IndexFailed)?;
        let tree = self.repo.find_tree(tree_id).map_err(GitError::CommitFailed)?;

        let sig = self.repo.signature().map_err(GitError::SignatureFailed)?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(GitError::CommitFailed)?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                None
            }
            Err(e) => return Err(GitError::CommitFailed(e)),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(GitError::CommitFailed)?;
        debug!(%oid, "Created commit");
        Ok(oid)
    }

    fn branch(&self) -> String {
        if let Ok(head) = self.repo.head() {
            if let Some(name) = head.shorthand() {
                return name.to_string();
            }
        }

        // Unborn HEAD still names its branch.
        self.repo
            .find_reference("HEAD")
            .ok()
            .and_then(|r| r.symbolic_target().map(str::to_string))
            .and_then(|t| t.strip_prefix("refs/heads/").map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn diff_stats(&self, paths: &[String]) -> Result<DiffStats, GitError> {
        let mut totals = DiffStats::default();
        patch::add_stats(&patch::staged_diff(&self.repo, paths)?, &mut totals)?;
        patch::add_stats(&patch::unstaged_diff(&self.repo, paths, true)?, &mut totals)?;
        Ok(totals)
    }
}
