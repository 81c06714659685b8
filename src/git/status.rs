//! Working tree status.

use std::fmt;

use git2::{Repository, Status, StatusEntry, StatusOptions};

use crate::error::GitError;

/// Kind of change recorded for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
}

impl ChangeKind {
    /// Short status code, as shown by `git status --short`.
    pub fn code(&self) -> &'static str {
        match self {
            ChangeKind::Modified => "M",
            ChangeKind::Added => "A",
            ChangeKind::Deleted => "D",
            ChangeKind::Renamed => "R",
            ChangeKind::Untracked => "??",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Modified => "modified",
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Untracked => "untracked",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A changed path in the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Path relative to the repository root.
    pub path: String,
    pub change: ChangeKind,
    /// Whether the change is already in the index.
    pub staged: bool,
}

const INDEX_FLAGS: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

/// Classify a status entry. Index changes win over worktree changes.
fn classify(status: Status) -> Option<(ChangeKind, bool)> {
    if status.intersects(INDEX_FLAGS) {
        let change = if status.contains(Status::INDEX_NEW) {
            ChangeKind::Added
        } else if status.contains(Status::INDEX_DELETED) {
            ChangeKind::Deleted
        } else if status.contains(Status::INDEX_RENAMED) {
            ChangeKind::Renamed
        } else {
            ChangeKind::Modified
        };
        return Some((change, true));
    }

    let change = if status.contains(Status::WT_NEW) {
        ChangeKind::Untracked
    } else if status.contains(Status::WT_DELETED) {
        ChangeKind::Deleted
    } else if status.contains(Status::WT_RENAMED) {
        ChangeKind::Renamed
    } else if status.intersects(
        Status::WT_MODIFIED | Status::WT_TYPECHANGE | Status::CONFLICTED,
    ) {
        ChangeKind::Modified
    } else {
        return None;
    };
    Some((change, false))
}

/// Path of an entry, preferring the new side of a rename.
fn entry_path(entry: &StatusEntry<'_>) -> Option<String> {
    entry
        .head_to_index()
        .and_then(|d| d.new_file().path())
        .or_else(|| entry.index_to_workdir().and_then(|d| d.new_file().path()))
        .map(|p| p.to_string_lossy().to_string())
        .or_else(|| entry.path().map(str::to_string))
}

/// Collect changed paths, with untracked directories expanded to files.
pub fn collect_status(repo: &Repository) -> Result<Vec<FileStatus>, GitError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(true);

    let statuses = repo.statuses(Some(&mut opts)).map_err(GitError::StatusFailed)?;

    let files = statuses
        .iter()
        .filter_map(|entry| {
            let (change, staged) = classify(entry.status())?;
            let path = entry_path(&entry)?;
            Some(FileStatus {
                path,
                change,
                staged,
            })
        })
        .collect();

    Ok(files)
}
