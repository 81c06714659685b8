//! Unified diff text and line statistics from git2 diffs.

use git2::{Diff, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};

use crate::error::GitError;

/// Lines added and removed across a set of paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
}

/// Resolve the HEAD tree. `Ok(None)` for a repository without commits.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Diff options restricted to exactly `paths`. Empty `paths` means everything.
fn path_options(paths: &[String]) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.disable_pathspec_match(true);
    for p in paths {
        opts.pathspec(p);
    }
    opts
}

/// Index against HEAD.
pub fn staged_diff<'r>(repo: &'r Repository, paths: &[String]) -> Result<Diff<'r>, GitError> {
    let head_tree = resolve_head_tree(repo)?;
    let mut opts = path_options(paths);
    repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(GitError::DiffFailed)
}

/// Worktree against the index. With `untracked`, new files are included as
/// full-file additions.
pub fn unstaged_diff<'r>(
    repo: &'r Repository,
    paths: &[String],
    untracked: bool,
) -> Result<Diff<'r>, GitError> {
    let mut opts = path_options(paths);
    if untracked {
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
    }
    repo.diff_index_to_workdir(None, Some(&mut opts))
        .map_err(GitError::DiffFailed)
}

/// Append the patch text of `diff` to `text`.
pub fn append_patch(diff: &Diff<'_>, text: &mut String) -> Result<(), GitError> {
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(GitError::DiffFailed)
}

/// Accumulate insertions and deletions of `diff` into `totals`.
pub fn add_stats(diff: &Diff<'_>, totals: &mut DiffStats) -> Result<(), GitError> {
    let stats = diff.stats().map_err(GitError::DiffFailed)?;
    totals.insertions += stats.insertions();
    totals.deletions += stats.deletions();
    Ok(())
}
