//! Show/skip sampling of oversized hunks.

use serde::Deserialize;

use super::segment::{FileSection, Hunk};

/// Lines shown per visible segment of a truncated hunk.
pub const SHOW_LINES: usize = 100;

/// Lines elided per skipped segment of a truncated hunk.
pub const SKIP_LINES: usize = 50;

/// Soft ceiling, in bytes, for the whole truncated diff.
pub const MAX_DIFF_SIZE: usize = 12_000;

/// Thresholds for the truncation pipeline.
///
/// Defaults come from [`SHOW_LINES`], [`SKIP_LINES`] and [`MAX_DIFF_SIZE`];
/// the `[diff]` config section can override each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TruncationLimits {
    pub show_lines: usize,
    pub skip_lines: usize,
    pub max_diff_size: usize,
}

impl Default for TruncationLimits {
    fn default() -> Self {
        Self {
            show_lines: SHOW_LINES,
            skip_lines: SKIP_LINES,
            max_diff_size: MAX_DIFF_SIZE,
        }
    }
}

/// Placeholder for an elided range. Positions are 1-based and relative to
/// the hunk content.
fn marker(start: usize, end: usize, count: usize) -> String {
    format!("... [lines {start}-{end}: {count} lines skipped - similar changes continue] ...")
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Render a hunk, sampling its content when it exceeds `show_lines`.
///
/// Hunks with at most `show_lines` content lines come back unchanged.
/// Larger hunks alternate between showing `show_lines` lines and replacing
/// the next `skip_lines` lines (fewer at the end) with a single marker. A
/// tail shorter than `show_lines` is shown in full.
pub fn truncate_hunk(hunk: &Hunk<'_>, limits: &TruncationLimits) -> String {
    let mut out = String::new();
    push_line(&mut out, hunk.header);

    // A zero show window would never advance.
    let show = limits.show_lines.max(1);
    let lines = &hunk.lines;

    if lines.len() <= show {
        for line in lines {
            push_line(&mut out, line);
        }
        return out;
    }

    let mut pos = 0;
    while pos < lines.len() {
        let show_end = (pos + show).min(lines.len());
        for line in &lines[pos..show_end] {
            push_line(&mut out, line);
        }
        pos = show_end;

        if pos < lines.len() {
            let skip_end = (pos + limits.skip_lines).min(lines.len());
            let skipped = skip_end - pos;
            if skipped > 0 {
                push_line(&mut out, &marker(pos + 1, skip_end, skipped));
            }
            pos = skip_end;
        }
    }

    out
}

/// Render a file section: header lines verbatim, then every hunk truncated.
pub fn render_section(section: &FileSection<'_>, limits: &TruncationLimits) -> String {
    let mut out = String::new();
    for line in &section.header {
        push_line(&mut out, line);
    }
    for hunk in &section.hunks {
        out.push_str(&truncate_hunk(hunk, limits));
    }
    out
}
