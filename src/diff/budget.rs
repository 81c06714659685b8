//! Global size budget across file sections.

use tracing::debug;

use super::segment::segment;
use super::truncate::{TruncationLimits, render_section};

/// Appended once when files are dropped for exceeding the budget.
pub const TRUNCATION_SENTINEL: &str = "\n... (remaining files truncated) ...";

/// Truncate a raw diff to fit the prompt budget.
///
/// Every file section is rendered with its hunks sampled, then appended in
/// order. The budget is checked after each append: the section that crosses
/// `max_diff_size` is kept whole, the sentinel is appended and all later
/// sections are dropped. The ceiling is soft by up to one section.
pub fn truncate_diff(diff: &str, limits: &TruncationLimits) -> String {
    let sections = segment(diff);
    let total = sections.len();
    let mut out = String::new();

    for (index, section) in sections.iter().enumerate() {
        out.push_str(&render_section(section, limits));

        if out.len() > limits.max_diff_size {
            let dropped = total - index - 1;
            debug!(
                kept = index + 1,
                dropped,
                size = out.len(),
                budget = limits.max_diff_size,
                "Diff budget exceeded after {}",
                section.path().unwrap_or("<leading text>")
            );
            out.push_str(TRUNCATION_SENTINEL);
            break;
        }
    }

    out
}
