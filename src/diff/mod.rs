//! Diff truncation engine.
//!
//! Turns a raw unified diff into a bounded-size text that keeps file
//! boundaries, hunk headers and an evenly sampled view of changed lines.
//! The pipeline is segment → per-hunk truncation → global budget.

pub mod budget;
pub mod segment;
pub mod truncate;

pub use budget::{TRUNCATION_SENTINEL, truncate_diff};
pub use segment::{FileSection, Hunk, segment};
pub use truncate::{
    MAX_DIFF_SIZE, SHOW_LINES, SKIP_LINES, TruncationLimits, render_section, truncate_hunk,
};
