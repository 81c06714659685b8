//! Splitting a unified diff into file sections and hunks.

/// Prefix that starts a new file section.
const FILE_HEADER_PREFIX: &str = "diff --git";

/// Prefix that starts a new hunk inside a file section.
const HUNK_HEADER_PREFIX: &str = "@@";

/// One `@@ ... @@` block of a file section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk<'a> {
    /// The `@@` header line.
    pub header: &'a str,
    /// Context, added and removed lines, excluding the header.
    pub lines: Vec<&'a str>,
}

impl Hunk<'_> {
    /// Number of content lines (the header is not counted).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// The portion of a diff belonging to a single file.
///
/// Identity is the position in the original diff; repeated paths are kept
/// as separate sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSection<'a> {
    /// Lines before the first hunk (`diff --git`, `---`, `+++`, mode and
    /// rename lines). Passed through untouched.
    pub header: Vec<&'a str>,
    pub hunks: Vec<Hunk<'a>>,
}

impl<'a> FileSection<'a> {
    /// Path from the `diff --git a/... b/...` line, if this section has one.
    pub fn path(&self) -> Option<&'a str> {
        let first = self.header.first()?;
        let rest = first.strip_prefix(FILE_HEADER_PREFIX)?.trim_start();
        rest.rsplit_once(" b/").map(|(_, path)| path)
    }

    fn push_line(&mut self, line: &'a str) {
        if line.starts_with(HUNK_HEADER_PREFIX) {
            self.hunks.push(Hunk {
                header: line,
                lines: Vec::new(),
            });
        } else if let Some(hunk) = self.hunks.last_mut() {
            hunk.lines.push(line);
        } else {
            self.header.push(line);
        }
    }

    fn is_empty(&self) -> bool {
        self.header.is_empty() && self.hunks.is_empty()
    }
}

/// Split diff text into file sections, each split into hunks.
///
/// Sections start at every line beginning with `diff --git`. Text before
/// the first such line becomes a leading section unless it is empty. Input
/// without any markers comes back as a single pass-through section, and
/// empty input as a single empty section.
pub fn segment(diff: &str) -> Vec<FileSection<'_>> {
    let mut sections = Vec::new();
    let mut current = FileSection::default();

    for line in diff.lines() {
        if line.starts_with(FILE_HEADER_PREFIX) && !current.is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        current.push_line(line);
    }

    if !current.is_empty() || sections.is_empty() {
        sections.push(current);
    }

    sections
}
