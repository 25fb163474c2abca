//! Unified diff import
//!
//! Converts standard unified diff text (as produced by `git diff`) into the
//! chunked payload the processor consumes. Unchanged lines between hunks are
//! not part of a unified diff, so they become `skip` chunks.

use super::chunk::{DiffContent, DiffInfo};

/// A parsed unified diff
#[derive(Debug, Clone, Default)]
pub struct UnifiedDiff {
    pub file_a: Option<String>,
    pub file_b: Option<String>,
    pub hunks: Vec<Hunk>,
}

/// A single hunk from a diff
#[derive(Debug, Clone)]
pub struct Hunk {
    /// Starting line in old file
    pub old_start: u32,
    /// Starting line in new file
    pub new_start: u32,
    /// Lines in this hunk, in order
    pub lines: Vec<(HunkLineKind, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkLineKind {
    Context,
    Added,
    Removed,
}

impl UnifiedDiff {
    /// Parse a unified diff string
    #[must_use]
    pub fn parse(diff: &str) -> Self {
        let mut result = Self::default();
        let mut lines = diff.lines().peekable();

        // Header (--- and +++ lines)
        while let Some(line) = lines.peek() {
            if let Some(path) = line.strip_prefix("--- ") {
                result.file_a = Some(path.strip_prefix("a/").unwrap_or(path).to_string());
            } else if let Some(path) = line.strip_prefix("+++ ") {
                result.file_b = Some(path.strip_prefix("b/").unwrap_or(path).to_string());
            } else if line.starts_with("@@") {
                break;
            }
            lines.next();
        }

        while let Some(line) = lines.next() {
            if line.starts_with("@@") {
                if let Some(hunk) = Self::parse_hunk(line, &mut lines) {
                    result.hunks.push(hunk);
                }
            }
        }

        result
    }

    fn parse_hunk(
        header: &str,
        lines: &mut std::iter::Peekable<std::str::Lines<'_>>,
    ) -> Option<Hunk> {
        // @@ -start,count +start,count @@ optional context
        let parts: Vec<&str> = header.split_whitespace().collect();
        if parts.len() < 3 {
            return None;
        }
        let old_start = Self::parse_start(parts[1].trim_start_matches('-'))?;
        let new_start = Self::parse_start(parts[2].trim_start_matches('+'))?;

        let mut hunk = Hunk {
            old_start,
            new_start,
            lines: Vec::new(),
        };
        while let Some(line) = lines.peek() {
            if line.starts_with("@@") || line.starts_with("diff ") {
                break;
            }
            let line = lines.next().unwrap_or_default();
            let entry = if let Some(content) = line.strip_prefix('+') {
                (HunkLineKind::Added, content)
            } else if let Some(content) = line.strip_prefix('-') {
                (HunkLineKind::Removed, content)
            } else if let Some(content) = line.strip_prefix(' ') {
                (HunkLineKind::Context, content)
            } else if line.starts_with('\\') {
                // "\ No newline at end of file"
                continue;
            } else {
                (HunkLineKind::Context, line)
            };
            hunk.lines.push((entry.0, entry.1.to_string()));
        }
        Some(hunk)
    }

    fn parse_start(s: &str) -> Option<u32> {
        let start = s.split_once(',').map_or(s, |(start, _)| start);
        start.parse().ok()
    }

    /// Convert to the chunked payload. Lines between hunks become `skip`
    /// chunks; `old_total_lines` adds a trailing one after the last hunk.
    #[must_use]
    pub fn to_diff_info(&self, old_total_lines: Option<u32>) -> DiffInfo {
        let mut content: Vec<DiffContent> = Vec::new();
        let mut next_old = 1u32;

        for hunk in &self.hunks {
            // A hunk for an empty side starts at 0.
            let hunk_old_start = hunk.old_start.max(1);
            if hunk_old_start > next_old {
                content.push(DiffContent {
                    skip: Some(hunk_old_start - next_old),
                    ..DiffContent::default()
                });
            }
            next_old = hunk_old_start;

            let mut pending = DiffContent::default();
            for (kind, text) in &hunk.lines {
                match kind {
                    HunkLineKind::Context => {
                        flush_delta(&mut content, &mut pending);
                        match content.last_mut().and_then(|c| c.ab.as_mut()) {
                            Some(ab) => ab.push(text.clone()),
                            None => content.push(DiffContent {
                                ab: Some(vec![text.clone()]),
                                ..DiffContent::default()
                            }),
                        }
                        next_old += 1;
                    }
                    HunkLineKind::Removed => {
                        pending.a.get_or_insert_with(Vec::new).push(text.clone());
                        next_old += 1;
                    }
                    HunkLineKind::Added => {
                        pending.b.get_or_insert_with(Vec::new).push(text.clone());
                    }
                }
            }
            flush_delta(&mut content, &mut pending);
        }

        if let Some(total) = old_total_lines {
            if total + 1 > next_old {
                content.push(DiffContent {
                    skip: Some(total + 1 - next_old),
                    ..DiffContent::default()
                });
            }
        }

        DiffInfo {
            content,
            binary: false,
        }
    }
}

fn flush_delta(content: &mut Vec<DiffContent>, pending: &mut DiffContent) {
    if pending.a.is_some() || pending.b.is_some() {
        content.push(std::mem::take(pending));
    }
}
