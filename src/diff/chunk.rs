//! Server diff payload
//!
//! `DiffContent` mirrors the JSON the review server sends: every entry is a
//! common run (`ab`), a paired removal/addition (`a`/`b`), or an elided common
//! run that has not been fetched yet (`skip`). It is validated into a typed
//! [`Chunk`] before processing.

use serde::{Deserialize, Serialize};

use super::line::Highlight;
use crate::error::{DiffError, Result};
use crate::text::string_length;

/// Complete diff for one file as returned by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffInfo {
    #[serde(default)]
    pub content: Vec<DiffContent>,
    #[serde(default)]
    pub binary: bool,
}

/// One chunk of the diff payload, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Vec<String>>,
    /// The `a`/`b` lines differ only in whitespace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub common: bool,
    /// Number of common lines left out of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    /// Intraline edits as `[skip, mark]` pairs over the `a` lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_a: Option<Vec<(usize, usize)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_b: Option<Vec<(usize, usize)>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub due_to_rebase: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_details: Option<MoveDetails>,
    #[serde(default, rename = "keyLocation", skip_serializing_if = "std::ops::Not::not")]
    pub key_location: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDetails {
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<MoveRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRange {
    pub start: u32,
    pub end: u32,
}

/// Validated chunk content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkBody {
    /// Lines present unchanged on both sides
    Common(Vec<String>),
    /// Removed (`a`) and added (`b`) lines. `common` marks whitespace-only changes.
    Delta {
        a: Vec<String>,
        b: Vec<String>,
        edit_a: Option<Vec<(usize, usize)>>,
        edit_b: Option<Vec<(usize, usize)>>,
        common: bool,
    },
    /// Common lines not included in the payload
    Skip(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub body: ChunkBody,
    pub due_to_rebase: bool,
    pub move_details: Option<MoveDetails>,
    pub key_location: bool,
}

impl Chunk {
    /// Validate a server chunk. `index` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::MismatchedCommonChunk`] when a whitespace-only
    /// chunk has a different number of lines on each side.
    pub fn from_content(index: usize, content: &DiffContent) -> Result<Self> {
        let body = if let Some(skip) = content.skip {
            ChunkBody::Skip(skip)
        } else if let Some(ab) = &content.ab {
            ChunkBody::Common(ab.clone())
        } else {
            let a = content.a.clone().unwrap_or_default();
            let b = content.b.clone().unwrap_or_default();
            if content.common && a.len() != b.len() {
                return Err(DiffError::MismatchedCommonChunk {
                    index,
                    a: a.len(),
                    b: b.len(),
                });
            }
            ChunkBody::Delta {
                a,
                b,
                edit_a: content.edit_a.clone(),
                edit_b: content.edit_b.clone(),
                common: content.common,
            }
        };

        Ok(Self {
            body,
            due_to_rebase: content.due_to_rebase,
            move_details: content.move_details,
            key_location: content.key_location,
        })
    }

    #[must_use]
    pub const fn common(lines: Vec<String>) -> Self {
        Self::with_body(ChunkBody::Common(lines))
    }

    #[must_use]
    pub const fn with_body(body: ChunkBody) -> Self {
        Self {
            body,
            due_to_rebase: false,
            move_details: None,
            key_location: false,
        }
    }

    /// Number of lines on the left side.
    #[must_use]
    pub fn left_len(&self) -> usize {
        match &self.body {
            ChunkBody::Common(ab) => ab.len(),
            ChunkBody::Delta { a, .. } => a.len(),
            ChunkBody::Skip(n) => *n as usize,
        }
    }

    /// Number of lines on the right side.
    #[must_use]
    pub fn right_len(&self) -> usize {
        match &self.body {
            ChunkBody::Common(ab) => ab.len(),
            ChunkBody::Delta { b, .. } => b.len(),
            ChunkBody::Skip(n) => *n as usize,
        }
    }

    /// Common, whitespace-only, or skipped content.
    #[must_use]
    pub const fn is_common(&self) -> bool {
        matches!(
            self.body,
            ChunkBody::Common(_) | ChunkBody::Skip(_) | ChunkBody::Delta { common: true, .. }
        )
    }

    /// Whether the chunk may be hidden behind a context control.
    #[must_use]
    pub const fn is_collapsible(&self) -> bool {
        self.is_common() && !self.key_location
    }

    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self.body, ChunkBody::Skip(_))
    }
}

/// Convert run-length intraline edit info into per-line highlights.
///
/// `infos` alternates unchanged and changed lengths over the concatenation of
/// `rows`, where each row counts one extra position for its newline. A changed
/// run that crosses a line break is split into one highlight per line; every
/// highlight except the last of the run is open-ended.
#[must_use]
pub fn convert_intraline_infos(rows: &[String], infos: &[(usize, usize)]) -> Vec<Highlight> {
    let line_lengths: Vec<usize> = rows.iter().map(|r| string_length(r) + 1).collect();
    let mut row = 0usize;
    let mut idx = 0usize;
    let mut normalized = Vec::new();

    for &(skip_length, mark_length) in infos {
        let mut line_length = line_lengths.get(row).copied();
        let mut j = 0;
        while j < skip_length {
            let Some(len) = line_length else { break };
            if idx == len {
                idx = 0;
                row += 1;
                line_length = line_lengths.get(row).copied();
                continue;
            }
            idx += 1;
            j += 1;
        }

        let mut current = Highlight {
            content_index: row,
            start_index: idx,
            end_index: None,
        };
        j = 0;
        while let Some(len) = line_length {
            if j >= mark_length {
                break;
            }
            if idx == len {
                idx = 0;
                row += 1;
                line_length = line_lengths.get(row).copied();
                normalized.push(current);
                current = Highlight {
                    content_index: row,
                    start_index: 0,
                    end_index: None,
                };
                continue;
            }
            idx += 1;
            j += 1;
        }
        current.end_index = Some(idx);
        normalized.push(current);
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn parses_wire_format() {
        let json = r#"[
            {"ab": ["a", "b"]},
            {"a": ["x"], "b": ["y"], "edit_a": [[0, 1]], "due_to_rebase": true},
            {"skip": 40},
            {"a": [" z"], "b": ["z"], "common": true, "keyLocation": true}
        ]"#;
        let content: Vec<DiffContent> = serde_json::from_str(json).expect("valid payload");
        assert_eq!(content.len(), 4);
        assert_eq!(content[1].edit_a, Some(vec![(0, 1)]));
        assert!(content[1].due_to_rebase);
        assert_eq!(content[2].skip, Some(40));
        assert!(content[3].key_location);

        let chunks: Vec<Chunk> = content
            .iter()
            .enumerate()
            .map(|(i, c)| Chunk::from_content(i, c))
            .collect::<Result<_>>()
            .expect("valid chunks");
        assert!(chunks[0].is_collapsible());
        assert!(!chunks[1].is_common());
        assert!(chunks[2].is_skip());
        assert!(chunks[3].is_common());
        assert!(!chunks[3].is_collapsible());
    }

    #[test]
    fn rejects_mismatched_common_chunk() {
        let content = DiffContent {
            a: Some(rows(&["a", "b"])),
            b: Some(rows(&["a"])),
            common: true,
            ..DiffContent::default()
        };
        assert_eq!(
            Chunk::from_content(3, &content),
            Err(DiffError::MismatchedCommonChunk { index: 3, a: 2, b: 1 })
        );
    }

    #[test]
    fn intraline_spans_across_lines() {
        let content = rows(&["🙈 a", "🙉 b", "🙊 c"]);
        let result = convert_intraline_infos(&content, &[(2, 7)]);
        assert_eq!(
            result,
            vec![
                Highlight { content_index: 0, start_index: 2, end_index: None },
                Highlight { content_index: 1, start_index: 0, end_index: None },
                Highlight { content_index: 2, start_index: 0, end_index: Some(1) },
            ]
        );
    }

    #[test]
    fn intraline_spans_within_lines() {
        let content = rows(&["let x = 1;", "", "let y = 2;"]);
        // "x" on the first line, then "y" on the third.
        let result = convert_intraline_infos(&content, &[(4, 1), (11, 1)]);
        assert_eq!(
            result,
            vec![
                Highlight { content_index: 0, start_index: 4, end_index: Some(5) },
                Highlight { content_index: 2, start_index: 4, end_index: Some(5) },
            ]
        );
    }

    #[test]
    fn intraline_info_past_end_is_ignored_gracefully() {
        let content = rows(&["ab"]);
        let result = convert_intraline_infos(&content, &[(10, 2)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].content_index, 1);
    }
}
