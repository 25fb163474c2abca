//! Single diff lines and their intraline highlights.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Side of a side-by-side diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Type of diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineType {
    Add,
    Remove,
    Both,
    Blank,
}

/// Line number of a diff line on one side.
///
/// `File` and `Lost` are pseudo-lines: the former anchors file-level comments,
/// the latter comments that could not be placed on any line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineNumber {
    Line(u32),
    File,
    Lost,
}

impl LineNumber {
    /// The numeric line, if this is a real line.
    #[must_use]
    pub const fn as_line(self) -> Option<u32> {
        match self {
            Self::Line(n) => Some(n),
            Self::File | Self::Lost => None,
        }
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(n) => write!(f, "{n}"),
            Self::File => f.write_str("FILE"),
            Self::Lost => f.write_str("LOST"),
        }
    }
}

/// An intraline edit span, in code points.
///
/// `end_index` of `None` means the span runs to the end of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub content_index: usize,
    pub start_index: usize,
    pub end_index: Option<usize>,
}

/// A single line in a diff group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    /// Line number in the old file (absent for added lines)
    pub before_number: Option<LineNumber>,
    /// Line number in the new file (absent for removed lines)
    pub after_number: Option<LineNumber>,
    pub text: String,
    pub highlights: Vec<Highlight>,
    pub has_intraline_info: bool,
}

impl DiffLine {
    #[must_use]
    pub fn new(line_type: DiffLineType) -> Self {
        Self {
            line_type,
            before_number: None,
            after_number: None,
            text: String::new(),
            highlights: Vec::new(),
            has_intraline_info: false,
        }
    }

    /// A pseudo-line shown on both sides, e.g. the `FILE` line.
    #[must_use]
    pub fn pseudo(number: LineNumber) -> Self {
        Self {
            before_number: Some(number),
            after_number: Some(number),
            ..Self::new(DiffLineType::Both)
        }
    }

    /// Line number for a side.
    #[must_use]
    pub const fn number(&self, side: Side) -> Option<LineNumber> {
        match side {
            Side::Left => self.before_number,
            Side::Right => self.after_number,
        }
    }

    /// Numeric line for a side, ignoring pseudo-lines.
    #[must_use]
    pub fn line_on(&self, side: Side) -> Option<u32> {
        self.number(side).and_then(LineNumber::as_line)
    }

    #[must_use]
    pub const fn is_delta(&self) -> bool {
        matches!(self.line_type, DiffLineType::Add | DiffLineType::Remove)
    }

    #[must_use]
    pub fn is_pseudo(&self) -> bool {
        matches!(
            self.before_number,
            Some(LineNumber::File | LineNumber::Lost)
        ) || matches!(self.after_number, Some(LineNumber::File | LineNumber::Lost))
    }
}
