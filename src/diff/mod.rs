//! Diff data model: server chunks, lines and renderable groups

mod chunk;
mod group;
mod line;
mod parse;

pub use chunk::{
    convert_intraline_infos, Chunk, ChunkBody, DiffContent, DiffInfo, MoveDetails, MoveRange,
};
pub use group::{
    expand_context_control, hide_in_context_control, ContextExpansion, DiffGroup, Expanded,
    GroupOptions, GroupType, LineRange, SideRange, MIN_HIDDEN_LINES, PARTIAL_CONTEXT_AMOUNT,
};
pub use line::{DiffLine, DiffLineType, Highlight, LineNumber, Side};
pub use parse::{Hunk, HunkLineKind, UnifiedDiff};
