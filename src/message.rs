//! Events sent from the pipeline to its host
//!
//! Layers emit these through their listeners; the renderer acts on
//! `RenderRange` itself and queues the rest for the host.

use crate::diff::{LineRange, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEvent {
    /// Lines `start..=end` on `side` must be annotated again
    RenderRange { start: u32, end: u32, side: Side },
    /// A context control over un-fetched lines was expanded; the host must
    /// fetch `line_range` and process the diff again.
    ContentLoadNeeded { line_range: LineRange },
    /// A malformed comment range was repaired for display
    RangeNormalized { id: String, side: Side, line: u32 },
}
