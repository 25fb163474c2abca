//! Comment range highlighting
//!
//! Ranges are split into one span per line and indexed by side and line.
//! Replacing the set of ranges only re-renders the lines of ranges that were
//! added, removed or changed.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{AnnotationLayer, LayerListener, ListenerId, Listeners};
use crate::annotation::annotate_element;
use crate::diff::{DiffLine, Side};
use crate::element::Element;
use crate::message::DiffEvent;
use crate::text::string_length;

pub const CSS_RANGE: &str = "range";
pub const CSS_HOVER: &str = "rangeHoverHighlight";

/// Ranges spanning more lines than this are only shown while hovered.
const LONG_RANGE_LINES: u32 = 10;

/// Commented text, from a start position to an end position. Characters are
/// code points; the end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    pub start_line: u32,
    pub start_character: usize,
    pub end_line: u32,
    pub end_character: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRangeLayer {
    pub id: String,
    pub side: Side,
    pub range: CommentRange,
    pub hovering: bool,
}

impl CommentRangeLayer {
    const fn is_long(&self) -> bool {
        self.range.end_line.saturating_sub(self.range.start_line) > LONG_RANGE_LINES
    }
}

/// Part of a range on a single line. `end` of `None` runs to end of line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LineSpan {
    id: String,
    start: usize,
    end: Option<usize>,
    long_range: bool,
    hovering: bool,
}

#[derive(Debug, Default)]
pub struct RangedCommentLayer {
    ranges: Vec<CommentRangeLayer>,
    left: BTreeMap<u32, Vec<LineSpan>>,
    right: BTreeMap<u32, Vec<LineSpan>>,
    /// Lines already reported as normalized, by range id
    normalized: HashSet<(String, Side, u32)>,
    listeners: Listeners,
}

impl RangedCommentLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ranges(&self) -> &[CommentRangeLayer] {
        &self.ranges
    }

    /// Replace all ranges. Ranges are matched by id; only lines of ranges
    /// that changed are re-rendered.
    pub fn set_ranges(&mut self, ranges: Vec<CommentRangeLayer>) {
        let new_by_id: HashMap<&str, &CommentRangeLayer> =
            ranges.iter().map(|r| (r.id.as_str(), r)).collect();
        let old = std::mem::take(&mut self.ranges);
        let old_by_id: HashMap<&str, &CommentRangeLayer> =
            old.iter().map(|r| (r.id.as_str(), r)).collect();

        for range in &old {
            if new_by_id.get(range.id.as_str()) != Some(&range) {
                self.unindex(range);
                self.notify(range);
            }
        }
        for range in &ranges {
            if old_by_id.get(range.id.as_str()) != Some(&range) {
                self.index(range);
                self.notify(range);
            }
        }
        self.ranges = ranges;
    }

    fn spans_mut(&mut self, side: Side) -> &mut BTreeMap<u32, Vec<LineSpan>> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn index(&mut self, range: &CommentRangeLayer) {
        let r = range.range;
        let long_range = range.is_long();
        let spans = self.spans_mut(range.side);
        for line in r.start_line..=r.end_line {
            let start = if line == r.start_line { r.start_character } else { 0 };
            let end = (line == r.end_line).then_some(r.end_character);
            spans.entry(line).or_default().push(LineSpan {
                id: range.id.clone(),
                start,
                end,
                long_range,
                hovering: range.hovering,
            });
        }
    }

    fn unindex(&mut self, range: &CommentRangeLayer) {
        self.normalized
            .retain(|(id, side, _)| *id != range.id || *side != range.side);
        let r = range.range;
        let spans = self.spans_mut(range.side);
        for line in r.start_line..=r.end_line {
            if let Some(line_spans) = spans.get_mut(&line) {
                line_spans.retain(|s| s.id != range.id);
                if line_spans.is_empty() {
                    spans.remove(&line);
                }
            }
        }
    }

    fn notify(&self, range: &CommentRangeLayer) {
        self.listeners
            .notify_range(range.range.start_line, range.range.end_line, range.side);
    }
}

impl AnnotationLayer for RangedCommentLayer {
    fn name(&self) -> &'static str {
        "ranged-comment"
    }

    fn annotate(
        &mut self,
        content: &mut Element,
        _line_number: Option<&mut Element>,
        line: &DiffLine,
        side: Side,
    ) -> anyhow::Result<()> {
        let Some(number) = line.line_on(side) else {
            return Ok(());
        };
        let spans = match side {
            Side::Left => self.left.get(&number),
            Side::Right => self.right.get(&number),
        };
        let Some(spans) = spans else {
            return Ok(());
        };

        let len = string_length(&line.text);
        let mut visible: Vec<&LineSpan> = spans
            .iter()
            .filter(|s| s.hovering || !s.long_range)
            .collect();
        // hovered ranges go last so they end up innermost
        visible.sort_by_key(|s| s.hovering);

        for span in visible {
            let mut end = span.end.unwrap_or(len);
            if span.start >= end && span.start < len {
                end = len;
                if self.normalized.insert((span.id.clone(), side, number)) {
                    self.listeners.notify(&DiffEvent::RangeNormalized {
                        id: span.id.clone(),
                        side,
                        line: number,
                    });
                }
            }
            if span.start >= end {
                continue;
            }
            let class = if span.hovering { CSS_HOVER } else { CSS_RANGE };
            annotate_element(content, span.start, end - span.start, class);
        }
        Ok(())
    }

    fn add_listener(&mut self, listener: LayerListener) {
        self.listeners.add(listener);
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
