//! Row rendering
//!
//! [`DiffRenderer`] receives groups from the processor and turns each into
//! rows of line-number and content elements decorated by the layer
//! pipeline. It re-renders cells when a layer asks for it and expands
//! context controls in place.

use std::fmt::Write;

use log::debug;

use crate::config::DiffPrefs;
use crate::diff::{
    expand_context_control, ContextExpansion, DiffGroup, DiffLine, DiffLineType, Expanded,
    GroupType, LineRange, Side,
};
use crate::element::Element;
use crate::error::{DiffError, Result};
use crate::layer::LayerPipeline;
use crate::message::DiffEvent;
use crate::processor::GroupConsumer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    SideBySide,
    Unified,
}

/// Layout of line text before the layers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFormat {
    /// Columns between tab stops
    pub tab_size: usize,
    /// Column after which lines are broken
    pub line_length: usize,
    /// Break with `wbr` hints instead of forced breaks
    pub soft_breaks: bool,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            tab_size: 8,
            line_length: 100,
            soft_breaks: false,
        }
    }
}

impl TextFormat {
    /// # Errors
    ///
    /// Returns [`DiffError::InvalidPreference`] for a non-positive `tab_size`
    /// or `line_length`.
    pub fn from_prefs(prefs: &DiffPrefs) -> Result<Self> {
        prefs.validate()?;
        Ok(Self {
            tab_size: prefs.tab_size as usize,
            line_length: prefs.line_length as usize,
            soft_breaks: prefs.line_wrapping,
        })
    }

    fn line_break(self) -> Element {
        if self.soft_breaks {
            Element::new("wbr")
        } else {
            Element::new("span").with_class("br")
        }
    }
}

/// One rendered line on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub line: DiffLine,
    /// Side the layers annotated the line for
    pub side: Side,
    pub line_number: Element,
    pub content: Element,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Side-by-side row; a missing side is blank.
    Pair {
        left: Option<Cell>,
        right: Option<Cell>,
    },
    /// Unified row showing one line with both line numbers.
    Unified { cell: Cell },
    /// Placeholder for hidden lines
    Control { line_range: LineRange, skip: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    /// Index of the group the row was rendered from
    pub group_index: usize,
    pub kind: RowKind,
}

impl DiffRow {
    fn cells(&self) -> impl Iterator<Item = &Cell> {
        let (first, second) = match &self.kind {
            RowKind::Pair { left, right } => (left.as_ref(), right.as_ref()),
            RowKind::Unified { cell } => (Some(cell), None),
            RowKind::Control { .. } => (None, None),
        };
        first.into_iter().chain(second)
    }

    fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        let (first, second) = match &mut self.kind {
            RowKind::Pair { left, right } => (left.as_mut(), right.as_mut()),
            RowKind::Unified { cell } => (Some(cell), None),
            RowKind::Control { .. } => (None, None),
        };
        first.into_iter().chain(second)
    }

    /// Whether the row shows `line` of `side`, hidden lines included.
    #[must_use]
    pub fn contains_line(&self, side: Side, line: u32) -> bool {
        match &self.kind {
            RowKind::Control { line_range, .. } => line_range.side(side).contains(line),
            _ => self.cells().any(|c| c.line.line_on(side) == Some(line)),
        }
    }
}

pub struct DiffRenderer {
    mode: ViewMode,
    format: TextFormat,
    pipeline: LayerPipeline,
    groups: Vec<DiffGroup>,
    rows: Vec<DiffRow>,
    events: Vec<DiffEvent>,
}

impl GroupConsumer for DiffRenderer {
    fn add_group(&mut self, group: DiffGroup) {
        let index = self.groups.len();
        let rows = self.render_group(index, &group);
        self.rows.extend(rows);
        self.groups.push(group);
    }

    fn clear_groups(&mut self) {
        self.groups.clear();
        self.rows.clear();
    }
}

impl DiffRenderer {
    #[must_use]
    pub fn new(mode: ViewMode, pipeline: LayerPipeline) -> Self {
        Self {
            mode,
            format: TextFormat::default(),
            pipeline,
            groups: Vec::new(),
            rows: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Renderer laying out text by `prefs`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::InvalidPreference`] for a non-positive `tab_size`
    /// or `line_length`.
    pub fn from_prefs(
        mode: ViewMode,
        pipeline: LayerPipeline,
        prefs: &DiffPrefs,
    ) -> Result<Self> {
        let mut renderer = Self::new(mode, pipeline);
        renderer.format = TextFormat::from_prefs(prefs)?;
        Ok(renderer)
    }

    #[must_use]
    pub const fn format(&self) -> TextFormat {
        self.format
    }

    pub const fn pipeline_mut(&mut self) -> &mut LayerPipeline {
        &mut self.pipeline
    }

    #[must_use]
    pub fn groups(&self) -> &[DiffGroup] {
        &self.groups
    }

    #[must_use]
    pub fn rows(&self) -> &[DiffRow] {
        &self.rows
    }

    /// Events for the host, e.g. content that has to be loaded.
    pub fn take_events(&mut self) -> Vec<DiffEvent> {
        std::mem::take(&mut self.events)
    }

    /// Expand the context control at `group_index`. Returns `false` if that
    /// group is not a context control.
    ///
    /// Lines next to un-fetched ones cannot be revealed; the control stays
    /// and a [`DiffEvent::ContentLoadNeeded`] is queued instead.
    pub fn expand_context(&mut self, group_index: usize, expansion: ContextExpansion) -> bool {
        let is_control = self
            .groups
            .get(group_index)
            .is_some_and(|g| g.group_type == GroupType::ContextControl);
        if !is_control {
            return false;
        }

        let control = self.groups.remove(group_index);
        let keep = control.clone();
        match expand_context_control(control, expansion) {
            Expanded::Groups(groups) => {
                self.groups.splice(group_index..group_index, groups);
            }
            Expanded::LoadNeeded(line_range) => {
                self.groups.insert(group_index, keep);
                self.events.push(DiffEvent::ContentLoadNeeded { line_range });
            }
        }
        self.rebuild_rows();
        true
    }

    /// Apply layer events: re-render requested lines and queue the rest for
    /// the host.
    pub fn process_notifications(&mut self) {
        for event in self.pipeline.drain_events() {
            match event {
                DiffEvent::RenderRange { start, end, side } => {
                    self.rerender_range(start, end, side);
                }
                other => self.events.push(other),
            }
        }
    }

    /// Row showing `line` of `side`, or the control hiding it.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::InvalidLineNumber`] for line 0.
    pub fn row_for_line(&self, side: Side, line: u32) -> Result<Option<&DiffRow>> {
        if line == 0 {
            return Err(DiffError::InvalidLineNumber(line));
        }
        Ok(self.rows.iter().find(|row| row.contains_line(side, line)))
    }

    fn rerender_range(&mut self, start: u32, end: u32, side: Side) {
        let mut count = 0;
        for row in &mut self.rows {
            for cell in row.cells_mut() {
                let shown = cell
                    .line
                    .line_on(side)
                    .is_some_and(|n| (start..=end).contains(&n));
                if shown {
                    *cell = render_cell(
                        &mut self.pipeline,
                        cell.line.clone(),
                        cell.side,
                        self.format,
                    );
                    count += 1;
                }
            }
        }
        debug!("re-rendered {count} cells for {} {start}..={end}", side.as_str());
    }

    fn rebuild_rows(&mut self) {
        let groups = std::mem::take(&mut self.groups);
        self.rows.clear();
        for (index, group) in groups.iter().enumerate() {
            let rows = self.render_group(index, group);
            self.rows.extend(rows);
        }
        self.groups = groups;
    }

    fn render_group(&mut self, group_index: usize, group: &DiffGroup) -> Vec<DiffRow> {
        if group.group_type == GroupType::ContextControl || group.skip.is_some() {
            return vec![DiffRow {
                group_index,
                kind: RowKind::Control {
                    line_range: group.line_range(),
                    skip: group.has_skip_group(),
                },
            }];
        }

        let format = self.format;
        let pipeline = &mut self.pipeline;
        let mut cell = |line: &DiffLine, side| render_cell(pipeline, line.clone(), side, format);

        match self.mode {
            ViewMode::SideBySide => group
                .side_by_side_pairs()
                .into_iter()
                .filter(|(l, r)| !l.or(*r).is_some_and(DiffLine::is_pseudo))
                .map(|(left, right)| DiffRow {
                    group_index,
                    kind: RowKind::Pair {
                        left: left.map(|l| cell(l, Side::Left)),
                        right: right.map(|r| cell(r, Side::Right)),
                    },
                })
                .collect(),
            ViewMode::Unified => group
                .lines()
                .iter()
                .filter(|l| !l.is_pseudo())
                .map(|line| {
                    let side = if line.line_type == DiffLineType::Remove {
                        Side::Left
                    } else {
                        Side::Right
                    };
                    DiffRow {
                        group_index,
                        kind: RowKind::Unified {
                            cell: cell(line, side),
                        },
                    }
                })
                .collect(),
        }
    }

    /// Serialize all rows as a table.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mode_class = match self.mode {
            ViewMode::SideBySide => "side-by-side",
            ViewMode::Unified => "unified",
        };
        let mut out = format!("<table class=\"diff-table {mode_class}\">\n");
        for row in &self.rows {
            let _ = writeln!(out, "{}", row_element(row).to_markup());
        }
        out.push_str("</table>\n");
        out
    }
}

const fn line_type_class(line_type: DiffLineType) -> &'static str {
    match line_type {
        DiffLineType::Add => "add",
        DiffLineType::Remove => "remove",
        DiffLineType::Both => "both",
        DiffLineType::Blank => "blank",
    }
}

fn line_number_element(line: &DiffLine, side: Side) -> Element {
    let mut el = Element::new("td").with_class("lineNum").with_class(side.as_str());
    if let Some(number) = line.number(side) {
        let value = number.to_string();
        el.set_attribute("data-value", &value);
        el.append_text(&value);
    }
    el
}

/// Content element for `text`. Tabs become wrappers sized to reach the next
/// tab stop, and a break is inserted whenever a line reaches
/// `line_length` columns. Breaks hold no text, so code point offsets used
/// by the layers stay valid.
fn format_text(text: &str, format: TextFormat) -> Element {
    let mut content = Element::new("div").with_class("contentText");
    let tab_size = format.tab_size.max(1);
    let limit = format.line_length.max(1);
    let mut column = 0;
    let mut run = String::new();

    for c in text.chars() {
        if c == '\t' {
            content.append_text(&std::mem::take(&mut run));
            let mut width = tab_size - column % tab_size;
            if column + width > limit {
                content.append_child(format.line_break());
                column = 0;
                width = tab_size;
            }
            let mut tab = Element::new("span")
                .with_class("tab-stop")
                .with_text("\t");
            tab.set_attribute(
                "style",
                &format!("tab-size: {width}; -moz-tab-size: {width};"),
            );
            content.append_child(tab);
            column += width;
        } else {
            if column >= limit {
                content.append_text(&std::mem::take(&mut run));
                content.append_child(format.line_break());
                column = 0;
            }
            run.push(c);
            column += 1;
        }
    }
    content.append_text(&run);
    content
}

/// Fresh elements for `line`, decorated by every layer.
fn render_cell(
    pipeline: &mut LayerPipeline,
    line: DiffLine,
    side: Side,
    format: TextFormat,
) -> Cell {
    let mut line_number = line_number_element(&line, side);
    let mut content = format_text(&line.text, format);
    content.set_attribute("data-side", side.as_str());

    pipeline.annotate_line(&mut content, Some(&mut line_number), &line, side);
    Cell {
        line,
        side,
        line_number,
        content,
    }
}

fn content_cell(cell: Option<&Cell>) -> Element {
    let mut td = Element::new("td").with_class("content");
    if let Some(cell) = cell {
        td.add_class(line_type_class(cell.line.line_type));
        td.append_child(cell.content.clone());
    } else {
        td.add_class("blank");
    }
    td
}

fn row_element(row: &DiffRow) -> Element {
    let mut tr = Element::new("tr");
    match &row.kind {
        RowKind::Pair { left, right } => {
            tr.add_class("diff-row side-by-side");
            for (cell, side) in [(left.as_ref(), Side::Left), (right.as_ref(), Side::Right)] {
                tr.append_child(cell.map_or_else(
                    || Element::new("td").with_class("lineNum blank").with_class(side.as_str()),
                    |c| c.line_number.clone(),
                ));
                tr.append_child(content_cell(cell));
            }
        }
        RowKind::Unified { cell } => {
            tr.add_class("diff-row unified");
            let left_number = if cell.side == Side::Left {
                cell.line_number.clone()
            } else {
                line_number_element(&cell.line, Side::Left)
            };
            let right_number = if cell.side == Side::Right {
                cell.line_number.clone()
            } else {
                line_number_element(&cell.line, Side::Right)
            };
            tr.append_child(left_number);
            tr.append_child(right_number);
            tr.append_child(content_cell(Some(cell)));
        }
        RowKind::Control { line_range, skip } => {
            tr.add_class("contextControl");
            let mut td = Element::new("td").with_class("contextLineNum");
            td.set_attribute("colspan", "4");
            let hidden = line_range.left.len().max(line_range.right.len());
            let label = if *skip {
                format!("{hidden} common lines (not loaded)")
            } else {
                format!("+{hidden} common lines")
            };
            td.append_text(&label);
            tr.append_child(td);
        }
    }
    tr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Context;
    use crate::diff::{DiffContent, DiffInfo, SideRange, PARTIAL_CONTEXT_AMOUNT};
    use crate::layer::{CommentRange, CommentRangeLayer, RangedCommentLayer, TokenHighlightLayer};
    use crate::processor::{ChunkProcessor, ProcessOutcome, ThreadScheduler};

    fn rows(prefix: &str, count: usize) -> Option<Vec<String>> {
        Some((1..=count).map(|i| format!("{prefix} {i}")).collect())
    }

    fn sample() -> DiffInfo {
        DiffInfo {
            content: vec![
                DiffContent {
                    a: rows("old", 1),
                    b: rows("new", 2),
                    ..DiffContent::default()
                },
                DiffContent {
                    ab: rows("same", 30),
                    ..DiffContent::default()
                },
                DiffContent {
                    b: rows("tail", 1),
                    ..DiffContent::default()
                },
            ],
            binary: false,
        }
    }

    fn render(mode: ViewMode, pipeline: LayerPipeline, info: &DiffInfo) -> DiffRenderer {
        let mut renderer = DiffRenderer::new(mode, pipeline);
        let mut processor = ChunkProcessor::new(Context::Lines(3));
        let task = processor.process(info, &mut renderer).unwrap();
        assert_eq!(
            task.run(&mut renderer, &mut ThreadScheduler),
            ProcessOutcome::Completed
        );
        renderer
    }

    fn control_index(renderer: &DiffRenderer) -> usize {
        renderer
            .groups()
            .iter()
            .position(|g| g.group_type == GroupType::ContextControl)
            .unwrap()
    }

    #[test]
    fn side_by_side_pairs_removes_with_adds() {
        let renderer = render(ViewMode::SideBySide, LayerPipeline::new(), &sample());
        let RowKind::Pair { left, right } = &renderer.rows()[0].kind else {
            panic!("expected a pair row");
        };
        assert_eq!(left.as_ref().unwrap().line.text, "old 1");
        assert_eq!(right.as_ref().unwrap().line.text, "new 1");

        let RowKind::Pair { left, right } = &renderer.rows()[1].kind else {
            panic!("expected a pair row");
        };
        assert!(left.is_none());
        assert_eq!(right.as_ref().unwrap().content.attribute("data-side"), Some("right"));

        // 2 delta rows, 3 visible, control, 3 visible, tail
        assert_eq!(renderer.rows().len(), 10);
        assert!(matches!(renderer.rows()[5].kind, RowKind::Control { skip: false, .. }));
    }

    #[test]
    fn unified_has_one_row_per_line() {
        let renderer = render(ViewMode::Unified, LayerPipeline::new(), &sample());
        assert_eq!(renderer.rows().len(), 11);
        let markup = renderer.to_markup();
        assert!(markup.starts_with("<table class=\"diff-table unified\">"));
        assert!(markup.contains("data-value=\"3\""));
    }

    #[test]
    fn expanding_context_reveals_hidden_lines() {
        let mut renderer = render(ViewMode::SideBySide, LayerPipeline::new(), &sample());
        let index = control_index(&renderer);
        assert!(!renderer.expand_context(0, ContextExpansion::All));

        assert!(renderer.expand_context(index, ContextExpansion::Above(PARTIAL_CONTEXT_AMOUNT)));
        assert!(renderer
            .groups()
            .iter()
            .any(|g| g.group_type == GroupType::ContextControl));

        let index = control_index(&renderer);
        assert!(renderer.expand_context(index, ContextExpansion::All));
        assert!(renderer
            .groups()
            .iter()
            .all(|g| g.group_type != GroupType::ContextControl));
        assert_eq!(renderer.rows().len(), 33);
        assert!(renderer.take_events().is_empty());
    }

    #[test]
    fn expanding_unloaded_lines_asks_host() {
        let info = DiffInfo {
            content: vec![
                DiffContent {
                    b: rows("new", 1),
                    ..DiffContent::default()
                },
                DiffContent {
                    skip: Some(50),
                    ..DiffContent::default()
                },
            ],
            binary: false,
        };
        let mut renderer = render(ViewMode::SideBySide, LayerPipeline::new(), &info);
        let index = control_index(&renderer);
        assert!(renderer.expand_context(index, ContextExpansion::All));

        let events = renderer.take_events();
        assert_eq!(events.len(), 1);
        let DiffEvent::ContentLoadNeeded { line_range } = events[0] else {
            panic!("expected a load request");
        };
        assert_eq!((line_range.right.start, line_range.right.end), (2, 51));
        assert_eq!(control_index(&renderer), index);
    }

    #[test]
    fn partial_expansion_next_to_unloaded_lines_asks_host() {
        let info = DiffInfo {
            content: vec![
                DiffContent {
                    b: rows("new", 1),
                    ..DiffContent::default()
                },
                DiffContent {
                    skip: Some(50),
                    ..DiffContent::default()
                },
                DiffContent {
                    ab: rows("same", 20),
                    ..DiffContent::default()
                },
                DiffContent {
                    b: rows("tail", 1),
                    ..DiffContent::default()
                },
            ],
            binary: false,
        };
        let mut renderer = render(ViewMode::SideBySide, LayerPipeline::new(), &info);
        let index = control_index(&renderer);
        let group_count = renderer.groups().len();

        assert!(renderer.expand_context(index, ContextExpansion::Above(10)));
        assert_eq!(renderer.groups().len(), group_count);
        assert_eq!(control_index(&renderer), index);
        assert_eq!(
            renderer.take_events(),
            vec![DiffEvent::ContentLoadNeeded {
                line_range: LineRange {
                    left: SideRange { start: 1, end: 50 },
                    right: SideRange { start: 2, end: 51 },
                },
            }]
        );

        // the far edge is loaded, so it can be revealed
        assert!(renderer.expand_context(index, ContextExpansion::Below(10)));
        assert!(renderer.take_events().is_empty());
        let row = renderer.row_for_line(Side::Left, 58).unwrap().unwrap();
        assert!(matches!(row.kind, RowKind::Pair { .. }));
        let row = renderer.row_for_line(Side::Left, 57).unwrap().unwrap();
        assert!(matches!(row.kind, RowKind::Control { skip: true, .. }));
    }

    fn markup(text: &str, format: TextFormat) -> String {
        format_text(text, format).to_markup()
    }

    #[test]
    fn tabs_reach_next_tab_stop() {
        let format = TextFormat {
            tab_size: 4,
            ..TextFormat::default()
        };
        let content = format_text("\tab\tc", format);
        let widths: Vec<_> = content
            .find_all_by_class("tab-stop")
            .iter()
            .map(|tab| tab.attribute("style").unwrap().to_string())
            .collect();
        assert_eq!(
            widths,
            vec![
                "tab-size: 4; -moz-tab-size: 4;",
                "tab-size: 2; -moz-tab-size: 2;"
            ]
        );
        assert_eq!(content.text_content(), "\tab\tc");
        assert_eq!(content.text_len(), 5);
    }

    #[test]
    fn long_lines_break_at_line_length() {
        let format = TextFormat {
            line_length: 5,
            ..TextFormat::default()
        };
        assert_eq!(
            markup("abcdefgh", format),
            "<div class=\"contentText\">abcde<span class=\"br\"></span>fgh</div>"
        );
        assert_eq!(
            markup("abcde", format),
            "<div class=\"contentText\">abcde</div>"
        );
    }

    #[test]
    fn tab_crossing_line_length_starts_new_line() {
        let format = TextFormat {
            tab_size: 4,
            line_length: 6,
            soft_breaks: false,
        };
        assert_eq!(
            markup("abcde\tx", format),
            "<div class=\"contentText\">abcde<span class=\"br\"></span>\
             <span class=\"tab-stop\" style=\"tab-size: 4; -moz-tab-size: 4;\">\t</span>x</div>"
        );
    }

    #[test]
    fn line_wrapping_uses_soft_breaks() {
        let format = TextFormat::from_prefs(&DiffPrefs {
            line_length: 3,
            line_wrapping: true,
            ..DiffPrefs::default()
        })
        .unwrap();
        assert_eq!(
            markup("abcd", format),
            "<div class=\"contentText\">abc<wbr></wbr>d</div>"
        );
    }

    #[test]
    fn renderer_from_prefs_formats_cells() {
        let prefs = DiffPrefs {
            tab_size: 2,
            ..DiffPrefs::default()
        };
        assert_eq!(
            DiffRenderer::from_prefs(
                ViewMode::Unified,
                LayerPipeline::new(),
                &DiffPrefs {
                    line_length: 0,
                    ..DiffPrefs::default()
                }
            )
            .err(),
            Some(DiffError::InvalidPreference {
                name: "line_length",
                value: 0
            })
        );

        let mut renderer =
            DiffRenderer::from_prefs(ViewMode::Unified, LayerPipeline::new(), &prefs).unwrap();
        assert_eq!(renderer.format().tab_size, 2);
        let info = DiffInfo {
            content: vec![DiffContent {
                b: Some(vec!["\tx".to_string()]),
                ..DiffContent::default()
            }],
            binary: false,
        };
        let mut processor = ChunkProcessor::new(Context::Lines(3));
        let task = processor.process(&info, &mut renderer).unwrap();
        assert_eq!(
            task.run(&mut renderer, &mut ThreadScheduler),
            ProcessOutcome::Completed
        );
        assert!(renderer
            .to_markup()
            .contains("<span class=\"tab-stop\" style=\"tab-size: 2; -moz-tab-size: 2;\">"));
    }

    #[test]
    fn row_lookup() {
        let renderer = render(ViewMode::SideBySide, LayerPipeline::new(), &sample());
        assert_eq!(
            renderer.row_for_line(Side::Right, 0),
            Err(DiffError::InvalidLineNumber(0))
        );
        let row = renderer.row_for_line(Side::Right, 10).unwrap().unwrap();
        assert!(matches!(row.kind, RowKind::Control { .. }));
        let row = renderer.row_for_line(Side::Left, 1).unwrap().unwrap();
        assert_eq!(row.group_index, 2);
        assert!(renderer.row_for_line(Side::Left, 500).unwrap().is_none());
    }

    #[test]
    fn layer_notifications_rerender_cells() {
        let mut pipeline = LayerPipeline::new();
        pipeline.push(Box::new(RangedCommentLayer::new()));
        let mut renderer = render(ViewMode::SideBySide, pipeline, &sample());

        let layer = renderer
            .pipeline_mut()
            .layer_mut::<RangedCommentLayer>()
            .unwrap();
        layer.set_ranges(vec![CommentRangeLayer {
            id: "c".to_string(),
            side: Side::Right,
            range: CommentRange {
                start_line: 1,
                start_character: 0,
                end_line: 1,
                end_character: 3,
            },
            hovering: false,
        }]);
        renderer.process_notifications();

        let RowKind::Pair { right, .. } = &renderer.rows()[0].kind else {
            panic!("expected a pair row");
        };
        let marked = right.as_ref().unwrap().content.find_all_by_class("range");
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].text_content(), "new");
    }

    #[test]
    fn token_hover_round_trip() {
        let mut pipeline = LayerPipeline::new();
        pipeline.push(Box::new(TokenHighlightLayer::new()));
        let mut renderer = render(ViewMode::SideBySide, pipeline, &sample());

        let now = std::time::Instant::now();
        let layer = renderer
            .pipeline_mut()
            .layer_mut::<TokenHighlightLayer>()
            .unwrap();
        layer.mouse_over(Side::Right, 4, "same", now);
        layer.tick(now + crate::layer::HOVER_DELAY);
        renderer.process_notifications();

        let highlighted = renderer
            .rows()
            .iter()
            .flat_map(DiffRow::cells)
            .filter(|c| !c.content.find_all_by_class(crate::layer::CSS_HIGHLIGHT).is_empty())
            .count();
        // 6 visible "same" lines on both sides
        assert_eq!(highlighted, 12);
    }
}
