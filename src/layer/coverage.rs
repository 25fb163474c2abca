//! Test coverage on line numbers

use std::any::Any;

use serde::{Deserialize, Serialize};

use super::{require_line_number, AnnotationLayer, LayerListener, ListenerId, Listeners};
use crate::diff::{DiffLine, Side};
use crate::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageType {
    Covered,
    NotCovered,
    PartiallyCovered,
    NotInstrumented,
}

impl CoverageType {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Covered => "COVERED",
            Self::NotCovered => "NOT_COVERED",
            Self::PartiallyCovered => "PARTIALLY_COVERED",
            Self::NotInstrumented => "NOT_INSTRUMENTED",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Covered => "Covered by tests.",
            Self::NotCovered => "Not covered by tests.",
            Self::PartiallyCovered => "Partially covered by tests.",
            Self::NotInstrumented => "Not instrumented by any tests.",
        }
    }
}

/// Inclusive line range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRange {
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRange {
    #[serde(rename = "type")]
    pub coverage_type: CoverageType,
    pub side: Side,
    pub code_range: CodeRange,
}

/// Marks the line numbers of one side with their coverage.
#[derive(Debug)]
pub struct CoverageLayer {
    side: Side,
    ranges: Vec<CoverageRange>,
    listeners: Listeners,
}

impl CoverageLayer {
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            side,
            ranges: Vec::new(),
            listeners: Listeners::default(),
        }
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Replace the coverage data. Ranges for the other side are ignored.
    pub fn set_ranges(&mut self, ranges: &[CoverageRange]) {
        let mut ranges: Vec<CoverageRange> = ranges
            .iter()
            .filter(|r| r.side == self.side)
            .copied()
            .collect();
        ranges.sort_by_key(|r| r.code_range.start_line);

        for range in self.ranges.iter().chain(&ranges) {
            self.listeners.notify_range(
                range.code_range.start_line,
                range.code_range.end_line,
                self.side,
            );
        }
        self.ranges = ranges;
    }

    fn coverage_for(&self, line: u32) -> Option<CoverageType> {
        let candidates = self
            .ranges
            .partition_point(|r| r.code_range.start_line <= line);
        self.ranges[..candidates]
            .iter()
            .rev()
            .find(|r| line <= r.code_range.end_line)
            .map(|r| r.coverage_type)
    }
}

impl AnnotationLayer for CoverageLayer {
    fn name(&self) -> &'static str {
        "coverage"
    }

    fn annotate(
        &mut self,
        _content: &mut Element,
        line_number: Option<&mut Element>,
        line: &DiffLine,
        side: Side,
    ) -> anyhow::Result<()> {
        if side != self.side || self.ranges.is_empty() {
            return Ok(());
        }
        let Some(number) = line.line_on(side) else {
            return Ok(());
        };
        let Some(coverage) = self.coverage_for(number) else {
            return Ok(());
        };
        let Some(line_number) = require_line_number(self.name(), line_number, line, side) else {
            return Ok(());
        };
        line_number.add_class(coverage.css_class());
        line_number.set_attribute("title", coverage.description());
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
