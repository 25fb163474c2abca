//! Intraline edit highlighting
//!
//! Marks the changed parts of a modified line, as reported by the server.

use std::any::Any;

use super::AnnotationLayer;
use crate::annotation::annotate_element;
use crate::diff::{DiffLine, Side};
use crate::element::Element;
use crate::text::string_length;

/// Marks the changed spans inside a modified line.
#[derive(Debug, Clone, Copy)]
pub struct IntralineLayer;

impl AnnotationLayer for IntralineLayer {
    fn name(&self) -> &'static str {
        "intraline"
    }

    fn annotate(
        &mut self,
        content: &mut Element,
        _line_number: Option<&mut Element>,
        line: &DiffLine,
        _side: Side,
    ) -> anyhow::Result<()> {
        let len = string_length(&line.text);
        for highlight in &line.highlights {
            let end = highlight.end_index.unwrap_or(len);
            if highlight.start_index < end {
                annotate_element(
                    content,
                    highlight.start_index,
                    end - highlight.start_index,
                    "intraline",
                );
            }
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
