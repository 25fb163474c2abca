//! Whitespace and invisible character markers

use std::any::Any;
use std::sync::LazyLock;

use regex::Regex;

use super::AnnotationLayer;
use crate::annotation::annotate_element;
use crate::diff::{DiffLine, Side};
use crate::element::Element;
use crate::text::{char_offset, string_length};

static TRAILING_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+$").expect("valid regex"));

const SOFT_HYPHEN: char = '\u{00AD}';

/// Marks whitespace at the end of a line.
#[derive(Debug, Clone, Copy)]
pub struct TrailingWhitespaceLayer {
    enabled: bool,
}

impl TrailingWhitespaceLayer {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl AnnotationLayer for TrailingWhitespaceLayer {
    fn name(&self) -> &'static str {
        "trailing-whitespace"
    }

    fn annotate(
        &mut self,
        content: &mut Element,
        _line_number: Option<&mut Element>,
        line: &DiffLine,
        _side: Side,
    ) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if let Some(found) = TRAILING_WHITESPACE.find(&line.text) {
            let start = char_offset(&line.text, found.start());
            annotate_element(
                content,
                start,
                string_length(found.as_str()),
                "trailing-whitespace",
            );
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Marks every tab character.
#[derive(Debug, Clone, Copy)]
pub struct TabLayer {
    enabled: bool,
}

impl TabLayer {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl AnnotationLayer for TabLayer {
    fn name(&self) -> &'static str {
        "tab"
    }

    fn annotate(
        &mut self,
        content: &mut Element,
        _line_number: Option<&mut Element>,
        line: &DiffLine,
        _side: Side,
    ) -> anyhow::Result<()> {
        if self.enabled {
            mark_char(content, &line.text, '\t', "tab");
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Makes soft hyphens visible.
#[derive(Debug, Clone, Copy)]
pub struct SpecialCharLayer;

impl AnnotationLayer for SpecialCharLayer {
    fn name(&self) -> &'static str {
        "special-char"
    }

    fn annotate(
        &mut self,
        content: &mut Element,
        _line_number: Option<&mut Element>,
        line: &DiffLine,
        _side: Side,
    ) -> anyhow::Result<()> {
        mark_char(content, &line.text, SOFT_HYPHEN, "special-char-indicator");
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn mark_char(content: &mut Element, text: &str, needle: char, class: &str) {
    for (pos, _) in text.chars().enumerate().filter(|(_, c)| *c == needle) {
        annotate_element(content, pos, 1, class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffLineType, LineNumber};

    fn run(layer: &mut dyn AnnotationLayer, text: &str) -> Element {
        let line = DiffLine {
            after_number: Some(LineNumber::Line(1)),
            text: text.to_string(),
            ..DiffLine::new(DiffLineType::Add)
        };
        let mut content = Element::new("div").with_text(text);
        layer
            .annotate(&mut content, None, &line, Side::Right)
            .unwrap();
        content
    }

    #[test]
    fn marks_trailing_whitespace() {
        let content = run(&mut TrailingWhitespaceLayer::new(true), "🙈 let x; \t ");
        assert_eq!(
            content.to_markup(),
            "<div>🙈 let x;<hl class=\"trailing-whitespace\"> \t </hl></div>"
        );
    }

    #[test]
    fn trailing_whitespace_respects_pref() {
        let content = run(&mut TrailingWhitespaceLayer::new(false), "x  ");
        assert!(content.find_all_by_class("trailing-whitespace").is_empty());

        let content = run(&mut TrailingWhitespaceLayer::new(true), "x");
        assert!(content.find_all_by_class("trailing-whitespace").is_empty());
    }

    #[test]
    fn marks_each_tab() {
        let content = run(&mut TabLayer::new(true), "\ta\tb");
        assert_eq!(
            content.to_markup(),
            "<div><hl class=\"tab\">\t</hl>a<hl class=\"tab\">\t</hl>b</div>"
        );

        let content = run(&mut TabLayer::new(false), "\ta");
        assert!(content.find_all_by_class("tab").is_empty());
    }

    #[test]
    fn marks_soft_hyphen() {
        let content = run(&mut SpecialCharLayer, "co\u{00AD}op");
        let marked = content.find_all_by_class("special-char-indicator");
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].text_content(), "\u{00AD}");
    }
}
