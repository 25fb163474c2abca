//! Syntax highlighting layer using syntect
//!
//! Both sides of a file are parsed line by line with a stateful parser, so
//! multi-line constructs like block comments and strings keep their scope.
//! Scopes are reduced to a small set of categories, emitted as
//! `gr-syntax gr-syntax-<category>` classes.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;

use log::debug;
use syntect::parsing::{ParseState, ScopeStack, ScopeStackOp, SyntaxReference, SyntaxSet};

use super::{AnnotationLayer, LayerListener, ListenerId, Listeners};
use crate::annotation::annotate_element;
use crate::diff::{DiffInfo, DiffLine, Side};
use crate::element::Element;
use crate::text::{char_offset, string_length};

/// Highlight category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxCategory {
    /// Keywords (if, else, fn, let, etc.)
    Keyword,
    /// Function/method names
    Function,
    /// Type names (String, Vec, etc.)
    Type,
    String,
    Number,
    Comment,
    /// Operators (+, -, =, etc.)
    Operator,
    /// Punctuation (brackets, semicolons, etc.)
    Punctuation,
    Variable,
    /// Constants and statics
    Constant,
    /// Attributes/decorators (@, #[])
    Attribute,
}

impl SyntaxCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Function => "function",
            Self::Type => "type",
            Self::String => "string",
            Self::Number => "number",
            Self::Comment => "comment",
            Self::Operator => "operator",
            Self::Punctuation => "punctuation",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Attribute => "attribute",
        }
    }

    /// Category of a single scope name like `constant.numeric.integer.rust`.
    fn from_scope(scope: &str) -> Option<Self> {
        const TABLE: &[(&str, SyntaxCategory)] = &[
            ("comment", SyntaxCategory::Comment),
            ("string", SyntaxCategory::String),
            ("constant.numeric", SyntaxCategory::Number),
            ("constant", SyntaxCategory::Constant),
            ("keyword.operator", SyntaxCategory::Operator),
            ("keyword", SyntaxCategory::Keyword),
            ("storage", SyntaxCategory::Keyword),
            ("entity.name.function", SyntaxCategory::Function),
            ("support.function", SyntaxCategory::Function),
            ("variable.function", SyntaxCategory::Function),
            ("entity.name", SyntaxCategory::Type),
            ("support.type", SyntaxCategory::Type),
            ("support.class", SyntaxCategory::Type),
            ("entity.other.attribute-name", SyntaxCategory::Attribute),
            ("meta.annotation", SyntaxCategory::Attribute),
            ("meta.attribute", SyntaxCategory::Attribute),
            ("punctuation", SyntaxCategory::Punctuation),
            ("variable", SyntaxCategory::Variable),
        ];
        TABLE
            .iter()
            .find(|(prefix, _)| scope.starts_with(prefix))
            .map(|(_, category)| *category)
    }

    /// Category for the innermost meaningful scope. Comments and strings win
    /// over anything nested inside them.
    fn from_stack(stack: &ScopeStack) -> Option<Self> {
        let names: Vec<String> = stack
            .as_slice()
            .iter()
            .map(|scope| scope.build_string())
            .collect();
        for outer in [Self::Comment, Self::String] {
            if names
                .iter()
                .any(|name| Self::from_scope(name) == Some(outer))
            {
                return Some(outer);
            }
        }
        names.iter().rev().find_map(|name| Self::from_scope(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SyntaxSpan {
    start: usize,
    length: usize,
    category: SyntaxCategory,
}

/// Applies syntax classes computed by [`SyntaxLayer::process`].
pub struct SyntaxLayer {
    syntax_set: SyntaxSet,
    left: HashMap<u32, Vec<SyntaxSpan>>,
    right: HashMap<u32, Vec<SyntaxSpan>>,
    listeners: Listeners,
}

impl Default for SyntaxLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxLayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            left: HashMap::new(),
            right: HashMap::new(),
            listeners: Listeners::default(),
        }
    }

    /// Get syntax reference for a file path (by extension)
    fn syntax_for_path(&self, path: &str) -> Option<&SyntaxReference> {
        let path = Path::new(path);

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Some(syntax) = self.syntax_set.find_syntax_by_extension(ext) {
                return Some(syntax);
            }
        }

        // Try by filename (for things like Makefile, Dockerfile)
        match path.file_name().and_then(|n| n.to_str())? {
            "Makefile" | "makefile" | "GNUmakefile" => {
                self.syntax_set.find_syntax_by_extension("make")
            }
            "Dockerfile" => self.syntax_set.find_syntax_by_extension("dockerfile"),
            "Cargo.lock" => self.syntax_set.find_syntax_by_extension("toml"),
            _ => None,
        }
    }

    /// Highlight every line of `info` as the file `path`, then ask for both
    /// sides to be rendered again. Returns `false` for unknown file types.
    ///
    /// Skipped regions reset the parser since their content is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if syntect fails on a line.
    pub fn process(&mut self, path: &str, info: &DiffInfo) -> anyhow::Result<bool> {
        self.left.clear();
        self.right.clear();

        let Some(syntax) = self.syntax_for_path(path) else {
            debug!("no syntax for {path}, skipping highlighting");
            return Ok(false);
        };

        let (left_runs, right_runs) = side_runs(info);
        let left = highlight_runs(&self.syntax_set, syntax, &left_runs)?;
        let right = highlight_runs(&self.syntax_set, syntax, &right_runs)?;

        for (side, runs) in [(Side::Left, &left_runs), (Side::Right, &right_runs)] {
            if let Some(last) = runs.iter().rev().find_map(|run| run.last()) {
                self.listeners.notify_range(1, last.0, side);
            }
        }
        self.left = left;
        self.right = right;
        Ok(true)
    }

    fn spans(&self, side: Side) -> &HashMap<u32, Vec<SyntaxSpan>> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl AnnotationLayer for SyntaxLayer {
    fn name(&self) -> &'static str {
        "syntax"
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
        let Some(spans) = self.spans(side).get(&number) else {
            return Ok(());
        };
        for span in spans {
            let class = format!("gr-syntax gr-syntax-{}", span.category.as_str());
            annotate_element(content, span.start, span.length, &class);
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

type Run<'a> = Vec<(u32, &'a str)>;

/// Contiguous numbered lines of each side, broken at skipped regions.
fn side_runs(info: &DiffInfo) -> (Vec<Run<'_>>, Vec<Run<'_>>) {
    let mut left = vec![Vec::new()];
    let mut right = vec![Vec::new()];
    let mut left_line = 1u32;
    let mut right_line = 1u32;

    for content in &info.content {
        if let Some(skip) = content.skip {
            left_line += skip;
            right_line += skip;
            left.push(Vec::new());
            right.push(Vec::new());
        } else if let Some(ab) = &content.ab {
            for text in ab {
                push_line(&mut left, &mut left_line, text.as_str());
                push_line(&mut right, &mut right_line, text.as_str());
            }
        } else {
            for text in content.a.iter().flatten() {
                push_line(&mut left, &mut left_line, text.as_str());
            }
            for text in content.b.iter().flatten() {
                push_line(&mut right, &mut right_line, text.as_str());
            }
        }
    }
    (left, right)
}

fn push_line<'a>(runs: &mut [Run<'a>], counter: &mut u32, text: &'a str) {
    if let Some(run) = runs.last_mut() {
        run.push((*counter, text));
    }
    *counter += 1;
}

fn highlight_runs(
    syntax_set: &SyntaxSet,
    syntax: &SyntaxReference,
    runs: &[Run<'_>],
) -> anyhow::Result<HashMap<u32, Vec<SyntaxSpan>>> {
    let mut out = HashMap::new();
    for run in runs {
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        for &(number, text) in run {
            let ops = state.parse_line(&format!("{text}\n"), syntax_set)?;
            let spans = line_spans(text, &ops, &mut stack)?;
            if !spans.is_empty() {
                out.insert(number, spans);
            }
        }
    }
    Ok(out)
}

fn line_spans(
    text: &str,
    ops: &[(usize, ScopeStackOp)],
    stack: &mut ScopeStack,
) -> anyhow::Result<Vec<SyntaxSpan>> {
    let mut spans = Vec::new();
    let mut last = 0;
    for (pos, op) in ops {
        let pos = (*pos).min(text.len());
        push_span(&mut spans, text, last, pos, SyntaxCategory::from_stack(stack));
        stack.apply(op)?;
        last = pos;
    }
    push_span(&mut spans, text, last, text.len(), SyntaxCategory::from_stack(stack));
    Ok(spans)
}

/// Add the byte range `from..to` of `text`, merging with an adjacent span of
/// the same category.
fn push_span(
    spans: &mut Vec<SyntaxSpan>,
    text: &str,
    from: usize,
    to: usize,
    category: Option<SyntaxCategory>,
) {
    let Some(category) = category else {
        return;
    };
    if from >= to {
        return;
    }
    let start = char_offset(text, from);
    let length = string_length(&text[from..to]);
    if let Some(prev) = spans.last_mut() {
        if prev.category == category && prev.start + prev.length == start {
            prev.length += length;
            return;
        }
    }
    spans.push(SyntaxSpan {
        start,
        length,
        category,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffContent, DiffLineType, LineNumber};
    use std::sync::mpsc::channel;

    fn lines(text: &[&str]) -> Option<Vec<String>> {
        Some(text.iter().map(|s| (*s).to_string()).collect())
    }

    fn annotate(layer: &mut SyntaxLayer, text: &str, number: u32, side: Side) -> Element {
        let line = DiffLine {
            before_number: Some(LineNumber::Line(number)),
            after_number: Some(LineNumber::Line(number)),
            text: text.to_string(),
            ..DiffLine::new(DiffLineType::Both)
        };
        let mut content = Element::new("div").with_text(text);
        layer.annotate(&mut content, None, &line, side).unwrap();
        content
    }

    fn texts_with(content: &Element, class: &str) -> Vec<String> {
        content
            .find_all_by_class(class)
            .iter()
            .map(|el| el.text_content())
            .collect()
    }

    #[test]
    fn classifies_rust_tokens() {
        let info = DiffInfo {
            content: vec![DiffContent {
                ab: lines(&["let x = 42; // answer"]),
                ..DiffContent::default()
            }],
            binary: false,
        };
        let mut layer = SyntaxLayer::new();
        assert!(layer.process("main.rs", &info).unwrap());

        let content = annotate(&mut layer, "let x = 42; // answer", 1, Side::Left);
        assert_eq!(content.text_content(), "let x = 42; // answer");
        assert_eq!(texts_with(&content, "gr-syntax-number"), ["42"]);
        assert_eq!(texts_with(&content, "gr-syntax-comment"), ["// answer"]);
    }

    #[test]
    fn keeps_state_across_lines() {
        let info = DiffInfo {
            content: vec![DiffContent {
                a: lines(&["/* start", "still comment */ fn f() {}"]),
                b: lines(&["fn g() {}"]),
                ..DiffContent::default()
            }],
            binary: false,
        };
        let mut layer = SyntaxLayer::new();
        layer.process("lib.rs", &info).unwrap();

        let content = annotate(&mut layer, "still comment */ fn f() {}", 2, Side::Left);
        assert_eq!(texts_with(&content, "gr-syntax-comment"), ["still comment */"]);

        let content = annotate(&mut layer, "fn g() {}", 1, Side::Right);
        assert!(texts_with(&content, "gr-syntax-comment").is_empty());
    }

    #[test]
    fn skip_offsets_line_numbers() {
        let info = DiffInfo {
            content: vec![
                DiffContent {
                    skip: Some(10),
                    ..DiffContent::default()
                },
                DiffContent {
                    ab: lines(&["// tail"]),
                    ..DiffContent::default()
                },
            ],
            binary: false,
        };
        let mut layer = SyntaxLayer::new();
        layer.process("lib.rs", &info).unwrap();

        let content = annotate(&mut layer, "// tail", 11, Side::Right);
        assert_eq!(texts_with(&content, "gr-syntax-comment"), ["// tail"]);
    }

    #[test]
    fn unknown_file_type_yields_nothing() {
        let info = DiffInfo {
            content: vec![DiffContent {
                ab: lines(&["let x = 1;"]),
                ..DiffContent::default()
            }],
            binary: false,
        };
        let mut layer = SyntaxLayer::new();
        assert!(!layer.process("notes.unknownext", &info).unwrap());

        let content = annotate(&mut layer, "let x = 1;", 1, Side::Left);
        assert!(content.find_all_by_class("gr-syntax").is_empty());
    }

    #[test]
    fn processing_requests_rerender_of_both_sides() {
        let (tx, rx) = channel();
        let mut layer = SyntaxLayer::new();
        layer.add_listener(LayerListener::new(1, tx));

        let info = DiffInfo {
            content: vec![DiffContent {
                a: lines(&["a", "b"]),
                b: lines(&["c"]),
                ..DiffContent::default()
            }],
            binary: false,
        };
        layer.process("x.py", &info).unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                crate::message::DiffEvent::RenderRange {
                    start: 1,
                    end: 2,
                    side: Side::Left
                },
                crate::message::DiffEvent::RenderRange {
                    start: 1,
                    end: 1,
                    side: Side::Right
                },
            ]
        );
    }
}
