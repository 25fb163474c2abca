//! Token hover highlighting
//!
//! Every word-like token is wrapped with classes naming its text, so the
//! host can tell which token the pointer is over. Hovering a token for
//! [`HOVER_DELAY`] highlights all other occurrences of it on both sides.
//!
//! Hover input is debounced: events only schedule an update, and
//! [`TokenHighlightLayer::tick`] applies the latest one once it is due.

use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;

use super::{require_line_number, AnnotationLayer, LayerListener, ListenerId, Listeners};
use crate::annotation::annotate_element;
use crate::diff::{DiffLine, Side};
use crate::element::Element;
use crate::text::{char_offset, string_length};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

pub const CSS_TOKEN: &str = "token";
pub const CSS_HIGHLIGHT: &str = "token-highlight";
const TEXT_CLASS_PREFIX: &str = "tk-text-";

/// How long the pointer has to rest before the highlight changes.
pub const HOVER_DELAY: Duration = Duration::from_millis(200);

const LINE_LENGTH_LIMIT: usize = 500;
const TOKEN_LENGTH_LIMIT: usize = 100;
const TOKEN_COUNT_LIMIT: usize = 10_000;
const TOKEN_OCCURRENCES_LIMIT: usize = 1_000;
/// Occurrences further than this from the hovered line are not re-rendered.
const NOTIFY_LINE_DISTANCE: u32 = 1_000;

/// Token under the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
struct HoverTarget {
    token: String,
    side: Side,
    line: u32,
}

#[derive(Debug, Default)]
struct Occurrences {
    left: BTreeSet<u32>,
    right: BTreeSet<u32>,
    count: usize,
}

impl Occurrences {
    const fn lines(&self, side: Side) -> &BTreeSet<u32> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

#[derive(Debug)]
struct PendingUpdate {
    due: Instant,
    target: Option<HoverTarget>,
}

#[derive(Debug, Default)]
pub struct TokenHighlightLayer {
    index: HashMap<String, Occurrences>,
    indexed_lines: HashSet<(Side, u32)>,
    hoverable: HashSet<(Side, u32)>,
    current: Option<HoverTarget>,
    pending: Option<PendingUpdate>,
    mouse_down: bool,
    selection_active: bool,
    listeners: Listeners,
}

/// Token text of a wrapper created by this layer, e.g. from a hovered element.
#[must_use]
pub fn token_at(el: &Element) -> Option<&str> {
    el.classes()
        .iter()
        .find_map(|class| class.strip_prefix(TEXT_CLASS_PREFIX))
}

impl TokenHighlightLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently highlighted token.
    #[must_use]
    pub fn current_token(&self) -> Option<&str> {
        self.current.as_ref().map(|t| t.token.as_str())
    }

    /// Whether the line has at least one token and reacts to hovering.
    #[must_use]
    pub fn is_hoverable(&self, side: Side, line: u32) -> bool {
        self.hoverable.contains(&(side, line))
    }

    /// Number of indexed occurrences of `token` on both sides.
    #[must_use]
    pub fn occurrences(&self, token: &str) -> usize {
        self.index.get(token).map_or(0, |o| o.count)
    }

    pub fn mouse_over(&mut self, side: Side, line: u32, token: &str, now: Instant) {
        if self.interaction_blocked() {
            return;
        }
        self.schedule(
            Some(HoverTarget {
                token: token.to_string(),
                side,
                line,
            }),
            now,
        );
    }

    pub fn mouse_out(&mut self, now: Instant) {
        if self.interaction_blocked() {
            return;
        }
        self.schedule(None, now);
    }

    pub fn mouse_down(&mut self) {
        self.mouse_down = true;
        self.pending = None;
    }

    pub const fn mouse_up(&mut self) {
        self.mouse_down = false;
    }

    pub fn set_selection_active(&mut self, active: bool) {
        self.selection_active = active;
        if active {
            self.pending = None;
        }
    }

    /// Apply the scheduled update if its delay has passed.
    pub fn tick(&mut self, now: Instant) {
        let due = self.pending.as_ref().is_some_and(|p| p.due <= now);
        if !due {
            return;
        }
        if let Some(pending) = self.pending.take() {
            self.update_highlight(pending.target);
        }
    }

    const fn interaction_blocked(&self) -> bool {
        self.mouse_down || self.selection_active
    }

    fn schedule(&mut self, target: Option<HoverTarget>, now: Instant) {
        self.pending = Some(PendingUpdate {
            due: now + HOVER_DELAY,
            target,
        });
    }

    fn update_highlight(&mut self, target: Option<HoverTarget>) {
        let target = target.filter(|t| self.occurrences(&t.token) > 1);
        let same_token = matches!(
            (&self.current, &target),
            (Some(old), Some(new)) if old.token == new.token
        );
        if same_token {
            self.current = target;
            return;
        }
        if self.current.is_none() && target.is_none() {
            return;
        }

        let old = std::mem::replace(&mut self.current, target);
        if let Some(old) = &old {
            self.notify_token(old);
        }
        if let Some(new) = self.current.clone() {
            self.notify_token(&new);
        }
    }

    /// Ask for re-rendering of the lines near `target` that contain its token.
    fn notify_token(&self, target: &HoverTarget) {
        let Some(occurrences) = self.index.get(&target.token) else {
            return;
        };
        let from = target.line.saturating_sub(NOTIFY_LINE_DISTANCE);
        let to = target.line.saturating_add(NOTIFY_LINE_DISTANCE);
        for side in [Side::Left, Side::Right] {
            let mut run: Option<(u32, u32)> = None;
            for &line in occurrences.lines(side).range(from..=to) {
                run = match run {
                    Some((start, end)) if end + 1 == line => Some((start, line)),
                    Some((start, end)) => {
                        self.listeners.notify_range(start, end, side);
                        Some((line, line))
                    }
                    None => Some((line, line)),
                };
            }
            if let Some((start, end)) = run {
                self.listeners.notify_range(start, end, side);
            }
        }
    }

    fn store_occurrence(&mut self, token: &str, side: Side, line: u32) {
        if !self.index.contains_key(token) && self.index.len() >= TOKEN_COUNT_LIMIT {
            return;
        }
        let occurrences = self.index.entry(token.to_string()).or_default();
        if occurrences.count >= TOKEN_OCCURRENCES_LIMIT {
            return;
        }
        occurrences.count += 1;
        match side {
            Side::Left => occurrences.left.insert(line),
            Side::Right => occurrences.right.insert(line),
        };
    }
}

impl AnnotationLayer for TokenHighlightLayer {
    fn name(&self) -> &'static str {
        "token-highlight"
    }

    fn annotate(
        &mut self,
        content: &mut Element,
        line_number: Option<&mut Element>,
        line: &DiffLine,
        side: Side,
    ) -> anyhow::Result<()> {
        let Some(number) = line.line_on(side) else {
            return Ok(());
        };
        if require_line_number(self.name(), line_number, line, side).is_none() {
            return Ok(());
        }
        let text = &line.text;
        if string_length(text) > LINE_LENGTH_LIMIT {
            return Ok(());
        }

        let first_time = self.indexed_lines.insert((side, number));
        let mut matched = false;
        for found in TOKEN.find_iter(text) {
            let token = found.as_str();
            let length = string_length(token);
            if length > TOKEN_LENGTH_LIMIT {
                continue;
            }
            matched = true;
            let start = char_offset(text, found.start());
            let mut class = format!("{CSS_TOKEN} {TEXT_CLASS_PREFIX}{token} tk-index-{start}");
            if self.current_token() == Some(token) {
                class.push(' ');
                class.push_str(CSS_HIGHLIGHT);
            }
            if first_time {
                self.store_occurrence(token, side, number);
            }
            annotate_element(content, start, length, &class);
        }

        if matched {
            self.hoverable.insert((side, number));
            content.add_class("hoverable");
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
