//! Annotation layers
//!
//! A layer decorates the content (and optionally the line number) element of
//! each rendered line. Layers run in registration order but must not depend
//! on it: they only go through [`annotate_element`](crate::annotation::annotate_element),
//! so overlapping annotations nest.
//!
//! Stateful layers ask for re-rendering by sending [`DiffEvent`]s to their
//! listeners. The pipeline owns the receiving end of that channel.
//!
//! Sub-modules:
//! - `indicators`: trailing whitespace, tab and special character markers
//! - `intraline`: intraline edit spans
//! - `syntax`: syntect-based syntax classes
//! - `token_highlight`: hover-driven highlighting of equal tokens
//! - `ranged_comment`: comment range highlighting
//! - `coverage`: test coverage on line numbers

mod coverage;
mod indicators;
mod intraline;
mod ranged_comment;
mod syntax;
mod token_highlight;

use std::any::Any;
use std::sync::mpsc::{channel, Receiver, Sender};

use log::{debug, warn};

use crate::config::DiffPrefs;
use crate::diff::{DiffLine, Side};
use crate::element::Element;
use crate::error::Result;
use crate::message::DiffEvent;

pub use coverage::{CodeRange, CoverageLayer, CoverageRange, CoverageType};
pub use indicators::{SpecialCharLayer, TabLayer, TrailingWhitespaceLayer};
pub use intraline::IntralineLayer;
pub use ranged_comment::{CommentRange, CommentRangeLayer, RangedCommentLayer};
pub use syntax::{SyntaxCategory, SyntaxLayer};
pub use token_highlight::{token_at, TokenHighlightLayer, CSS_HIGHLIGHT, HOVER_DELAY};

pub type ListenerId = u64;

/// Handle a layer uses to request re-rendering.
#[derive(Debug, Clone)]
pub struct LayerListener {
    id: ListenerId,
    tx: Sender<DiffEvent>,
}

impl LayerListener {
    #[must_use]
    pub const fn new(id: ListenerId, tx: Sender<DiffEvent>) -> Self {
        Self { id, tx }
    }

    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    pub fn notify(&self, event: DiffEvent) {
        if self.tx.send(event).is_err() {
            debug!("listener {} is gone, dropping event", self.id);
        }
    }
}

/// Listeners registered with a stateful layer.
#[derive(Debug, Default)]
pub struct Listeners(Vec<LayerListener>);

impl Listeners {
    pub fn add(&mut self, listener: LayerListener) {
        self.0.push(listener);
    }

    pub fn remove(&mut self, id: ListenerId) {
        self.0.retain(|l| l.id != id);
    }

    pub fn notify(&self, event: &DiffEvent) {
        for listener in &self.0 {
            listener.notify(event.clone());
        }
    }

    pub fn notify_range(&self, start: u32, end: u32, side: Side) {
        self.notify(&DiffEvent::RenderRange { start, end, side });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A per-line decoration producer.
pub trait AnnotationLayer {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Decorate `content` (the line's text) and possibly `line_number` for
    /// `line` shown on `side`.
    ///
    /// # Errors
    ///
    /// Errors are logged by the pipeline; other layers still run.
    fn annotate(
        &mut self,
        content: &mut Element,
        line_number: Option<&mut Element>,
        line: &DiffLine,
        side: Side,
    ) -> anyhow::Result<()>;

    /// Static layers never ask for re-rendering and can ignore listeners.
    fn add_listener(&mut self, _listener: LayerListener) {}

    fn remove_listener(&mut self, _id: ListenerId) {}

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Ordered list of layers plus the channel they notify through.
pub struct LayerPipeline {
    layers: Vec<(ListenerId, Box<dyn AnnotationLayer>)>,
    tx: Sender<DiffEvent>,
    rx: Receiver<DiffEvent>,
    next_id: ListenerId,
}

impl Default for LayerPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerPipeline {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            layers: Vec::new(),
            tx,
            rx,
            next_id: 1,
        }
    }

    /// The built-in layers configured from `prefs`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::InvalidPreference`](crate::error::DiffError) for
    /// a non-positive `tab_size` or `line_length`.
    pub fn standard(prefs: &DiffPrefs) -> Result<Self> {
        prefs.validate()?;
        let mut pipeline = Self::new();
        pipeline.push(Box::new(IntralineLayer));
        pipeline.push(Box::new(TabLayer::new(prefs.show_tabs)));
        pipeline.push(Box::new(TrailingWhitespaceLayer::new(
            prefs.show_whitespace_errors,
        )));
        pipeline.push(Box::new(SpecialCharLayer));
        pipeline.push(Box::new(SyntaxLayer::new()));
        pipeline.push(Box::new(TokenHighlightLayer::new()));
        pipeline.push(Box::new(RangedCommentLayer::new()));
        pipeline.push(Box::new(CoverageLayer::new(Side::Left)));
        pipeline.push(Box::new(CoverageLayer::new(Side::Right)));
        Ok(pipeline)
    }

    /// Register a layer at the end of the list.
    pub fn push(&mut self, mut layer: Box<dyn AnnotationLayer>) {
        let id = self.next_id;
        self.next_id += 1;
        layer.add_listener(LayerListener::new(id, self.tx.clone()));
        self.layers.push((id, layer));
    }

    /// Unregister every layer of type `T`.
    pub fn remove<T: AnnotationLayer + 'static>(&mut self) {
        self.layers.retain_mut(|(id, layer)| {
            if layer.as_any_mut().is::<T>() {
                layer.remove_listener(*id);
                false
            } else {
                true
            }
        });
    }

    /// First layer of type `T`, for feeding it state.
    pub fn layer_mut<T: AnnotationLayer + 'static>(&mut self) -> Option<&mut T> {
        self.layers
            .iter_mut()
            .find_map(|(_, layer)| layer.as_any_mut().downcast_mut::<T>())
    }

    /// Layers of type `T`, e.g. the coverage layer of each side.
    pub fn layers_mut<T: AnnotationLayer + 'static>(&mut self) -> impl Iterator<Item = &mut T> {
        self.layers
            .iter_mut()
            .filter_map(|(_, layer)| layer.as_any_mut().downcast_mut::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run every layer on one line. A failing layer is logged and skipped.
    pub fn annotate_line(
        &mut self,
        content: &mut Element,
        mut line_number: Option<&mut Element>,
        line: &DiffLine,
        side: Side,
    ) {
        for (_, layer) in &mut self.layers {
            if let Err(err) = layer.annotate(content, line_number.as_deref_mut(), line, side) {
                warn!(
                    "{} layer failed on {} line {:?}: {err:#}",
                    layer.name(),
                    side.as_str(),
                    line.number(side)
                );
            }
        }
    }

    /// Events sent by layers since the last call.
    #[must_use]
    pub fn drain_events(&self) -> Vec<DiffEvent> {
        self.rx.try_iter().collect()
    }
}

/// Line number element or a logged skip, for layers that need one.
fn require_line_number<'a>(
    layer: &str,
    line_number: Option<&'a mut Element>,
    line: &DiffLine,
    side: Side,
) -> Option<&'a mut Element> {
    if line_number.is_none() {
        warn!(
            "{layer}: no line number element for {} line {:?}, skipping",
            side.as_str(),
            line.number(side)
        );
    }
    line_number
}
