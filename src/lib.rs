//! reviewdiff - diff-to-render pipeline for code review
//!
//! Turns server diff chunks into groups of lines, collapses unchanged
//! context behind expandable controls and decorates every rendered line
//! through a pipeline of annotation layers.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]

pub mod annotation;
pub mod config;
pub mod diff;
pub mod element;
pub mod error;
pub mod layer;
pub mod message;
pub mod processor;
pub mod render;
pub mod text;

pub use config::{Context, DiffPrefs};
pub use diff::{DiffGroup, DiffInfo, DiffLine, Side};
pub use element::Element;
pub use error::{DiffError, Result};
pub use layer::{AnnotationLayer, LayerPipeline};
pub use message::DiffEvent;
pub use processor::{ChunkProcessor, GroupConsumer, ProcessOutcome, ThreadScheduler};
pub use render::{DiffRenderer, TextFormat, ViewMode};
