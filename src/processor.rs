//! Chunk processing
//!
//! Turns the chunks of a [`DiffInfo`] into ordered [`DiffGroup`]s:
//! - oversized pure additions and removals are cut into bounded groups
//! - common chunks are split around key locations so those stay visible
//! - runs of common lines are collapsed behind context controls
//!
//! Work is done in bounded steps by a [`ProcessTask`], so a host can keep
//! its UI responsive while a large file is processed. Starting a new run
//! cancels the previous one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::debug;

use crate::config::{Context, DiffPrefs};
use crate::diff::{
    convert_intraline_infos, hide_in_context_control, Chunk, ChunkBody, DiffGroup, DiffInfo,
    DiffLine, DiffLineType, GroupOptions, GroupType, Highlight, LineNumber, Side,
};
use crate::error::Result;

/// Lines added to the consumer before a step yields.
pub const ASYNC_THRESHOLD: usize = 64;

/// Largest group cut from an oversized addition or removal.
pub const MAX_GROUP_SIZE: usize = 120;

/// Delay after a batch of lines.
pub const BATCH_DELAY: Duration = Duration::from_millis(1);

/// Delay while the host is scrolling.
pub const SCROLL_DELAY: Duration = Duration::from_millis(100);

/// How long after the last scroll event the host counts as scrolling.
pub const SCROLL_SETTLE: Duration = Duration::from_millis(50);

/// Receiver of processed groups, in order.
pub trait GroupConsumer {
    fn add_group(&mut self, group: DiffGroup);
    fn clear_groups(&mut self);
}

impl GroupConsumer for Vec<DiffGroup> {
    fn add_group(&mut self, group: DiffGroup) {
        self.push(group);
    }

    fn clear_groups(&mut self) {
        self.clear();
    }
}

/// Lines that must never be hidden, e.g. commented lines or the cursor target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyLocations {
    pub left: HashSet<u32>,
    pub right: HashSet<u32>,
}

impl KeyLocations {
    pub fn insert(&mut self, side: Side, line: u32) {
        match side {
            Side::Left => self.left.insert(line),
            Side::Right => self.right.insert(line),
        };
    }

    #[must_use]
    pub fn contains(&self, side: Side, line: u32) -> bool {
        match side {
            Side::Left => self.left.contains(&line),
            Side::Right => self.right.contains(&line),
        }
    }
}

/// Shared cancellation flag of a processing run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tracks host scrolling so processing can back off while it lasts.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker(Arc<Mutex<Option<Instant>>>);

impl ScrollTracker {
    pub fn notify_scroll(&self) {
        self.notify_scroll_at(Instant::now());
    }

    pub fn notify_scroll_at(&self, now: Instant) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(now);
    }

    #[must_use]
    pub fn is_scrolling_at(&self, now: Instant) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|last| now.saturating_duration_since(last) < SCROLL_SETTLE)
    }
}

/// Timer used to wait between steps.
pub trait Scheduler {
    fn wait(&mut self, delay: Duration);
}

/// Waits by sleeping the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn wait(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Result of one [`ProcessTask::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More work remains; step again after the delay.
    Yield(Duration),
    Finished,
    /// The run was superseded. Groups it emitted must be discarded.
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed,
    Canceled,
}

pub struct ChunkProcessor {
    context: Context,
    key_locations: KeyLocations,
    async_threshold: usize,
    max_group_size: usize,
    scroll: ScrollTracker,
    current: Option<CancelToken>,
}

impl ChunkProcessor {
    #[must_use]
    pub fn new(context: Context) -> Self {
        Self {
            context,
            key_locations: KeyLocations::default(),
            async_threshold: ASYNC_THRESHOLD,
            max_group_size: MAX_GROUP_SIZE,
            scroll: ScrollTracker::default(),
            current: None,
        }
    }

    /// Processor configured from validated preferences.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::InvalidPreference`](crate::error::DiffError) for
    /// a non-positive `tab_size` or `line_length`.
    pub fn from_prefs(prefs: &DiffPrefs) -> Result<Self> {
        prefs.validate()?;
        let mut processor = Self::new(prefs.context);
        if let Some(lines) = prefs.num_lines_rendered_at_once {
            processor.set_lines_rendered_at_once(lines);
        }
        Ok(processor)
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    pub fn set_key_locations(&mut self, key_locations: KeyLocations) {
        self.key_locations = key_locations;
    }

    /// Yield after `lines` lines and cut oversized chunks at twice that.
    pub fn set_lines_rendered_at_once(&mut self, lines: u32) {
        if lines == 0 {
            return;
        }
        self.async_threshold = lines as usize;
        self.max_group_size = self.async_threshold * 2;
    }

    /// Handle the host notifies of scroll events.
    #[must_use]
    pub fn scroll_tracker(&self) -> ScrollTracker {
        self.scroll.clone()
    }

    /// Cancel the run in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// Start processing `info`.
    ///
    /// The consumer is cleared and receives the `LOST` and `FILE` pseudo-line
    /// groups right away; everything else is produced by stepping the
    /// returned task. Any previous run is canceled.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::MismatchedCommonChunk`](crate::error::DiffError)
    /// when a whitespace-only chunk has unequal sides.
    pub fn process(
        &mut self,
        info: &DiffInfo,
        consumer: &mut dyn GroupConsumer,
    ) -> Result<ProcessTask> {
        self.cancel();

        let chunks = info
            .content
            .iter()
            .enumerate()
            .map(|(index, content)| Chunk::from_content(index, content))
            .collect::<Result<Vec<_>>>()?;

        consumer.clear_groups();
        for number in [LineNumber::Lost, LineNumber::File] {
            let mut group = DiffGroup::new(GroupType::Both, GroupOptions::default());
            group.add_line(DiffLine::pseudo(number))?;
            consumer.add_group(group);
        }

        let chunks = if info.binary {
            Vec::new()
        } else {
            let chunks = split_large_chunks(chunks, self.context, self.max_group_size);
            split_at_key_locations(chunks, &self.key_locations)
        };

        let token = CancelToken::default();
        self.current = Some(token.clone());
        Ok(ProcessTask {
            chunks,
            index: 0,
            left: 0,
            right: 0,
            context: self.context,
            async_threshold: self.async_threshold,
            batch: 0,
            cancel: token,
            scroll: self.scroll.clone(),
        })
    }
}

/// An in-flight processing run.
pub struct ProcessTask {
    chunks: Vec<Chunk>,
    index: usize,
    left: u32,
    right: u32,
    context: Context,
    async_threshold: usize,
    batch: usize,
    cancel: CancelToken,
    scroll: ScrollTracker,
}

impl ProcessTask {
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn step(&mut self, consumer: &mut dyn GroupConsumer) -> Step {
        self.step_at(consumer, Instant::now())
    }

    /// Emit groups until a batch is full or the chunks run out.
    pub fn step_at(&mut self, consumer: &mut dyn GroupConsumer, now: Instant) -> Step {
        if self.cancel.is_canceled() {
            return Step::Canceled;
        }
        if self.scroll.is_scrolling_at(now) {
            return Step::Yield(SCROLL_DELAY);
        }

        while self.index < self.chunks.len() {
            for group in self.process_next() {
                self.batch += group.lines().len();
                consumer.add_group(group);
            }
            if self.batch >= self.async_threshold {
                self.batch = 0;
                return Step::Yield(BATCH_DELAY);
            }
        }
        Step::Finished
    }

    /// Step until done, waiting on `scheduler` between steps.
    pub fn run(
        mut self,
        consumer: &mut dyn GroupConsumer,
        scheduler: &mut dyn Scheduler,
    ) -> ProcessOutcome {
        loop {
            match self.step(consumer) {
                Step::Yield(delay) => scheduler.wait(delay),
                Step::Finished => return ProcessOutcome::Completed,
                Step::Canceled => {
                    debug!("diff processing canceled at chunk {}", self.index);
                    return ProcessOutcome::Canceled;
                }
            }
        }
    }

    /// Groups for the next uncollapsible chunk or run of collapsible chunks.
    fn process_next(&mut self) -> Vec<DiffGroup> {
        let run_end = self.chunks[self.index..]
            .iter()
            .position(|c| !c.is_collapsible())
            .map_or(self.chunks.len(), |p| self.index + p);

        if run_end == self.index {
            let chunk = &self.chunks[self.index];
            let group = chunk_to_group(
                chunk,
                self.left.saturating_add(1),
                self.right.saturating_add(1),
            );
            self.left = self.left.saturating_add(len_u32(chunk.left_len()));
            self.right = self.right.saturating_add(len_u32(chunk.right_len()));
            self.index += 1;
            return vec![group];
        }

        let run = &self.chunks[self.index..run_end];
        let line_count = run
            .iter()
            .fold(0u32, |sum, c| sum.saturating_add(len_u32(c.left_len())));

        let mut groups = Vec::with_capacity(run.len());
        let (mut left, mut right) = (self.left.saturating_add(1), self.right.saturating_add(1));
        for chunk in run {
            groups.push(chunk_to_group(chunk, left, right));
            left = left.saturating_add(len_u32(chunk.left_len()));
            right = right.saturating_add(len_u32(chunk.left_len()));
        }

        let has_skip = groups.iter().any(|g| g.skip.is_some());
        if self.context != Context::WholeFile || has_skip {
            let context = match self.context {
                Context::Lines(n) => i64::from(n),
                Context::WholeFile => 0,
            };
            let hidden_start = if self.index == 0 { 0 } else { context };
            let hidden_end =
                i64::from(line_count) - if run_end == self.chunks.len() { 0 } else { context };
            groups = hide_in_context_control(groups, hidden_start, hidden_end);
        }

        self.left = self.left.saturating_add(line_count);
        self.right = self.right.saturating_add(line_count);
        self.index = run_end;
        groups
    }
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn chunk_to_group(chunk: &Chunk, offset_left: u32, offset_right: u32) -> DiffGroup {
    let options = GroupOptions {
        due_to_rebase: chunk.due_to_rebase,
        move_details: chunk.move_details,
        ignored_whitespace_only: matches!(chunk.body, ChunkBody::Delta { common: true, .. }),
        key_location: chunk.key_location,
    };
    match &chunk.body {
        ChunkBody::Skip(count) => DiffGroup::skipped(*count, offset_left, offset_right, options),
        ChunkBody::Common(rows) => DiffGroup::common(rows, offset_left, offset_right, options),
        ChunkBody::Delta {
            a, b, edit_a, edit_b, ..
        } => {
            let mut lines = lines_from_rows(DiffLineType::Remove, a, offset_left, edit_a.as_deref());
            lines.extend(lines_from_rows(DiffLineType::Add, b, offset_right, edit_b.as_deref()));
            DiffGroup::delta(lines, options)
        }
    }
}

fn lines_from_rows(
    line_type: DiffLineType,
    rows: &[String],
    offset: u32,
    intraline: Option<&[(usize, usize)]>,
) -> Vec<DiffLine> {
    let highlights: Option<Vec<Highlight>> =
        intraline.map(|infos| convert_intraline_infos(rows, infos));

    rows.iter()
        .enumerate()
        .zip(offset..)
        .map(|((i, row), number)| {
            let mut line = DiffLine::new(line_type);
            line.text.clone_from(row);
            if line_type == DiffLineType::Remove {
                line.before_number = Some(LineNumber::Line(number));
            } else {
                line.after_number = Some(LineNumber::Line(number));
            }
            if let Some(highlights) = &highlights {
                line.has_intraline_info = true;
                line.highlights = highlights
                    .iter()
                    .filter(|h| h.content_index == i)
                    .copied()
                    .collect();
            }
            line
        })
        .collect()
}

/// Cut pure additions and removals into groups of at most `max` lines, and
/// under whole-file context split very long common chunks once.
fn split_large_chunks(chunks: Vec<Chunk>, context: Context, max: usize) -> Vec<Chunk> {
    let mut out = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match &chunk.body {
            ChunkBody::Common(ab) if context == Context::WholeFile && ab.len() > max * 2 => {
                let (head, tail) = ab.split_at(max);
                out.push(Chunk {
                    body: ChunkBody::Common(head.to_vec()),
                    ..chunk.clone()
                });
                out.push(Chunk {
                    body: ChunkBody::Common(tail.to_vec()),
                    ..chunk
                });
            }
            // moved blocks stay whole so their label sits on top
            ChunkBody::Delta { a, b, common, .. }
                if chunk.move_details.is_none() && (a.is_empty() != b.is_empty()) =>
            {
                let removed = !a.is_empty();
                let rows = if removed { a } else { b };
                for part in rows.chunks(max) {
                    let (a, b) = if removed {
                        (part.to_vec(), Vec::new())
                    } else {
                        (Vec::new(), part.to_vec())
                    };
                    out.push(Chunk {
                        body: ChunkBody::Delta {
                            a,
                            b,
                            edit_a: None,
                            edit_b: None,
                            common: *common,
                        },
                        due_to_rebase: chunk.due_to_rebase,
                        move_details: None,
                        key_location: chunk.key_location,
                    });
                }
            }
            _ => out.push(chunk),
        }
    }
    out
}

/// Split common chunks so every key location becomes its own chunk.
fn split_at_key_locations(chunks: Vec<Chunk>, keys: &KeyLocations) -> Vec<Chunk> {
    let mut out = Vec::with_capacity(chunks.len());
    let mut left = 1u32;
    let mut right = 1u32;

    for chunk in chunks {
        if !chunk.is_common() {
            left = left.saturating_add(len_u32(chunk.left_len()));
            right = right.saturating_add(len_u32(chunk.right_len()));
            out.push(chunk);
            continue;
        }
        // skipped lines are never shown, so they cannot hold a key line
        if chunk.is_skip() {
            left = left.saturating_add(len_u32(chunk.left_len()));
            right = right.saturating_add(len_u32(chunk.right_len()));
            out.push(Chunk {
                key_location: false,
                ..chunk
            });
            continue;
        }

        let num_lines = chunk.left_len();
        let ends = chunk_ends(num_lines, left, right, keys);
        left = left.saturating_add(len_u32(num_lines));
        right = right.saturating_add(len_u32(num_lines));

        if ends.len() <= 1 {
            let key_location = chunk.key_location || ends.iter().any(|e| e.1);
            out.push(Chunk {
                key_location,
                ..chunk
            });
            continue;
        }

        let mut start = 0;
        for (end, key) in ends {
            let body = match &chunk.body {
                ChunkBody::Common(ab) => ChunkBody::Common(ab[start..end].to_vec()),
                ChunkBody::Delta { a, b, common, .. } => ChunkBody::Delta {
                    a: a[start..end].to_vec(),
                    b: b[start..end].to_vec(),
                    edit_a: None,
                    edit_b: None,
                    common: *common,
                },
                ChunkBody::Skip(_) => continue,
            };
            out.push(Chunk {
                body,
                due_to_rebase: chunk.due_to_rebase,
                move_details: chunk.move_details,
                key_location: key || chunk.key_location,
            });
            start = end;
        }
    }
    out
}

/// End offsets of the pieces a common chunk is cut into, each flagged when
/// the piece is a single key line.
fn chunk_ends(num_lines: usize, left: u32, right: u32, keys: &KeyLocations) -> Vec<(usize, bool)> {
    let mut ends = Vec::new();
    let mut last_end = 0;
    for i in 0..num_lines {
        let (l, r) = (left.saturating_add(len_u32(i)), right.saturating_add(len_u32(i)));
        if keys.contains(Side::Left, l) || keys.contains(Side::Right, r) {
            if i > last_end {
                ends.push((i, false));
            }
            ends.push((i + 1, true));
            last_end = i + 1;
        }
    }
    if num_lines > last_end {
        ends.push((num_lines, false));
    }
    ends
}
