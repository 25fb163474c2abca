//! Renderable groups of diff lines and context collapsing.
//!
//! A [`DiffGroup`] is the unit the renderer works with: a run of common lines,
//! a delta of removed and added lines, or a context control hiding other
//! groups. [`hide_in_context_control`] cuts a run of common groups at line
//! offsets and wraps the middle part in a context control.

use log::warn;

use super::chunk::MoveDetails;
use super::line::{DiffLine, DiffLineType, LineNumber, Side};
use crate::error::{DiffError, Result};

/// Hidden runs of this many lines or fewer are shown instead of collapsed.
pub const MIN_HIDDEN_LINES: i64 = 3;

/// Lines revealed by a single partial expansion of a context control.
pub const PARTIAL_CONTEXT_AMOUNT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupType {
    /// Unchanged lines shown on both sides
    Both,
    /// Removed and/or added lines
    Delta,
    /// Placeholder for hidden common lines
    ContextControl,
}

/// Inclusive line range on one side. `start == 0` means no lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideRange {
    pub start: u32,
    pub end: u32,
}

impl SideRange {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == 0
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    #[must_use]
    pub const fn contains(&self, line: u32) -> bool {
        !self.is_empty() && line >= self.start && line <= self.end
    }

    fn include(&mut self, line: u32) {
        if self.start == 0 || line < self.start {
            self.start = line;
        }
        if line > self.end {
            self.end = line;
        }
    }

    fn union(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        self.include(other.start);
        self.include(other.end);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineRange {
    pub left: SideRange,
    pub right: SideRange,
}

impl LineRange {
    #[must_use]
    pub const fn side(&self, side: Side) -> SideRange {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Flags carried from the originating chunk to every group cut from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupOptions {
    pub due_to_rebase: bool,
    pub move_details: Option<MoveDetails>,
    pub ignored_whitespace_only: bool,
    pub key_location: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffGroup {
    pub group_type: GroupType,
    lines: Vec<DiffLine>,
    line_range: LineRange,
    pub key_location: bool,
    pub due_to_rebase: bool,
    pub move_details: Option<MoveDetails>,
    pub ignored_whitespace_only: bool,
    /// Number of un-fetched common lines this group stands for
    pub skip: Option<u32>,
    /// Groups hidden behind this context control
    pub context_groups: Vec<DiffGroup>,
}

impl DiffGroup {
    /// Empty group of the given type.
    #[must_use]
    pub const fn new(group_type: GroupType, options: GroupOptions) -> Self {
        Self {
            group_type,
            lines: Vec::new(),
            line_range: LineRange {
                left: SideRange { start: 0, end: 0 },
                right: SideRange { start: 0, end: 0 },
            },
            key_location: options.key_location,
            due_to_rebase: options.due_to_rebase,
            move_details: options.move_details,
            ignored_whitespace_only: options.ignored_whitespace_only,
            skip: None,
            context_groups: Vec::new(),
        }
    }

    /// Group holding `lines`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::DeltaLineInCommonGroup`] when an added or removed
    /// line is put into a non-delta group.
    pub fn with_lines(
        group_type: GroupType,
        lines: Vec<DiffLine>,
        options: GroupOptions,
    ) -> Result<Self> {
        let mut group = Self::new(group_type, options);
        group.lines.reserve(lines.len());
        for line in lines {
            group.add_line(line)?;
        }
        Ok(group)
    }

    /// Common lines numbered from `offset_left` and `offset_right`.
    #[must_use]
    pub fn common(rows: &[String], offset_left: u32, offset_right: u32, options: GroupOptions) -> Self {
        let mut group = Self::new(GroupType::Both, options);
        for ((left, right), row) in (offset_left..).zip(offset_right..).zip(rows) {
            let line = DiffLine {
                before_number: Some(LineNumber::Line(left)),
                after_number: Some(LineNumber::Line(right)),
                text: row.clone(),
                ..DiffLine::new(DiffLineType::Both)
            };
            group.update_range(&line);
            group.lines.push(line);
        }
        group
    }

    /// Delta group; lines of any type are accepted.
    #[must_use]
    pub fn delta(lines: Vec<DiffLine>, options: GroupOptions) -> Self {
        let mut group = Self::new(GroupType::Delta, options);
        for line in &lines {
            group.update_range(line);
        }
        group.lines = lines;
        group
    }

    /// Placeholder for `count` common lines that were not fetched.
    #[must_use]
    pub fn skipped(count: u32, offset_left: u32, offset_right: u32, options: GroupOptions) -> Self {
        let mut group = Self::new(GroupType::Both, options);
        group.skip = Some(count);
        if count == 0 {
            warn!("skip group at {offset_left}/{offset_right} covers no lines");
            return group;
        }
        group.line_range = LineRange {
            left: SideRange {
                start: offset_left,
                end: offset_left.saturating_add(count - 1),
            },
            right: SideRange {
                start: offset_right,
                end: offset_right.saturating_add(count - 1),
            },
        };
        group
    }

    /// Context control hiding `groups`.
    #[must_use]
    pub fn context_control(groups: Vec<Self>) -> Self {
        let mut control = Self::new(GroupType::ContextControl, GroupOptions::default());
        for group in &groups {
            control.line_range.left.union(group.line_range.left);
            control.line_range.right.union(group.line_range.right);
        }
        control.context_groups = groups;
        control
    }

    /// Append a line, extending the line range.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::DeltaLineInCommonGroup`] if the line is an addition
    /// or removal and this is not a delta group.
    pub fn add_line(&mut self, line: DiffLine) -> Result<()> {
        if self.group_type != GroupType::Delta && line.is_delta() {
            return Err(DiffError::DeltaLineInCommonGroup);
        }
        self.update_range(&line);
        self.lines.push(line);
        Ok(())
    }

    fn update_range(&mut self, line: &DiffLine) {
        if line.is_pseudo() {
            return;
        }
        if matches!(line.line_type, DiffLineType::Add | DiffLineType::Both) {
            if let Some(n) = line.line_on(Side::Right) {
                self.line_range.right.include(n);
            }
        }
        if matches!(line.line_type, DiffLineType::Remove | DiffLineType::Both) {
            if let Some(n) = line.line_on(Side::Left) {
                self.line_range.left.include(n);
            }
        }
    }

    /// A group of the same type and flags holding `lines` instead.
    ///
    /// # Errors
    ///
    /// See [`DiffGroup::with_lines`].
    pub fn clone_with_lines(&self, lines: Vec<DiffLine>) -> Result<Self> {
        Self::with_lines(self.group_type, lines, self.options())
    }

    #[must_use]
    pub const fn options(&self) -> GroupOptions {
        GroupOptions {
            due_to_rebase: self.due_to_rebase,
            move_details: self.move_details,
            ignored_whitespace_only: self.ignored_whitespace_only,
            key_location: self.key_location,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    #[must_use]
    pub const fn line_range(&self) -> LineRange {
        self.line_range
    }

    pub fn adds(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines
            .iter()
            .filter(|l| l.line_type == DiffLineType::Add)
    }

    pub fn removes(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines
            .iter()
            .filter(|l| l.line_type == DiffLineType::Remove)
    }

    /// Moved lines
    #[must_use]
    pub const fn due_to_move(&self) -> bool {
        self.move_details.is_some()
    }

    /// Number of lines this group covers on the left side, including hidden
    /// and un-fetched ones.
    #[must_use]
    pub const fn line_count(&self) -> u32 {
        self.line_range.left.len()
    }

    /// Pairs of (removed, added) lines for side-by-side rendering. Common
    /// lines pair with themselves.
    #[must_use]
    pub fn side_by_side_pairs(&self) -> Vec<(Option<&DiffLine>, Option<&DiffLine>)> {
        if self.group_type != GroupType::Delta {
            return self.lines.iter().map(|l| (Some(l), Some(l))).collect();
        }
        let removes: Vec<&DiffLine> = self.removes().collect();
        let adds: Vec<&DiffLine> = self.adds().collect();
        let rows = removes.len().max(adds.len());
        (0..rows)
            .map(|i| (removes.get(i).copied(), adds.get(i).copied()))
            .collect()
    }

    /// A delta that only adds or only removes lines.
    #[must_use]
    pub fn is_total(&self) -> bool {
        if self.group_type != GroupType::Delta {
            return false;
        }
        let has_adds = self.adds().next().is_some();
        let has_removes = self.removes().next().is_some();
        has_adds != has_removes
    }

    /// Whether this group or any group it hides stands for un-fetched lines.
    #[must_use]
    pub fn has_skip_group(&self) -> bool {
        self.skip.is_some() || self.context_groups.iter().any(Self::has_skip_group)
    }

    #[must_use]
    pub const fn contains_line(&self, side: Side, line: u32) -> bool {
        self.line_range.side(side).contains(line)
    }

    /// Whether the group contains the given (pseudo-)line on a side.
    #[must_use]
    pub fn contains_number(&self, side: Side, number: LineNumber) -> bool {
        match number {
            LineNumber::Line(n) => self.contains_line(side, n),
            LineNumber::File | LineNumber::Lost => {
                self.lines.iter().any(|l| l.number(side) == Some(number))
            }
        }
    }
}

/// Hide the common lines between `hidden_start` and `hidden_end` (offsets from
/// the first group's first line) behind a context control.
///
/// Returns the visible groups before the hidden part, the context control (if
/// anything was hidden) and the visible groups after it. Ranges of
/// [`MIN_HIDDEN_LINES`] or fewer are left visible.
#[must_use]
pub fn hide_in_context_control(
    groups: Vec<DiffGroup>,
    hidden_start: i64,
    hidden_end: i64,
) -> Vec<DiffGroup> {
    if groups.is_empty() {
        return groups;
    }
    let hidden_start = hidden_start.max(0);
    let hidden_end = hidden_end.max(hidden_start);

    let mut before = Vec::new();
    let mut hidden = groups;
    let mut after = Vec::new();

    if hidden_end - hidden_start > MIN_HIDDEN_LINES {
        if hidden_start > 0 {
            (before, hidden) = split_common_groups(hidden, hidden_start);
        }
        if hidden_end > 0 {
            let before_length = match (before.first(), before.last()) {
                (Some(first), Some(last)) => i64::from(last.line_range.left.end)
                    - i64::from(first.line_range.left.start)
                    + 1,
                _ => 0,
            };
            (hidden, after) = split_common_groups(hidden, hidden_end - before_length);
        }
    } else {
        after = hidden;
        hidden = Vec::new();
    }

    let mut result = before;
    if !hidden.is_empty() {
        result.push(DiffGroup::context_control(hidden));
    }
    result.extend(after);
    result
}

/// Partition common groups at `split` lines after the first group's start.
fn split_common_groups(groups: Vec<DiffGroup>, split: i64) -> (Vec<DiffGroup>, Vec<DiffGroup>) {
    let Some(first) = groups.first() else {
        return (Vec::new(), Vec::new());
    };
    let left_split = i64::from(first.line_range.left.start) + split;
    let right_split = i64::from(first.line_range.right.start) + split;

    let mut before_groups = Vec::new();
    let mut after_groups = Vec::new();
    for group in groups {
        let range = group.line_range;
        let completely_before =
            i64::from(range.left.end) < left_split || i64::from(range.right.end) < right_split;
        let completely_after =
            left_split <= i64::from(range.left.start) || right_split <= i64::from(range.right.start);
        if completely_before {
            before_groups.push(group);
        } else if completely_after {
            after_groups.push(group);
        } else {
            let (first_half, second_half) = split_group_in_two(group, left_split, right_split);
            before_groups.extend(first_half);
            after_groups.extend(second_half);
        }
    }
    (before_groups, after_groups)
}

/// Split a group straddling the split lines. Halves keeping every line reuse
/// the original group.
fn split_group_in_two(
    group: DiffGroup,
    left_split: i64,
    right_split: i64,
) -> (Option<DiffGroup>, Option<DiffGroup>) {
    if group.skip.is_some() {
        // Un-fetched lines cannot be split; the whole group goes to the closer side.
        let range = group.line_range.left;
        let closer_to_start =
            left_split - i64::from(range.start) < i64::from(range.end) - left_split;
        return if closer_to_start {
            (None, Some(group))
        } else {
            (Some(group), None)
        };
    }

    let is_before = |line: &DiffLine| {
        line.line_on(Side::Left)
            .is_some_and(|n| i64::from(n) < left_split)
            || line
                .line_on(Side::Right)
                .is_some_and(|n| i64::from(n) < right_split)
    };
    let before_count = group.lines.iter().filter(|l| is_before(l)).count();
    if before_count == group.lines.len() {
        return (Some(group), None);
    }
    if before_count == 0 {
        return (None, Some(group));
    }

    let group_type = group.group_type;
    let options = group.options();
    let (before, after): (Vec<DiffLine>, Vec<DiffLine>) =
        group.lines.into_iter().partition(|l| is_before(l));
    (
        Some(from_subset(group_type, before, options)),
        Some(from_subset(group_type, after, options)),
    )
}

/// Rebuild a group from a subset of a valid group's lines.
fn from_subset(group_type: GroupType, lines: Vec<DiffLine>, options: GroupOptions) -> DiffGroup {
    let mut group = DiffGroup::new(group_type, options);
    for line in &lines {
        group.update_range(line);
    }
    group.lines = lines;
    group
}

/// How much of a context control to reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextExpansion {
    All,
    /// Reveal this many lines at the top
    Above(u32),
    /// Reveal this many lines at the bottom
    Below(u32),
}

/// Result of expanding a context control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expanded {
    /// Groups replacing the context control in place
    Groups(Vec<DiffGroup>),
    /// The hidden lines were never fetched; the host must load them first.
    LoadNeeded(LineRange),
}

/// Expand a context control. Non-control groups are returned unchanged.
///
/// A control hiding a delta group (a whitespace-only change) only expands
/// whole. Revealing lines next to an un-fetched group needs those lines
/// loaded first.
#[must_use]
pub fn expand_context_control(control: DiffGroup, expansion: ContextExpansion) -> Expanded {
    if control.group_type != GroupType::ContextControl {
        return Expanded::Groups(vec![control]);
    }
    let has_delta = control
        .context_groups
        .iter()
        .any(|g| g.group_type == GroupType::Delta);
    let expansion = if has_delta {
        ContextExpansion::All
    } else {
        expansion
    };

    let edge = match expansion {
        ContextExpansion::All => None,
        ContextExpansion::Above(_) => control.context_groups.first(),
        ContextExpansion::Below(_) => control.context_groups.last(),
    };
    if let Some(skipped) = edge.filter(|g| g.skip.is_some()) {
        return Expanded::LoadNeeded(skipped.line_range);
    }

    let num_lines = i64::from(control.line_count());
    match expansion {
        ContextExpansion::All if control.has_skip_group() => {
            Expanded::LoadNeeded(control.line_range)
        }
        ContextExpansion::All => Expanded::Groups(control.context_groups),
        ContextExpansion::Above(n) => Expanded::Groups(hide_in_context_control(
            control.context_groups,
            i64::from(n),
            num_lines,
        )),
        ContextExpansion::Below(n) => Expanded::Groups(hide_in_context_control(
            control.context_groups,
            0,
            num_lines - i64::from(n),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common_line(left: u32, right: u32) -> DiffLine {
        DiffLine {
            before_number: Some(LineNumber::Line(left)),
            after_number: Some(LineNumber::Line(right)),
            text: format!("line {right}"),
            ..DiffLine::new(DiffLineType::Both)
        }
    }

    fn common_group(start: u32, end: u32) -> DiffGroup {
        let lines = (start..=end).map(|n| common_line(n, n)).collect();
        DiffGroup::with_lines(GroupType::Both, lines, GroupOptions::default())
            .expect("common lines")
    }

    fn flatten(groups: &[DiffGroup]) -> Vec<DiffLine> {
        let mut lines = Vec::new();
        for group in groups {
            if group.group_type == GroupType::ContextControl {
                lines.extend(flatten(&group.context_groups));
            } else {
                lines.extend(group.lines().iter().cloned());
            }
        }
        lines
    }

    #[test]
    fn skipped_range_saturates() {
        let group = DiffGroup::skipped(u32::MAX, 2, 3, GroupOptions::default());
        assert_eq!(group.line_range().left, SideRange { start: 2, end: u32::MAX });
        assert_eq!(group.line_range().right, SideRange { start: 3, end: u32::MAX });
    }

    #[test]
    fn line_range_tracks_both_sides() {
        let mut group = DiffGroup::new(GroupType::Delta, GroupOptions::default());
        let mut removed = DiffLine::new(DiffLineType::Remove);
        removed.before_number = Some(LineNumber::Line(5));
        let mut added = DiffLine::new(DiffLineType::Add);
        added.after_number = Some(LineNumber::Line(9));
        group.add_line(removed).unwrap();
        group.add_line(added).unwrap();

        assert_eq!(group.line_range().left, SideRange { start: 5, end: 5 });
        assert_eq!(group.line_range().right, SideRange { start: 9, end: 9 });
        assert_eq!(group.adds().count(), 1);
        assert_eq!(group.removes().count(), 1);
        assert!(!group.is_total());
    }

    #[test]
    fn rejects_delta_line_in_common_group() {
        let mut group = DiffGroup::new(GroupType::Both, GroupOptions::default());
        assert_eq!(
            group.add_line(DiffLine::new(DiffLineType::Add)),
            Err(DiffError::DeltaLineInCommonGroup)
        );
    }

    #[test]
    fn pseudo_lines_do_not_extend_range() {
        let group = DiffGroup::with_lines(
            GroupType::Both,
            vec![DiffLine::pseudo(LineNumber::File)],
            GroupOptions::default(),
        )
        .unwrap();
        assert!(group.line_range().left.is_empty());
        assert!(group.contains_number(Side::Left, LineNumber::File));
    }

    #[test]
    fn hides_middle_of_common_run() {
        let groups = vec![common_group(1, 20)];
        let result = hide_in_context_control(groups, 3, 17);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].group_type, GroupType::Both);
        assert_eq!(result[0].line_range().left, SideRange { start: 1, end: 3 });
        assert_eq!(result[1].group_type, GroupType::ContextControl);
        assert_eq!(result[1].line_range().left, SideRange { start: 4, end: 17 });
        assert_eq!(result[2].line_range().left, SideRange { start: 18, end: 20 });
    }

    #[test]
    fn small_hidden_range_is_not_collapsed() {
        for (start, end) in [(0, 3), (5, 8), (2, 2), (10, 4)] {
            let result = hide_in_context_control(vec![common_group(1, 20)], start, end);
            assert!(
                result
                    .iter()
                    .all(|g| g.group_type != GroupType::ContextControl),
                "collapsed {start}..{end}"
            );
        }
    }

    #[test]
    fn collapsing_then_expanding_restores_lines() {
        let original = vec![common_group(1, 4), common_group(5, 12), common_group(13, 30)];
        let expected = flatten(&original);
        for (start, end) in [(0, 30), (2, 9), (6, 6), (0, 13), (4, 26), (7, 40)] {
            let collapsed = hide_in_context_control(original.clone(), start, end);
            assert_eq!(flatten(&collapsed), expected, "range {start}..{end}");
        }
    }

    #[test]
    fn unsplit_groups_pass_through() {
        let original = vec![common_group(1, 3), common_group(4, 10), common_group(11, 13)];
        let result = hide_in_context_control(original.clone(), 3, 10);
        assert_eq!(result[0], original[0]);
        assert_eq!(result[1].context_groups, vec![original[1].clone()]);
        assert_eq!(result[2], original[2]);
    }

    #[test]
    fn split_preserves_flags() {
        let options = GroupOptions {
            due_to_rebase: true,
            ignored_whitespace_only: true,
            ..GroupOptions::default()
        };
        let lines = (1..=10).map(|n| common_line(n, n + 2)).collect();
        let group = DiffGroup::with_lines(GroupType::Both, lines, options).unwrap();
        let result = hide_in_context_control(vec![group], 2, 8);

        assert_eq!(result.len(), 3);
        for g in [&result[0], &result[2]] {
            assert!(g.due_to_rebase);
            assert!(g.ignored_whitespace_only);
        }
        assert_eq!(result[0].line_range().right, SideRange { start: 3, end: 4 });
        assert_eq!(result[2].line_range().right, SideRange { start: 11, end: 12 });
    }

    #[test]
    fn skip_group_moves_to_closer_side() {
        let skipped = DiffGroup::skipped(100, 11, 11, GroupOptions::default());
        let groups = vec![common_group(1, 10), skipped];

        // Split near the start of the skip group: it goes after the split.
        let result = hide_in_context_control(groups.clone(), 13, 110);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].line_range().left, SideRange { start: 1, end: 10 });
        assert!(result[1].has_skip_group());

        // Split near its end: it stays before the split and gets hidden.
        let result = hide_in_context_control(groups, 0, 105);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].group_type, GroupType::ContextControl);
        assert_eq!(result[0].line_range().left, SideRange { start: 1, end: 110 });
    }

    #[test]
    fn expanding_partially_rehides_remaining_lines() {
        let control = DiffGroup::context_control(vec![common_group(4, 40)]);

        let Expanded::Groups(above) = expand_context_control(control.clone(), ContextExpansion::Above(10))
        else {
            panic!("expected groups");
        };
        assert_eq!(above.len(), 2);
        assert_eq!(above[0].line_range().left, SideRange { start: 4, end: 13 });
        assert_eq!(above[1].group_type, GroupType::ContextControl);

        let Expanded::Groups(below) = expand_context_control(control.clone(), ContextExpansion::Below(10))
        else {
            panic!("expected groups");
        };
        assert_eq!(below.len(), 2);
        assert_eq!(below[0].group_type, GroupType::ContextControl);
        assert_eq!(below[1].line_range().left, SideRange { start: 31, end: 40 });

        let Expanded::Groups(all) = expand_context_control(control, ContextExpansion::All) else {
            panic!("expected groups");
        };
        assert_eq!(all, vec![common_group(4, 40)]);
    }

    #[test]
    fn expanding_skip_group_requests_load() {
        let control = DiffGroup::context_control(vec![DiffGroup::skipped(
            50,
            10,
            12,
            GroupOptions::default(),
        )]);
        assert_eq!(
            expand_context_control(control, ContextExpansion::All),
            Expanded::LoadNeeded(LineRange {
                left: SideRange { start: 10, end: 59 },
                right: SideRange { start: 12, end: 61 },
            })
        );
    }

    #[test]
    fn partial_expansion_next_to_skipped_lines_requests_load() {
        let control = DiffGroup::context_control(vec![
            DiffGroup::skipped(50, 1, 1, GroupOptions::default()),
            common_group(51, 70),
        ]);
        assert_eq!(
            expand_context_control(control.clone(), ContextExpansion::Above(10)),
            Expanded::LoadNeeded(LineRange {
                left: SideRange { start: 1, end: 50 },
                right: SideRange { start: 1, end: 50 },
            })
        );

        let Expanded::Groups(below) = expand_context_control(control, ContextExpansion::Below(10))
        else {
            panic!("expected groups");
        };
        assert_eq!(below.len(), 2);
        assert!(below[0].has_skip_group());
        assert_eq!(below[1].line_range().left, SideRange { start: 61, end: 70 });
    }

    #[test]
    fn control_hiding_whitespace_change_expands_whole() {
        let mut removed = DiffLine::new(DiffLineType::Remove);
        removed.before_number = Some(LineNumber::Line(11));
        let mut added = DiffLine::new(DiffLineType::Add);
        added.after_number = Some(LineNumber::Line(11));
        let whitespace = DiffGroup::delta(
            vec![removed, added],
            GroupOptions {
                ignored_whitespace_only: true,
                ..GroupOptions::default()
            },
        );
        let groups = vec![common_group(1, 10), whitespace, common_group(12, 30)];
        let control = DiffGroup::context_control(groups.clone());

        assert_eq!(
            expand_context_control(control, ContextExpansion::Above(5)),
            Expanded::Groups(groups)
        );
    }

    #[test]
    fn side_by_side_pairs_align_removes_and_adds() {
        let mut lines = Vec::new();
        for n in 1..=2 {
            let mut l = DiffLine::new(DiffLineType::Remove);
            l.before_number = Some(LineNumber::Line(n));
            lines.push(l);
        }
        let mut added = DiffLine::new(DiffLineType::Add);
        added.after_number = Some(LineNumber::Line(1));
        lines.push(added);
        let group = DiffGroup::with_lines(GroupType::Delta, lines, GroupOptions::default()).unwrap();

        let pairs = group.side_by_side_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].0.is_some() && pairs[0].1.is_some());
        assert!(pairs[1].0.is_some() && pairs[1].1.is_none());
    }
}
