//! Range algebra
//!
//! Ranges are half-open `[from, from + count)` spans of UTF-16 code units.
//! [`merge_ranges`] unions plain ranges; [`normalize_ranges`] resolves a
//! prioritised list of styled ranges (later wins) into a non-overlapping
//! partition; [`add_normalized_ranges`] splices one normalized list over
//! another with the same override rule.

use std::collections::BTreeSet;

use crate::style::Style;

/// A span of UTF-16 code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    pub from: usize,
    pub count: usize,
}

impl Range {
    pub fn new(from: usize, count: usize) -> Self {
        Self { from, count }
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.from + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.from && pos < self.end()
    }
}

/// A range with the style to apply over it
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRange {
    pub from: usize,
    pub count: usize,
    pub style: Style,
}

impl StyledRange {
    pub fn new(from: usize, count: usize, style: Style) -> Self {
        Self { from, count, style }
    }

    pub fn from_range(range: Range, style: Style) -> Self {
        Self::new(range.from, range.count, style)
    }

    pub fn range(&self) -> Range {
        Range::new(self.from, self.count)
    }

    pub fn end(&self) -> usize {
        self.from + self.count
    }
}

/// Union of `ranges`: sorted, non-overlapping, with touching ranges joined
///
/// Empty ranges are dropped.
pub fn merge_ranges(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort_unstable_by_key(|r| r.from);

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(prev) if range.from <= prev.end() => {
                let end = prev.end().max(range.end());
                prev.count = end - prev.from;
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Ends sort before starts at the same position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    End,
    Start,
}

/// Resolve overlapping styled ranges into a partition
///
/// Priority is input order: where ranges overlap, each field takes the
/// value from the latest range that sets it. Offsets covered by no range
/// produce no output. Adjacent segments with equal styles are joined.
pub fn normalize_ranges(ranges: &[StyledRange]) -> Vec<StyledRange> {
    let mut events: Vec<(usize, Edge, usize)> = Vec::with_capacity(ranges.len() * 2);
    for (priority, range) in ranges.iter().enumerate() {
        if range.count == 0 {
            continue;
        }
        events.push((range.from, Edge::Start, priority));
        events.push((range.end(), Edge::End, priority));
    }
    events.sort_unstable();

    let mut active: BTreeSet<usize> = BTreeSet::new();
    let mut output: Vec<StyledRange> = Vec::new();
    let mut last_pos = 0;

    for (pos, edge, priority) in events {
        if pos > last_pos && !active.is_empty() {
            let style = active.iter().fold(Style::new(), |mut acc, &i| {
                acc.merge(&ranges[i].style);
                acc
            });
            push_coalesced(&mut output, StyledRange::new(last_pos, pos - last_pos, style));
        }
        match edge {
            Edge::Start => {
                active.insert(priority);
            }
            Edge::End => {
                active.remove(&priority);
            }
        }
        last_pos = pos;
    }

    output
}

fn push_coalesced(output: &mut Vec<StyledRange>, segment: StyledRange) {
    if let Some(prev) = output.last_mut() {
        if prev.end() == segment.from && prev.style == segment.style {
            prev.count += segment.count;
            return;
        }
    }
    output.push(segment);
}

/// Splice one normalized range over a normalized list
///
/// Existing ranges the incoming one overlaps are split into the parts
/// before, inside and after it; inside parts take the incoming style
/// merged over their own. Uncovered parts of the incoming range are
/// inserted with its style alone.
pub fn add_normalized_range(existing: &mut Vec<StyledRange>, incoming: &StyledRange) {
    if incoming.count == 0 {
        return;
    }
    let start = incoming.from;
    let end = incoming.end();

    let first = existing.partition_point(|r| r.end() <= start);
    let last = existing.partition_point(|r| r.from < end);

    let mut pieces: Vec<StyledRange> = Vec::new();
    let mut cursor = start;
    for range in existing[first..last.max(first)].iter() {
        if range.from < start {
            pieces.push(StyledRange::new(
                range.from,
                start - range.from,
                range.style.clone(),
            ));
        }
        let overlap_start = range.from.max(start);
        let overlap_end = range.end().min(end);
        if overlap_start > cursor {
            pieces.push(StyledRange::new(
                cursor,
                overlap_start - cursor,
                incoming.style.clone(),
            ));
        }
        pieces.push(StyledRange::new(
            overlap_start,
            overlap_end - overlap_start,
            range.style.merged(&incoming.style),
        ));
        cursor = overlap_end;
        if range.end() > end {
            pieces.push(StyledRange::new(end, range.end() - end, range.style.clone()));
        }
    }
    if cursor < end {
        pieces.push(StyledRange::new(cursor, end - cursor, incoming.style.clone()));
    }

    let inserted = pieces.len();
    existing.splice(first..last.max(first), pieces);

    let lo = first.saturating_sub(1);
    let hi = (first + inserted + 1).min(existing.len());
    coalesce_window(existing, lo, hi);
}

/// Splice every range of a normalized list, in order
pub fn add_normalized_ranges(existing: &mut Vec<StyledRange>, incoming: &[StyledRange]) {
    for range in incoming {
        add_normalized_range(existing, range);
    }
}

fn coalesce_window(ranges: &mut Vec<StyledRange>, lo: usize, mut hi: usize) {
    let mut i = lo;
    while i + 1 < hi {
        if ranges[i].end() == ranges[i + 1].from && ranges[i].style == ranges[i + 1].style {
            let next = ranges.remove(i + 1);
            ranges[i].count += next.count;
            hi -= 1;
        } else {
            i += 1;
        }
    }
}
