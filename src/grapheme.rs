//! Grapheme segmentation and cursor context
//!
//! Text is split once into extended grapheme clusters and grouped into
//! lines. A line is a run of clusters ending in (and including) a line
//! break cluster (`\n`, `\r` or `\r\n`), or the trailing run with no break.
//!
//! Grapheme rules see each cluster through a [`GraphemeContext`], which
//! can look around the cluster globally or within its line, optionally
//! skipping clusters that match a [`Matcher`].

use std::rc::Rc;

use log::trace;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::charclass::Matcher;
use crate::range::{merge_ranges, Range};

/// Whether a cluster is a line break
pub fn is_line_break(grapheme: &str) -> bool {
    matches!(grapheme, "\n" | "\r" | "\r\n")
}

/// One extended grapheme cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grapheme<'t> {
    /// Cluster text
    pub text: &'t str,
    /// Byte offset into the source string
    pub byte_offset: usize,
    /// UTF-16 offset into the source string
    pub offset: usize,
    /// Length in UTF-16 code units
    pub len: usize,
    /// Zero-based index among all clusters
    pub index: usize,
    /// Line this cluster belongs to
    pub line: usize,
    /// Zero-based index within its line
    pub index_in_line: usize,
}

impl Grapheme<'_> {
    /// UTF-16 range covered by this cluster
    pub fn range(&self) -> Range {
        Range::new(self.offset, self.len)
    }

    pub fn is_line_break(&self) -> bool {
        is_line_break(self.text)
    }
}

/// A line of clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub index: usize,
    /// Index of the first cluster
    pub from: usize,
    /// Number of clusters, including the line break
    pub count: usize,
    /// Whether the line ends in an explicit break
    pub include_lb: bool,
}

impl LineInfo {
    /// Exclusive end cluster index
    pub fn end(&self) -> usize {
        self.from + self.count
    }
}

/// Clusters and lines of one text
#[derive(Debug, Clone)]
pub struct Segmentation<'t> {
    text: &'t str,
    graphemes: Vec<Grapheme<'t>>,
    lines: Vec<LineInfo>,
}

/// Segment `text` into clusters and lines
pub fn segment_text(text: &str) -> Segmentation<'_> {
    let mut graphemes = Vec::new();
    let mut lines = Vec::new();
    let mut offset = 0;
    let mut line_start = 0;

    for (index, (byte_offset, cluster)) in text.grapheme_indices(true).enumerate() {
        let len = cluster.encode_utf16().count();
        graphemes.push(Grapheme {
            text: cluster,
            byte_offset,
            offset,
            len,
            index,
            line: lines.len(),
            index_in_line: index - line_start,
        });
        offset += len;

        if is_line_break(cluster) {
            lines.push(LineInfo {
                index: lines.len(),
                from: line_start,
                count: index + 1 - line_start,
                include_lb: true,
            });
            line_start = index + 1;
        }
    }
    if line_start < graphemes.len() {
        lines.push(LineInfo {
            index: lines.len(),
            from: line_start,
            count: graphemes.len() - line_start,
            include_lb: false,
        });
    }

    Segmentation {
        text,
        graphemes,
        lines,
    }
}

impl<'t> Segmentation<'t> {
    pub fn text(&self) -> &'t str {
        self.text
    }

    pub fn graphemes(&self) -> &[Grapheme<'t>] {
        &self.graphemes
    }

    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.graphemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphemes.is_empty()
    }

    /// Total length in UTF-16 code units
    pub fn utf16_len(&self) -> usize {
        self.graphemes.last().map_or(0, |g| g.offset + g.len)
    }

    /// UTF-16 range covered by `count` clusters starting at cluster `from`
    pub fn cluster_range(&self, from: usize, count: usize) -> Range {
        let end = (from + count).min(self.graphemes.len());
        if from >= end {
            return Range::new(self.utf16_len(), 0);
        }
        let start = self.graphemes[from].offset;
        let last = &self.graphemes[end - 1];
        Range::new(start, last.offset + last.len - start)
    }

    /// UTF-16 range covered by a line, including its break
    pub fn line_range(&self, line: usize) -> Range {
        match self.lines.get(line) {
            Some(info) => self.cluster_range(info.from, info.count),
            None => Range::new(self.utf16_len(), 0),
        }
    }
}

/// The view a grapheme rule gets of the current cluster
#[derive(Debug, Clone, Copy)]
pub struct GraphemeContext<'a> {
    seg: &'a Segmentation<'a>,
    index: usize,
    iteration: usize,
}

impl<'a> GraphemeContext<'a> {
    /// Context for cluster `index` during pass `iteration`
    pub fn new(seg: &'a Segmentation<'a>, index: usize, iteration: usize) -> Self {
        Self {
            seg,
            index,
            iteration,
        }
    }

    fn current(&self) -> &'a Grapheme<'a> {
        &self.seg.graphemes[self.index]
    }

    fn line_info(&self) -> &'a LineInfo {
        &self.seg.lines[self.current().line]
    }

    pub fn grapheme(&self) -> &'a str {
        self.current().text
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn line(&self) -> usize {
        self.current().line
    }

    pub fn index_in_line(&self) -> usize {
        self.current().index_in_line
    }

    /// Clusters in the current line, including its break
    pub fn line_length(&self) -> usize {
        self.line_info().count
    }

    pub fn total_lines(&self) -> usize {
        self.seg.lines.len()
    }

    /// Whether the current line ends in an explicit break
    pub fn include_lb(&self) -> bool {
        self.line_info().include_lb
    }

    /// Zero-based pass number
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Display width of the current cluster in terminal columns
    pub fn width(&self) -> usize {
        self.current().text.width()
    }

    pub fn prev(&self, skip: Option<&Matcher>) -> Option<&'a Grapheme<'a>> {
        self.peek(-1, skip)
    }

    pub fn next(&self, skip: Option<&Matcher>) -> Option<&'a Grapheme<'a>> {
        self.peek(1, skip)
    }

    /// The cluster `offset` steps away; each step passes over clusters
    /// matching `skip`. `peek(0, _)` is the current cluster.
    pub fn peek(&self, offset: isize, skip: Option<&Matcher>) -> Option<&'a Grapheme<'a>> {
        self.walk(offset, 0, self.seg.len(), skip)
    }

    pub fn prev_in_line(&self, skip: Option<&Matcher>) -> Option<&'a Grapheme<'a>> {
        self.peek_in_line(-1, skip)
    }

    pub fn next_in_line(&self, skip: Option<&Matcher>) -> Option<&'a Grapheme<'a>> {
        self.peek_in_line(1, skip)
    }

    pub fn peek_in_line(&self, offset: isize, skip: Option<&Matcher>) -> Option<&'a Grapheme<'a>> {
        let line = self.line_info();
        self.walk(offset, line.from, line.end(), skip)
    }

    pub fn is_first(&self, skip: Option<&Matcher>) -> bool {
        self.prev(skip).is_none()
    }

    pub fn is_last(&self, skip: Option<&Matcher>) -> bool {
        self.next(skip).is_none()
    }

    pub fn is_first_of_line(&self, skip: Option<&Matcher>) -> bool {
        self.prev_in_line(skip).is_none()
    }

    pub fn is_last_of_line(&self, skip: Option<&Matcher>) -> bool {
        self.next_in_line(skip).is_none()
    }

    fn walk(
        &self,
        offset: isize,
        lo: usize,
        hi: usize,
        skip: Option<&Matcher>,
    ) -> Option<&'a Grapheme<'a>> {
        let forward = offset > 0;
        let mut i = self.index;
        for _ in 0..offset.unsigned_abs() {
            i = self.step(i, forward, lo, hi, skip)?;
        }
        self.seg.graphemes.get(i)
    }

    fn step(
        &self,
        from: usize,
        forward: bool,
        lo: usize,
        hi: usize,
        skip: Option<&Matcher>,
    ) -> Option<usize> {
        let mut i = from;
        loop {
            if forward {
                i += 1;
                if i >= hi {
                    return None;
                }
            } else {
                if i <= lo {
                    return None;
                }
                i -= 1;
            }
            let skipped = skip.map_or(false, |m| m.is_match(self.seg.graphemes[i].text));
            if !skipped {
                return Some(i);
            }
        }
    }
}

/// A per-resolve instance of a rule, owning its state
pub type RuleRun = Box<dyn FnMut(&str, &GraphemeContext<'_>) -> bool>;

type StatelessFn = Rc<dyn Fn(&str, &GraphemeContext<'_>) -> bool>;
type StatefulInit = Rc<dyn Fn() -> RuleRun>;

/// A predicate over clusters, optionally carrying state
///
/// Stateful rules get a fresh state from their initialiser at the start of
/// every resolve; the state then lives across all clusters and passes of
/// that resolve and is dropped afterwards.
#[derive(Clone)]
pub enum GraphemeRule {
    /// Matches every cluster
    Any,
    Stateless(StatelessFn),
    Stateful(StatefulInit),
}

impl GraphemeRule {
    /// A stateless predicate
    pub fn new(f: impl Fn(&str, &GraphemeContext<'_>) -> bool + 'static) -> Self {
        GraphemeRule::Stateless(Rc::new(f))
    }

    /// A predicate with per-resolve state created by `init`
    pub fn with_state<S: 'static>(
        init: impl Fn() -> S + 'static,
        f: impl Fn(&str, &GraphemeContext<'_>, &mut S) -> bool + 'static,
    ) -> Self {
        let f = Rc::new(f);
        GraphemeRule::Stateful(Rc::new(move || {
            let f = Rc::clone(&f);
            let mut state = init();
            let run: RuleRun = Box::new(move |g, ctx| f(g, ctx, &mut state));
            run
        }))
    }

    /// Start a run of this rule with fresh state
    pub fn start(&self) -> RuleRun {
        match self {
            GraphemeRule::Any => Box::new(|_, _| true),
            GraphemeRule::Stateless(f) => {
                let f = Rc::clone(f);
                Box::new(move |g, ctx| f(g, ctx))
            }
            GraphemeRule::Stateful(init) => init(),
        }
    }
}

/// Run grapheme rules over every cluster for `iterations` passes
///
/// Every pass evaluates every rule on every cluster, so state can settle
/// during the earlier passes; only the last pass records matches. Returns
/// one merged range list per rule. Zero iterations run a single pass.
pub fn process_grapheme(
    seg: &Segmentation<'_>,
    rules: &[GraphemeRule],
    iterations: usize,
) -> Vec<Vec<Range>> {
    let passes = iterations.max(1);
    let mut runs: Vec<RuleRun> = rules.iter().map(GraphemeRule::start).collect();
    let mut hits: Vec<Vec<Range>> = vec![Vec::new(); rules.len()];

    for iteration in 0..passes {
        let recording = iteration + 1 == passes;
        trace!("grapheme pass {} of {}", iteration + 1, passes);
        for grapheme in seg.graphemes() {
            let ctx = GraphemeContext::new(seg, grapheme.index, iteration);
            for (rule_idx, run) in runs.iter_mut().enumerate() {
                if run(grapheme.text, &ctx) && recording {
                    hits[rule_idx].push(grapheme.range());
                }
            }
        }
    }

    hits.into_iter().map(merge_ranges).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charclass::{create_matcher, CharMatchers};
    use proptest::prelude::*;

    fn whitespace() -> Matcher {
        create_matcher(Some(&CharMatchers::from("Whitespace"))).unwrap()
    }

    #[test]
    fn test_segment_lines() {
        let seg = segment_text("foo\nbar");
        assert_eq!(seg.len(), 7);
        assert_eq!(seg.lines().len(), 2);
        assert_eq!(
            seg.lines()[0],
            LineInfo {
                index: 0,
                from: 0,
                count: 4,
                include_lb: true
            }
        );
        assert_eq!(
            seg.lines()[1],
            LineInfo {
                index: 1,
                from: 4,
                count: 3,
                include_lb: false
            }
        );
        assert_eq!(seg.graphemes()[5].index_in_line, 1);
        assert_eq!(seg.line_range(1), Range::new(4, 3));
    }

    #[test]
    fn test_crlf_is_one_cluster() {
        let seg = segment_text("a\r\nb\rc");
        let texts: Vec<&str> = seg.graphemes().iter().map(|g| g.text).collect();
        assert_eq!(texts, vec!["a", "\r\n", "b", "\r", "c"]);
        assert_eq!(seg.lines().len(), 3);
        assert_eq!(seg.line_range(0), Range::new(0, 3));
    }

    #[test]
    fn test_trailing_break_adds_no_empty_line() {
        let seg = segment_text("a\n");
        assert_eq!(seg.lines().len(), 1);
        assert!(segment_text("").lines().is_empty());
    }

    #[test]
    fn test_utf16_offsets() {
        // e + combining acute is one cluster of 2 units; the emoji is 2 units
        let seg = segment_text("e\u{301}😀x");
        let ranges: Vec<Range> = seg.graphemes().iter().map(Grapheme::range).collect();
        assert_eq!(ranges, vec![Range::new(0, 2), Range::new(2, 2), Range::new(4, 1)]);
        assert_eq!(seg.utf16_len(), 5);
    }

    #[test]
    fn test_context_fields() {
        let seg = segment_text("ab\ncd");
        let ctx = GraphemeContext::new(&seg, 4, 2);
        assert_eq!(ctx.grapheme(), "d");
        assert_eq!(ctx.line(), 1);
        assert_eq!(ctx.index_in_line(), 1);
        assert_eq!(ctx.line_length(), 2);
        assert_eq!(ctx.total_lines(), 2);
        assert!(!ctx.include_lb());
        assert_eq!(ctx.iteration(), 2);

        let ctx = GraphemeContext::new(&seg, 0, 0);
        assert!(ctx.include_lb());
        assert_eq!(ctx.line_length(), 3);
    }

    #[test]
    fn test_width() {
        let seg = segment_text("a漢");
        assert_eq!(GraphemeContext::new(&seg, 0, 0).width(), 1);
        assert_eq!(GraphemeContext::new(&seg, 1, 0).width(), 2);
    }

    #[test]
    fn test_navigation_with_skip() {
        let seg = segment_text("a  b\nc");
        let ws = whitespace();
        let ctx = GraphemeContext::new(&seg, 0, 0);
        assert_eq!(ctx.next(None).map(|g| g.text), Some(" "));
        assert_eq!(ctx.next(Some(&ws)).map(|g| g.text), Some("b"));
        assert_eq!(ctx.peek(2, Some(&ws)).map(|g| g.text), Some("c"));
        assert!(ctx.is_first(None));

        let b = GraphemeContext::new(&seg, 3, 0);
        assert_eq!(b.prev(Some(&ws)).map(|g| g.index), Some(0));
        assert_eq!(b.next_in_line(None).map(|g| g.text), Some("\n"));
        assert!(b.is_last_of_line(Some(&ws)));
        assert!(!b.is_last(Some(&ws)));
        assert_eq!(b.peek(0, None).map(|g| g.index), Some(3));
    }

    #[test]
    fn test_navigation_in_line() {
        let seg = segment_text("ab\ncd");
        let c = GraphemeContext::new(&seg, 3, 0);
        assert!(c.is_first_of_line(None));
        assert!(!c.is_first(None));
        assert_eq!(c.prev(None).map(|g| g.text), Some("\n"));
        assert_eq!(c.peek_in_line(-1, None), None);
        assert_eq!(c.peek_in_line(1, None).map(|g| g.text), Some("d"));
        assert_eq!(c.peek_in_line(2, None), None);
    }

    #[test]
    fn test_process_stateless() {
        let seg = segment_text("aXbXX");
        let rule = GraphemeRule::new(|g, _| g == "X");
        let ranges = process_grapheme(&seg, &[rule, GraphemeRule::Any], 1);
        assert_eq!(ranges[0], vec![Range::new(1, 1), Range::new(3, 2)]);
        assert_eq!(ranges[1], vec![Range::new(0, 5)]);
    }

    #[test]
    fn test_process_records_last_pass_only() {
        // Counts clusters across passes; on the last pass, only clusters
        // seen after the first pass's total pass the threshold.
        let seg = segment_text("abc");
        let rule = GraphemeRule::with_state(|| 0usize, |_, _, seen| {
            *seen += 1;
            *seen > 3
        });
        let ranges = process_grapheme(&seg, &[rule.clone()], 2);
        assert_eq!(ranges[0], vec![Range::new(0, 3)]);

        let ranges = process_grapheme(&seg, &[rule], 1);
        assert!(ranges[0].is_empty());
    }

    #[test]
    fn test_state_is_fresh_per_run() {
        let seg = segment_text("xx");
        let rule = GraphemeRule::with_state(|| false, |_, _, toggled| {
            *toggled = !*toggled;
            *toggled
        });
        let first = process_grapheme(&seg, &[rule.clone()], 1);
        let second = process_grapheme(&seg, &[rule], 1);
        assert_eq!(first, second);
        assert_eq!(first[0], vec![Range::new(0, 1)]);
    }

    #[test]
    fn test_zero_iterations_runs_once() {
        let seg = segment_text("ab");
        let ranges = process_grapheme(&seg, &[GraphemeRule::Any], 0);
        assert_eq!(ranges[0], vec![Range::new(0, 2)]);
    }

    proptest! {
        #[test]
        fn navigation_is_symmetric(text in "[ab \n]{1,12}", pick in 0usize..12) {
            let seg = segment_text(&text);
            let ws = whitespace();
            let index = pick % seg.len();
            let ctx = GraphemeContext::new(&seg, index, 0);
            for skip in [None, Some(&ws)] {
                prop_assert_eq!(ctx.peek(1, skip), ctx.next(skip));
                prop_assert_eq!(ctx.peek(-1, skip), ctx.prev(skip));
                prop_assert_eq!(ctx.is_first(skip), ctx.prev(skip).is_none());
                prop_assert_eq!(ctx.is_last(skip), ctx.next(skip).is_none());
                prop_assert_eq!(ctx.peek_in_line(1, skip), ctx.next_in_line(skip));
                prop_assert_eq!(ctx.is_first_of_line(skip), ctx.prev_in_line(skip).is_none());
            }
        }
    }
}
