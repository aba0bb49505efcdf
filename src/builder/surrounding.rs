//! Delimiter-pair rules
//!
//! Finds `open ... close` pairs and styles the whole pair, its content, or
//! its delimiters. Pairs are found either by a flat leftmost scan or with
//! a stack that pairs nested delimiters and records their depth.

use std::fmt;
use std::rc::Rc;

use log::debug;

use super::{rule_methods, styled_from_rules, RangeRule, RuleSet, StyleBuilder};
use crate::error::{Result, StyleError};
use crate::offset::Utf16Offsets;
use crate::range::{Range, StyledRange};
use crate::style::Layout;

/// Which part of a pair a rule styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Both delimiters and the content between them
    #[default]
    All,
    /// Between the delimiters
    Content,
    /// Both delimiters, as two ranges
    Delimiter,
    Open,
    Close,
}

/// How pairs are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nesting {
    /// First `open`, then the first `close` after it; no recursion
    #[default]
    None,
    /// Stack-based pairing of nested delimiters
    Balanced,
}

/// Which nesting depths to keep
#[derive(Clone, Default)]
pub enum Depth {
    #[default]
    Any,
    Exact(usize),
    Predicate(Rc<dyn Fn(usize) -> bool>),
}

impl Depth {
    /// Keep pairs whose depth satisfies `f`
    pub fn when(f: impl Fn(usize) -> bool + 'static) -> Self {
        Depth::Predicate(Rc::new(f))
    }

    pub fn accepts(&self, depth: usize) -> bool {
        match self {
            Depth::Any => true,
            Depth::Exact(d) => *d == depth,
            Depth::Predicate(f) => f(depth),
        }
    }
}

impl From<usize> for Depth {
    fn from(depth: usize) -> Self {
        Depth::Exact(depth)
    }
}

impl fmt::Debug for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::Any => write!(f, "Any"),
            Depth::Exact(d) => write!(f, "Exact({})", d),
            Depth::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// One delimiter pair found in a text, in UTF-16 offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterMatch {
    pub open: Range,
    pub close: Range,
    /// Number of pairs open around this one
    pub depth: usize,
}

impl DelimiterMatch {
    /// Ranges covered by `target`; empty ranges are dropped
    pub fn target_ranges(&self, target: Target) -> Vec<Range> {
        let ranges = match target {
            Target::All => vec![Range::new(
                self.open.from,
                self.close.end().saturating_sub(self.open.from),
            )],
            Target::Content => vec![Range::new(
                self.open.end(),
                self.close.from.saturating_sub(self.open.end()),
            )],
            Target::Delimiter => vec![self.open, self.close],
            Target::Open => vec![self.open],
            Target::Close => vec![self.close],
        };
        ranges.into_iter().filter(|r| !r.is_empty()).collect()
    }
}

/// Styles text enclosed by a delimiter pair
#[derive(Clone)]
pub struct SurroundingBuilder {
    open: String,
    close: String,
    target: Target,
    nesting: Nesting,
    depth: Depth,
    rules: RuleSet<RangeRule>,
}

impl SurroundingBuilder {
    /// A builder for `open ... close` pairs; both must be non-empty
    pub fn new(open: &str, close: &str) -> Result<Self> {
        if open.is_empty() || close.is_empty() {
            return Err(StyleError::EmptyDelimiter);
        }
        Ok(Self {
            open: open.to_string(),
            close: close.to_string(),
            target: Target::default(),
            nesting: Nesting::default(),
            depth: Depth::default(),
            rules: RuleSet::default(),
        })
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn nesting(mut self, nesting: Nesting) -> Self {
        self.nesting = nesting;
        self
    }

    pub fn depth(mut self, depth: impl Into<Depth>) -> Self {
        self.depth = depth.into();
        self
    }

    rule_methods!(RangeRule);

    /// Pairs in `text` that pass the depth filter, ordered by `open`
    pub fn find_matches(&self, text: &str) -> Vec<DelimiterMatch> {
        let pairs = match self.nesting {
            Nesting::None => self.scan_flat(text),
            Nesting::Balanced => self.scan_balanced(text),
        };

        let offsets = Utf16Offsets::new(text);
        let to_range = |(start, end): (usize, usize)| {
            let from = offsets.to_utf16(start);
            Range::new(from, offsets.to_utf16(end) - from)
        };
        let mut matches: Vec<DelimiterMatch> = pairs
            .into_iter()
            .filter(|pair| self.depth.accepts(pair.depth))
            .map(|pair| DelimiterMatch {
                open: to_range(pair.open),
                close: to_range(pair.close),
                depth: pair.depth,
            })
            .collect();
        matches.sort_by_key(|m| m.open.from);
        matches
    }

    fn scan_flat(&self, text: &str) -> Vec<BytePair> {
        let mut pairs = Vec::new();
        let mut pos = 0;
        while let Some(found) = text[pos..].find(&self.open) {
            let open_start = pos + found;
            let open_end = open_start + self.open.len();
            let Some(found) = text[open_end..].find(&self.close) else {
                break;
            };
            let close_start = open_end + found;
            let close_end = close_start + self.close.len();
            pairs.push(BytePair {
                open: (open_start, open_end),
                close: (close_start, close_end),
                depth: 0,
            });
            pos = close_end;
        }
        pairs
    }

    fn scan_balanced(&self, text: &str) -> Vec<BytePair> {
        let mut pairs = Vec::new();
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            if !stack.is_empty() && rest.starts_with(&self.close) {
                if let Some(open) = stack.pop() {
                    pairs.push(BytePair {
                        open,
                        close: (pos, pos + self.close.len()),
                        depth: stack.len(),
                    });
                }
                pos += self.close.len();
            } else if rest.starts_with(&self.open) {
                stack.push((pos, pos + self.open.len()));
                pos += self.open.len();
            } else {
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
        pairs
    }
}

/// A pair in byte offsets
struct BytePair {
    open: (usize, usize),
    close: (usize, usize),
    depth: usize,
}

impl StyleBuilder for SurroundingBuilder {
    fn resolve(&self, text: &str) -> Result<Vec<StyledRange>> {
        let matches = self.find_matches(text);
        let per_rule = self.rules.entries().iter().map(|(rule, style)| {
            let ranges: Vec<Range> = rule
                .select(matches.len())
                .into_iter()
                .flat_map(|span| matches[span.from..span.end()].iter())
                .flat_map(|m| m.target_ranges(self.target))
                .collect();
            (ranges, style)
        });
        let ranges = styled_from_rules(per_rule);
        debug!(
            "surrounding {:?}..{:?} ({:?}, {:?}): {} pairs, {} rules -> {} ranges",
            self.open,
            self.close,
            self.nesting,
            self.target,
            matches.len(),
            self.rules.len(),
            ranges.len()
        );
        Ok(ranges)
    }

    fn layout_options(&self) -> &Layout {
        self.rules.layout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;

    fn bold() -> Style {
        Style::new().with_bold()
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        assert!(matches!(
            SurroundingBuilder::new("", ")"),
            Err(StyleError::EmptyDelimiter)
        ));
        assert!(matches!(
            SurroundingBuilder::new("(", ""),
            Err(StyleError::EmptyDelimiter)
        ));
    }

    #[test]
    fn test_balanced_content_depth_zero() {
        let builder = SurroundingBuilder::new("(", ")")
            .unwrap()
            .nesting(Nesting::Balanced)
            .depth(0usize)
            .target(Target::Content)
            .style(bold());
        let ranges = builder.resolve("(a(b)c)").unwrap();
        assert_eq!(ranges, vec![StyledRange::new(1, 5, bold())]);
    }

    #[test]
    fn test_balanced_depths() {
        let builder = SurroundingBuilder::new("(", ")")
            .unwrap()
            .nesting(Nesting::Balanced);
        let matches = builder.find_matches("(a(b)c)");
        assert_eq!(
            matches,
            vec![
                DelimiterMatch {
                    open: Range::new(0, 1),
                    close: Range::new(6, 1),
                    depth: 0
                },
                DelimiterMatch {
                    open: Range::new(2, 1),
                    close: Range::new(4, 1),
                    depth: 1
                },
            ]
        );
    }

    #[test]
    fn test_flat_scan_does_not_nest() {
        let builder = SurroundingBuilder::new("(", ")").unwrap();
        let matches = builder.find_matches("(a(b)c) (d");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].open, Range::new(0, 1));
        assert_eq!(matches[0].close, Range::new(4, 1));
    }

    #[test]
    fn test_targets() {
        let m = DelimiterMatch {
            open: Range::new(0, 2),
            close: Range::new(5, 2),
            depth: 0,
        };
        assert_eq!(m.target_ranges(Target::All), vec![Range::new(0, 7)]);
        assert_eq!(m.target_ranges(Target::Content), vec![Range::new(2, 3)]);
        assert_eq!(
            m.target_ranges(Target::Delimiter),
            vec![Range::new(0, 2), Range::new(5, 2)]
        );
        assert_eq!(m.target_ranges(Target::Open), vec![Range::new(0, 2)]);
        assert_eq!(m.target_ranges(Target::Close), vec![Range::new(5, 2)]);

        let empty = DelimiterMatch {
            open: Range::new(0, 1),
            close: Range::new(1, 1),
            depth: 0,
        };
        assert!(empty.target_ranges(Target::Content).is_empty());
    }

    #[test]
    fn test_multichar_delimiters_and_rule_index() {
        let builder = SurroundingBuilder::new("<<", ">>")
            .unwrap()
            .target(Target::Delimiter)
            .rule(1usize, bold());
        let ranges = builder.resolve("<<a>> <<b>>").unwrap();
        assert_eq!(
            ranges,
            vec![StyledRange::new(6, 2, bold()), StyledRange::new(9, 2, bold())]
        );
    }

    #[test]
    fn test_same_open_and_close() {
        let builder = SurroundingBuilder::new("\"", "\"")
            .unwrap()
            .nesting(Nesting::Balanced)
            .target(Target::Content)
            .style(bold());
        let ranges = builder.resolve(r#"say "hi" and "bye""#).unwrap();
        assert_eq!(
            ranges,
            vec![StyledRange::new(5, 2, bold()), StyledRange::new(14, 3, bold())]
        );
    }

    #[test]
    fn test_depth_predicate_and_utf16() {
        let builder = SurroundingBuilder::new("「", "」")
            .unwrap()
            .nesting(Nesting::Balanced)
            .depth(Depth::when(|d| d > 0))
            .style(bold());
        // "😀" takes two UTF-16 units
        let ranges = builder.resolve("😀「a「b」」").unwrap();
        assert_eq!(ranges, vec![StyledRange::new(4, 3, bold())]);
    }

    #[test]
    fn test_unterminated_open() {
        let builder = SurroundingBuilder::new("(", ")")
            .unwrap()
            .nesting(Nesting::Balanced)
            .style(bold());
        assert!(builder.resolve("(a(b").unwrap().is_empty());
        assert!(builder.resolve("no pairs").unwrap().is_empty());
    }
}
