//! Rule builders
//!
//! Each builder accumulates `(rule, style)` pairs for one rule family and
//! resolves them against a text into normalized styled ranges. Rules are
//! kept in declaration order, which is also their priority: where two
//! rules of the same builder overlap, the later one wins per field.

mod charclass;
mod grapheme;
mod line;
mod position;
mod surrounding;

pub use charclass::{CharClassBuilder, ClassMode, ClassRun};
pub use grapheme::GraphemeBuilder;
pub use line::LineBuilder;
pub use position::{PositionBuilder, PositionMode, PositionRule};
pub use surrounding::{DelimiterMatch, Depth, Nesting, SurroundingBuilder, Target};

use std::fmt;
use std::rc::Rc;

use crate::apply::{apply_layout, apply_ranges, StyleSink};
use crate::charclass::CharMatchers;
use crate::error::Result;
use crate::grapheme::GraphemeRule;
use crate::range::{merge_ranges, Range, StyledRange};
use crate::style::{Layout, Style};

/// Anything that turns a text into styled ranges
pub trait StyleBuilder {
    /// Resolve the accumulated rules against `text`
    ///
    /// The result is sorted, non-overlapping and has no empty ranges.
    fn resolve(&self, text: &str) -> Result<Vec<StyledRange>>;

    /// Paragraph layout options, applied once regardless of ranges
    fn layout_options(&self) -> &Layout;

    /// Apply layout, then every resolved range, to a host
    fn apply(&self, text: &str, sink: &mut dyn StyleSink) -> Result<()> {
        apply_layout(self.layout_options(), sink)?;
        apply_ranges(&self.resolve(text)?, sink)
    }
}

/// The rule a style-only call stands for
pub trait DefaultRule {
    const DEFAULT: Self;
}

impl DefaultRule for CharMatchers {
    const DEFAULT: Self = CharMatchers::ANY;
}

impl DefaultRule for RangeRule {
    const DEFAULT: Self = RangeRule::All;
}

impl DefaultRule for GraphemeRule {
    const DEFAULT: Self = GraphemeRule::Any;
}

/// Rules and layout accumulated by a builder
#[derive(Clone)]
pub struct RuleSet<R> {
    entries: Vec<(R, Style)>,
    layout: Layout,
}

impl<R> Default for RuleSet<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            layout: Layout::default(),
        }
    }
}

impl<R: DefaultRule> RuleSet<R> {
    pub fn push(&mut self, rule: R, style: Style) {
        self.entries.push((rule, style));
    }

    pub fn push_default(&mut self, style: Style) {
        self.entries.push((R::DEFAULT, style));
    }
}

impl<R> RuleSet<R> {
    pub fn add_layout(&mut self, layout: &Layout) {
        self.layout.extend(layout);
    }

    pub fn entries(&self) -> &[(R, Style)] {
        &self.entries
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `rule`, `style` and `layout` for a builder with a `rules: RuleSet<R>` field
macro_rules! rule_methods {
    ($rule:ty) => {
        /// Add a rule and the style to apply where it matches
        pub fn rule(mut self, rule: impl Into<$rule>, style: $crate::style::Style) -> Self {
            self.rules.push(rule.into(), style);
            self
        }

        /// Add a style over this builder's default rule
        pub fn style(mut self, style: $crate::style::Style) -> Self {
            self.rules.push_default(style);
            self
        }

        /// Add paragraph layout options
        pub fn layout(mut self, layout: $crate::style::Layout) -> Self {
            self.rules.add_layout(&layout);
            self
        }

        /// Number of rules added so far
        pub fn rule_count(&self) -> usize {
            self.rules.len()
        }
    };
}
pub(crate) use rule_methods;

/// Selects items (lines, delimiter matches) by index
#[derive(Clone)]
pub enum RangeRule {
    /// Every item
    All,
    Index(usize),
    /// `count` items starting at `from`
    Range(Range),
    Predicate(Rc<dyn Fn(usize) -> bool>),
    Many(Vec<RangeRule>),
}

impl RangeRule {
    /// Select items for which `f(index)` holds
    pub fn when(f: impl Fn(usize) -> bool + 'static) -> Self {
        RangeRule::Predicate(Rc::new(f))
    }

    /// Index ranges selected out of `total` items, merged
    pub fn select(&self, total: usize) -> Vec<Range> {
        let mut out = Vec::new();
        self.collect(total, &mut out);
        merge_ranges(out)
    }

    fn collect(&self, total: usize, out: &mut Vec<Range>) {
        match self {
            RangeRule::All => out.push(Range::new(0, total)),
            RangeRule::Index(i) => {
                if *i < total {
                    out.push(Range::new(*i, 1));
                }
            }
            RangeRule::Range(r) => {
                if r.from < total {
                    out.push(Range::new(r.from, r.count.min(total - r.from)));
                }
            }
            RangeRule::Predicate(f) => {
                out.extend((0..total).filter(|&i| f(i)).map(|i| Range::new(i, 1)));
            }
            RangeRule::Many(rules) => {
                for rule in rules {
                    rule.collect(total, out);
                }
            }
        }
    }
}

impl fmt::Debug for RangeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRule::All => write!(f, "All"),
            RangeRule::Index(i) => write!(f, "Index({})", i),
            RangeRule::Range(r) => write!(f, "Range({}+{})", r.from, r.count),
            RangeRule::Predicate(_) => write!(f, "Predicate(..)"),
            RangeRule::Many(rules) => f.debug_list().entries(rules).finish(),
        }
    }
}

impl From<usize> for RangeRule {
    fn from(index: usize) -> Self {
        RangeRule::Index(index)
    }
}

impl From<Range> for RangeRule {
    fn from(range: Range) -> Self {
        RangeRule::Range(range)
    }
}

impl From<std::ops::Range<usize>> for RangeRule {
    fn from(range: std::ops::Range<usize>) -> Self {
        RangeRule::Range(Range::new(range.start, range.end.saturating_sub(range.start)))
    }
}

impl From<Vec<RangeRule>> for RangeRule {
    fn from(rules: Vec<RangeRule>) -> Self {
        RangeRule::Many(rules)
    }
}

impl From<Vec<usize>> for RangeRule {
    fn from(indices: Vec<usize>) -> Self {
        RangeRule::Many(indices.into_iter().map(RangeRule::Index).collect())
    }
}

/// Turn per-rule range lists into one normalized styled list
pub(crate) fn styled_from_rules<'s>(
    per_rule: impl IntoIterator<Item = (Vec<Range>, &'s Style)>,
) -> Vec<StyledRange> {
    let styled: Vec<StyledRange> = per_rule
        .into_iter()
        .flat_map(|(ranges, style)| {
            merge_ranges(ranges)
                .into_iter()
                .map(move |r| StyledRange::from_range(r, style.clone()))
        })
        .collect();
    crate::range::normalize_ranges(&styled)
}
