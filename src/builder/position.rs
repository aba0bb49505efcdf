//! Position rules
//!
//! Rules select clusters by index, either over the whole text or counted
//! from the start of each line. Clusters matching the `skip_when` matcher
//! are left out before indices are assigned, and are never styled.

use std::fmt;
use std::rc::Rc;

use log::debug;

use super::{rule_methods, styled_from_rules, DefaultRule, RangeRule, RuleSet, StyleBuilder};
use crate::charclass::{create_matcher, CharMatchers};
use crate::error::Result;
use crate::grapheme::{segment_text, Segmentation};
use crate::range::{Range, StyledRange};
use crate::style::Layout;

/// What a cluster index counts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionMode {
    /// Index among all clusters of the text
    #[default]
    Global,
    /// Index within the cluster's line
    Line,
}

/// Selects clusters by (post-skip) index
#[derive(Clone)]
pub enum PositionRule {
    /// Index, range or index predicate
    Select(RangeRule),
    /// `f(index, line)`
    Predicate(Rc<dyn Fn(usize, usize) -> bool>),
    Many(Vec<PositionRule>),
}

impl PositionRule {
    /// Select clusters for which `f(index, line)` holds
    pub fn when(f: impl Fn(usize, usize) -> bool + 'static) -> Self {
        PositionRule::Predicate(Rc::new(f))
    }
}

impl DefaultRule for PositionRule {
    const DEFAULT: Self = PositionRule::Select(RangeRule::All);
}

impl fmt::Debug for PositionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionRule::Select(rule) => fmt::Debug::fmt(rule, f),
            PositionRule::Predicate(_) => write!(f, "Predicate(..)"),
            PositionRule::Many(rules) => f.debug_list().entries(rules).finish(),
        }
    }
}

impl From<RangeRule> for PositionRule {
    fn from(rule: RangeRule) -> Self {
        PositionRule::Select(rule)
    }
}

impl From<usize> for PositionRule {
    fn from(index: usize) -> Self {
        PositionRule::Select(RangeRule::Index(index))
    }
}

impl From<Range> for PositionRule {
    fn from(range: Range) -> Self {
        PositionRule::Select(RangeRule::Range(range))
    }
}

impl From<std::ops::Range<usize>> for PositionRule {
    fn from(range: std::ops::Range<usize>) -> Self {
        PositionRule::Select(range.into())
    }
}

impl From<Vec<PositionRule>> for PositionRule {
    fn from(rules: Vec<PositionRule>) -> Self {
        PositionRule::Many(rules)
    }
}

/// Styles clusters by position
#[derive(Clone, Default)]
pub struct PositionBuilder {
    mode: PositionMode,
    skip_when: Option<CharMatchers>,
    rules: RuleSet<PositionRule>,
}

impl PositionBuilder {
    /// A builder counting over the whole text
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder counting within each line
    pub fn per_line() -> Self {
        Self {
            mode: PositionMode::Line,
            ..Self::default()
        }
    }

    /// Leave clusters matching `matchers` out of index counting
    pub fn skip_when(mut self, matchers: impl Into<CharMatchers>) -> Self {
        self.skip_when = Some(matchers.into());
        self
    }

    pub fn mode(&self) -> PositionMode {
        self.mode
    }

    rule_methods!(PositionRule);

    fn collect(rule: &PositionRule, seg: &Segmentation<'_>, units: &[usize], out: &mut Vec<Range>) {
        let graphemes = seg.graphemes();
        match rule {
            PositionRule::Select(select) => {
                for span in select.select(units.len()) {
                    out.extend(
                        units[span.from..span.end()]
                            .iter()
                            .map(|&i| graphemes[i].range()),
                    );
                }
            }
            PositionRule::Predicate(f) => {
                for (logical, &i) in units.iter().enumerate() {
                    if f(logical, graphemes[i].line) {
                        out.push(graphemes[i].range());
                    }
                }
            }
            PositionRule::Many(rules) => {
                for rule in rules {
                    Self::collect(rule, seg, units, out);
                }
            }
        }
    }
}

impl StyleBuilder for PositionBuilder {
    fn resolve(&self, text: &str) -> Result<Vec<StyledRange>> {
        let seg = segment_text(text);
        let skip = create_matcher(self.skip_when.as_ref())?;
        let counted = |from: usize, to: usize| -> Vec<usize> {
            (from..to)
                .filter(|&i| !skip.is_match(seg.graphemes()[i].text))
                .collect()
        };

        // Physical cluster indices for each counting scope
        let scopes: Vec<Vec<usize>> = match self.mode {
            PositionMode::Global => vec![counted(0, seg.len())],
            PositionMode::Line => seg
                .lines()
                .iter()
                .map(|line| counted(line.from, line.end()))
                .collect(),
        };

        let per_rule = self.rules.entries().iter().map(|(rule, style)| {
            let mut ranges = Vec::new();
            for units in &scopes {
                Self::collect(rule, &seg, units, &mut ranges);
            }
            (ranges, style)
        });
        let ranges = styled_from_rules(per_rule);
        debug!(
            "position {:?}: {} rules -> {} ranges",
            self.mode,
            self.rules.len(),
            ranges.len()
        );
        Ok(ranges)
    }

    fn layout_options(&self) -> &Layout {
        self.rules.layout()
    }
}
