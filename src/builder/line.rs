//! Line rules

use log::debug;

use super::{rule_methods, styled_from_rules, RangeRule, RuleSet, StyleBuilder};
use crate::error::Result;
use crate::grapheme::segment_text;
use crate::range::{Range, StyledRange};
use crate::style::Layout;

/// Styles whole lines, selected by line index
#[derive(Clone, Default)]
pub struct LineBuilder {
    rules: RuleSet<RangeRule>,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    rule_methods!(RangeRule);
}

impl StyleBuilder for LineBuilder {
    fn resolve(&self, text: &str) -> Result<Vec<StyledRange>> {
        let seg = segment_text(text);
        let lines = seg.lines();

        let per_rule = self.rules.entries().iter().map(|(rule, style)| {
            let ranges: Vec<Range> = rule
                .select(lines.len())
                .into_iter()
                .map(|span| {
                    let from = lines[span.from].from;
                    let to = lines[span.end() - 1].end();
                    seg.cluster_range(from, to - from)
                })
                .collect();
            (ranges, style)
        });
        let ranges = styled_from_rules(per_rule);
        debug!("line: {} rules -> {} ranges", self.rules.len(), ranges.len());
        Ok(ranges)
    }

    fn layout_options(&self) -> &Layout {
        self.rules.layout()
    }
}
