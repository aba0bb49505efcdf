//! Grapheme-predicate rules

use log::debug;

use super::{rule_methods, styled_from_rules, RuleSet, StyleBuilder};
use crate::error::Result;
use crate::grapheme::{process_grapheme, segment_text, GraphemeContext, GraphemeRule};
use crate::range::StyledRange;
use crate::style::{Layout, Style};

/// Styles clusters for which a predicate over the cluster and its context holds
#[derive(Clone)]
pub struct GraphemeBuilder {
    rules: RuleSet<GraphemeRule>,
    iterations: usize,
}

impl Default for GraphemeBuilder {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            iterations: 1,
        }
    }
}

impl GraphemeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    rule_methods!(GraphemeRule);

    /// Add a stateless predicate rule
    pub fn when(
        self,
        f: impl Fn(&str, &GraphemeContext<'_>) -> bool + 'static,
        style: Style,
    ) -> Self {
        self.rule(GraphemeRule::new(f), style)
    }

    /// Number of passes over the text; only the last one records matches
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }
}

impl StyleBuilder for GraphemeBuilder {
    fn resolve(&self, text: &str) -> Result<Vec<StyledRange>> {
        let seg = segment_text(text);
        let rules: Vec<GraphemeRule> = self
            .rules
            .entries()
            .iter()
            .map(|(r, _)| r.clone())
            .collect();
        let hits = process_grapheme(&seg, &rules, self.iterations);
        let per_rule = hits
            .into_iter()
            .zip(self.rules.entries().iter().map(|(_, style)| style));
        let ranges = styled_from_rules(per_rule);
        debug!(
            "grapheme: {} rules, {} passes -> {} ranges",
            self.rules.len(),
            self.iterations.max(1),
            ranges.len()
        );
        Ok(ranges)
    }

    fn layout_options(&self) -> &Layout {
        self.rules.layout()
    }
}
