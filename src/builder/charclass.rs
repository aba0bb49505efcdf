//! Character-class rules
//!
//! In overlay mode every rule is matched over the whole text on its own and
//! overlaps are resolved by declaration order. In exclusive mode the text
//! is partitioned once: at each position the first rule (in declaration
//! order) matching there claims the run.

use log::debug;

use super::{rule_methods, styled_from_rules, RuleSet, StyleBuilder};
use crate::charclass::{create_matcher, CharMatchers, Matcher};
use crate::error::Result;
use crate::offset::Utf16Offsets;
use crate::range::{normalize_ranges, Range, StyledRange};
use crate::style::Layout;

/// How character-class rules interact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassMode {
    #[default]
    Overlay,
    Exclusive,
}

/// A run of the exclusive partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRun {
    pub from: usize,
    pub count: usize,
    /// Index of the winning rule; `None` where no rule matched
    pub rule: Option<usize>,
}

/// Styles text by character class
#[derive(Clone, Default)]
pub struct CharClassBuilder {
    mode: ClassMode,
    rules: RuleSet<CharMatchers>,
}

impl CharClassBuilder {
    /// An overlay-mode builder
    pub fn new() -> Self {
        Self::default()
    }

    /// An exclusive-mode builder
    pub fn exclusive() -> Self {
        Self::with_mode(ClassMode::Exclusive)
    }

    pub fn with_mode(mode: ClassMode) -> Self {
        Self {
            mode,
            rules: RuleSet::default(),
        }
    }

    pub fn mode(&self) -> ClassMode {
        self.mode
    }

    rule_methods!(CharMatchers);

    fn matchers(&self) -> Result<Vec<Matcher>> {
        self.rules
            .entries()
            .iter()
            .map(|(rule, _)| create_matcher(Some(rule)))
            .collect()
    }

    /// Partition `text` into runs claimed by the first matching rule
    ///
    /// The runs tile the whole text; stretches no rule matches are
    /// returned with `rule: None`.
    pub fn partition(&self, text: &str) -> Result<Vec<ClassRun>> {
        let matchers = self.matchers()?;
        let offsets = Utf16Offsets::new(text);
        let mut runs: Vec<ClassRun> = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let (end, rule) = match first_match(&matchers, text, pos) {
                Some((rule, len)) => (pos + len, Some(rule)),
                None => {
                    let mut end = next_char(text, pos);
                    while end < text.len() && first_match(&matchers, text, end).is_none() {
                        end = next_char(text, end);
                    }
                    (end, None)
                }
            };
            let from = offsets.to_utf16(pos);
            push_run(
                &mut runs,
                ClassRun {
                    from,
                    count: offsets.to_utf16(end) - from,
                    rule,
                },
            );
            pos = end;
        }

        Ok(runs)
    }

    fn resolve_overlay(&self, text: &str) -> Result<Vec<StyledRange>> {
        let offsets = Utf16Offsets::new(text);
        let matchers = self.matchers()?;
        let per_rule = matchers.iter().zip(self.rules.entries()).map(|(m, (_, style))| {
            let ranges = m
                .find_all(text)
                .into_iter()
                .map(|(start, end)| {
                    let from = offsets.to_utf16(start);
                    Range::new(from, offsets.to_utf16(end) - from)
                })
                .collect();
            (ranges, style)
        });
        Ok(styled_from_rules(per_rule))
    }

    fn resolve_exclusive(&self, text: &str) -> Result<Vec<StyledRange>> {
        let entries = self.rules.entries();
        let styled: Vec<StyledRange> = self
            .partition(text)?
            .into_iter()
            .filter_map(|run| {
                let (_, style) = &entries[run.rule?];
                Some(StyledRange::new(run.from, run.count, style.clone()))
            })
            .collect();
        Ok(normalize_ranges(&styled))
    }
}

impl StyleBuilder for CharClassBuilder {
    fn resolve(&self, text: &str) -> Result<Vec<StyledRange>> {
        let ranges = match self.mode {
            ClassMode::Overlay => self.resolve_overlay(text)?,
            ClassMode::Exclusive => self.resolve_exclusive(text)?,
        };
        debug!(
            "charclass {:?}: {} rules -> {} ranges",
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

/// First rule (by declaration order) with a non-empty match at `pos`
fn first_match(matchers: &[Matcher], text: &str, pos: usize) -> Option<(usize, usize)> {
    matchers
        .iter()
        .enumerate()
        .find_map(|(i, m)| m.match_len_at(text, pos).map(|len| (i, len)))
}

fn next_char(text: &str, pos: usize) -> usize {
    pos + text[pos..].chars().next().map_or(1, char::len_utf8)
}

fn push_run(runs: &mut Vec<ClassRun>, run: ClassRun) {
    if let Some(prev) = runs.last_mut() {
        if prev.rule == run.rule && prev.from + prev.count == run.from {
            prev.count += run.count;
            return;
        }
    }
    runs.push(run);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charclass::CharClass;
    use crate::style::Style;
    use proptest::prelude::*;
    use regex::Regex;

    fn size(n: f64) -> Style {
        Style::new().with_font_size(n)
    }

    #[test]
    fn test_overlay_scenario() {
        let builder = CharClassBuilder::new()
            .rule("Latin", size(10.0))
            .rule("Number", size(20.0));
        let ranges = builder.resolve("ab12").unwrap();
        assert_eq!(
            ranges,
            vec![
                StyledRange::new(0, 2, size(10.0)),
                StyledRange::new(2, 2, size(20.0)),
            ]
        );
    }

    #[test]
    fn test_overlay_later_rule_wins() {
        let vowels = CharClass::new("Vowel", "[aeiou]").unwrap();
        let builder = CharClassBuilder::new()
            .rule("Latin", size(10.0))
            .rule(vowels, size(30.0));
        let ranges = builder.resolve("bab").unwrap();
        assert_eq!(
            ranges,
            vec![
                StyledRange::new(0, 1, size(10.0)),
                StyledRange::new(1, 1, size(30.0)),
                StyledRange::new(2, 1, size(10.0)),
            ]
        );
    }

    #[test]
    fn test_exclusive_scenario() {
        let builder = CharClassBuilder::exclusive()
            .rule("Latin", size(1.0))
            .rule("Number", size(2.0));
        let runs = builder.partition("a1!").unwrap();
        assert_eq!(
            runs,
            vec![
                ClassRun {
                    from: 0,
                    count: 1,
                    rule: Some(0),
                },
                ClassRun {
                    from: 1,
                    count: 1,
                    rule: Some(1),
                },
                ClassRun {
                    from: 2,
                    count: 1,
                    rule: None,
                },
            ]
        );
        let ranges = builder.resolve("a1!").unwrap();
        assert_eq!(
            ranges,
            vec![
                StyledRange::new(0, 1, size(1.0)),
                StyledRange::new(1, 1, size(2.0)),
            ]
        );
    }

    #[test]
    fn test_exclusive_first_declared_wins() {
        let builder = CharClassBuilder::exclusive()
            .rule("Letter", size(1.0))
            .rule("Latin", size(2.0));
        let runs = builder.partition("ab").unwrap();
        assert_eq!(
            runs,
            vec![ClassRun {
                from: 0,
                count: 2,
                rule: Some(0),
            }]
        );
    }

    #[test]
    fn test_exclusive_multi_char_pattern() {
        let builder = CharClassBuilder::exclusive()
            .rule(Regex::new("ab").unwrap(), size(1.0))
            .rule("Latin", size(2.0));
        let runs = builder.partition("xaby").unwrap();
        assert_eq!(
            runs,
            vec![
                ClassRun {
                    from: 0,
                    count: 1,
                    rule: Some(1),
                },
                ClassRun {
                    from: 1,
                    count: 2,
                    rule: Some(0),
                },
                ClassRun {
                    from: 3,
                    count: 1,
                    rule: Some(1),
                },
            ]
        );
    }

    #[test]
    fn test_exclusive_assertions_use_full_text() {
        let builder = CharClassBuilder::exclusive().rule(Regex::new("^a").unwrap(), size(1.0));
        assert_eq!(
            builder.partition("aaa").unwrap(),
            vec![
                ClassRun {
                    from: 0,
                    count: 1,
                    rule: Some(0),
                },
                ClassRun {
                    from: 1,
                    count: 2,
                    rule: None,
                },
            ]
        );
        let overlay = CharClassBuilder::new().rule(Regex::new("^a").unwrap(), size(1.0));
        assert_eq!(
            overlay.resolve("aaa").unwrap(),
            builder.resolve("aaa").unwrap()
        );

        let builder = CharClassBuilder::exclusive().rule(Regex::new(r"\bab").unwrap(), size(1.0));
        assert_eq!(
            builder.partition("xab").unwrap(),
            vec![ClassRun {
                from: 0,
                count: 3,
                rule: None,
            }]
        );
        assert_eq!(
            builder.partition("x ab").unwrap(),
            vec![
                ClassRun {
                    from: 0,
                    count: 2,
                    rule: None,
                },
                ClassRun {
                    from: 2,
                    count: 2,
                    rule: Some(0),
                },
            ]
        );
    }

    #[test]
    fn test_exclusive_utf16_offsets() {
        let builder = CharClassBuilder::exclusive().rule("Han", size(1.0));
        let runs = builder.partition("😀漢").unwrap();
        assert_eq!(
            runs,
            vec![
                ClassRun {
                    from: 0,
                    count: 2,
                    rule: None,
                },
                ClassRun {
                    from: 2,
                    count: 1,
                    rule: Some(0),
                },
            ]
        );
    }

    #[test]
    fn test_style_only_matches_everything() {
        let builder = CharClassBuilder::new().style(size(3.0));
        let ranges = builder.resolve("a b\n").unwrap();
        assert_eq!(ranges, vec![StyledRange::new(0, 4, size(3.0))]);
    }

    #[test]
    fn test_unknown_class_fails() {
        let builder = CharClassBuilder::new().rule("Elvish", size(1.0));
        assert!(builder.resolve("abc").is_err());
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let builder = CharClassBuilder::new()
            .rule(["Han", "Hiragana"], size(12.0))
            .rule("Yakumono", size(8.0));
        let text = "日本語のテキスト「です」。";
        assert_eq!(builder.resolve(text).unwrap(), builder.resolve(text).unwrap());
    }

    proptest! {
        #[test]
        fn exclusive_partition_tiles_text(text in "[a-c1-3!? 漢😀]{0,16}") {
            let builder = CharClassBuilder::exclusive()
                .rule("Latin", size(1.0))
                .rule("Number", size(2.0));
            let runs = builder.partition(&text).unwrap();
            let mut cursor = 0;
            for run in &runs {
                prop_assert_eq!(run.from, cursor);
                prop_assert!(run.count > 0);
                cursor += run.count;
            }
            prop_assert_eq!(cursor, text.encode_utf16().count());
        }
    }
}
