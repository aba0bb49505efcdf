//! Character classes and matchers
//!
//! A [`CharClass`] names a compiled Unicode-aware pattern. The well-known
//! classes live in a registry that is built once, on first use, and is
//! read-only afterwards. Rules refer to classes through [`CharMatcher`]s,
//! which [`create_matcher`] compiles into a single OR-ed [`Matcher`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::error::{Result, StyleError};

/// Well-known class keys and their patterns
const CLASSES: &[(&str, &str)] = &[
    // Scripts
    ("Latin", r"\p{Script=Latin}"),
    ("Greek", r"\p{Script=Greek}"),
    ("Cyrillic", r"\p{Script=Cyrillic}"),
    ("Armenian", r"\p{Script=Armenian}"),
    ("Hebrew", r"\p{Script=Hebrew}"),
    ("Arabic", r"\p{Script=Arabic}"),
    ("Devanagari", r"\p{Script=Devanagari}"),
    ("Thai", r"\p{Script=Thai}"),
    ("Georgian", r"\p{Script=Georgian}"),
    ("Hangul", r"\p{Script=Hangul}"),
    ("Hiragana", r"\p{Script=Hiragana}"),
    ("Katakana", r"\p{Script=Katakana}"),
    ("Han", r"\p{Script=Han}"),
    ("Bopomofo", r"\p{Script=Bopomofo}"),
    // General categories
    ("Letter", r"\p{L}"),
    ("Uppercase", r"\p{Lu}"),
    ("Lowercase", r"\p{Ll}"),
    ("Mark", r"\p{M}"),
    ("Number", r"\p{N}"),
    ("Digit", r"\p{Nd}"),
    ("Punctuation", r"\p{P}"),
    ("Symbol", r"\p{S}"),
    ("Separator", r"\p{Z}"),
    ("Control", r"\p{Cc}"),
    ("Emoji", r"\p{Extended_Pictographic}"),
    // Japanese punctuation, brackets and iteration marks
    (
        "Yakumono",
        r"[、。，．・：；？！゛゜ヽヾゝゞ〃々〆ー―‐〜～…‥「」『』（）〔〕［］｛｝〈〉《》【】〖〗〘〙〚〛‘’“”]",
    ),
    // Helpers
    ("Whitespace", r"\s"),
    ("Space", r"[^\S\r\n]"),
    ("LineBreak", r"\r\n|\r|\n"),
    ("Any", r"(?s)."),
];

/// A named, compiled character pattern
#[derive(Debug, Clone)]
pub struct CharClass {
    name: Cow<'static, str>,
    pattern: Regex,
}

impl CharClass {
    /// Create an ad-hoc class from a pattern
    pub fn new(name: &str, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: Cow::Owned(name.to_string()),
            pattern: Regex::new(pattern)?,
        })
    }

    /// Look up a well-known class by key
    pub fn lookup(key: &str) -> Result<&'static CharClass> {
        registry()
            .get(key)
            .ok_or_else(|| StyleError::UnknownClass(key.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// The frozen set of well-known classes
#[derive(Debug)]
pub struct Registry {
    classes: BTreeMap<&'static str, CharClass>,
}

impl Registry {
    fn build() -> Self {
        let mut classes = BTreeMap::new();
        for &(key, source) in CLASSES {
            match Regex::new(source) {
                Ok(pattern) => {
                    classes.insert(
                        key,
                        CharClass {
                            name: Cow::Borrowed(key),
                            pattern,
                        },
                    );
                }
                Err(e) => warn!("skipping character class {}: {}", key, e),
            }
        }
        Self { classes }
    }

    pub fn get(&self, key: &str) -> Option<&CharClass> {
        self.classes.get(key)
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.classes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The shared class registry, built on first access
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::build)
}

/// One way of naming a set of characters
#[derive(Debug, Clone)]
pub enum CharMatcher {
    /// A registry key
    Class(Cow<'static, str>),
    /// A class value
    Value(CharClass),
    /// An ad-hoc pattern
    Pattern(Regex),
}

impl CharMatcher {
    fn resolve(&self) -> Result<Regex> {
        match self {
            CharMatcher::Class(key) => Ok(CharClass::lookup(key)?.pattern().clone()),
            CharMatcher::Value(class) => Ok(class.pattern().clone()),
            CharMatcher::Pattern(regex) => Ok(regex.clone()),
        }
    }
}

impl From<&str> for CharMatcher {
    fn from(key: &str) -> Self {
        CharMatcher::Class(Cow::Owned(key.to_string()))
    }
}

impl From<String> for CharMatcher {
    fn from(key: String) -> Self {
        CharMatcher::Class(Cow::Owned(key))
    }
}

impl From<CharClass> for CharMatcher {
    fn from(class: CharClass) -> Self {
        CharMatcher::Value(class)
    }
}

impl From<Regex> for CharMatcher {
    fn from(regex: Regex) -> Self {
        CharMatcher::Pattern(regex)
    }
}

/// One matcher or several OR-ed together
#[derive(Debug, Clone)]
pub enum CharMatchers {
    One(CharMatcher),
    Many(Vec<CharMatcher>),
}

impl CharMatchers {
    /// Matches any single character
    pub const ANY: CharMatchers = CharMatchers::One(CharMatcher::Class(Cow::Borrowed("Any")));

    pub fn as_slice(&self) -> &[CharMatcher] {
        match self {
            CharMatchers::One(m) => std::slice::from_ref(m),
            CharMatchers::Many(ms) => ms,
        }
    }
}

impl From<CharMatcher> for CharMatchers {
    fn from(matcher: CharMatcher) -> Self {
        CharMatchers::One(matcher)
    }
}

impl From<&str> for CharMatchers {
    fn from(key: &str) -> Self {
        CharMatchers::One(key.into())
    }
}

impl From<String> for CharMatchers {
    fn from(key: String) -> Self {
        CharMatchers::One(key.into())
    }
}

impl From<CharClass> for CharMatchers {
    fn from(class: CharClass) -> Self {
        CharMatchers::One(class.into())
    }
}

impl From<Regex> for CharMatchers {
    fn from(regex: Regex) -> Self {
        CharMatchers::One(regex.into())
    }
}

impl From<Vec<CharMatcher>> for CharMatchers {
    fn from(matchers: Vec<CharMatcher>) -> Self {
        CharMatchers::Many(matchers)
    }
}

impl<const N: usize> From<[&str; N]> for CharMatchers {
    fn from(keys: [&str; N]) -> Self {
        CharMatchers::Many(keys.iter().map(|k| CharMatcher::from(*k)).collect())
    }
}

/// A compiled OR of character matchers
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    patterns: Vec<Regex>,
}

impl Matcher {
    /// The matcher that never matches
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_never(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether any pattern matches somewhere inside `grapheme`
    pub fn is_match(&self, grapheme: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(grapheme))
    }

    /// Byte length of the first non-empty match starting exactly at `pos`,
    /// trying patterns in declaration order
    ///
    /// The search runs over the whole text, so `^`, `\b` and other
    /// look-around assertions see what precedes `pos`.
    pub fn match_len_at(&self, text: &str, pos: usize) -> Option<usize> {
        text.get(pos..)?;
        self.patterns
            .iter()
            .filter_map(|p| p.find_at(text, pos))
            .filter(|m| m.start() == pos)
            .map(|m| m.end() - pos)
            .find(|&len| len > 0)
    }

    /// All non-empty matches of every pattern, as byte ranges
    ///
    /// Matches of different patterns may overlap.
    pub fn find_all(&self, text: &str) -> Vec<(usize, usize)> {
        self.patterns
            .iter()
            .flat_map(|p| p.find_iter(text))
            .filter(|m| !m.is_empty())
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}

/// Compile matchers into a single predicate
///
/// `None` (or an empty list) yields [`Matcher::never`].
pub fn create_matcher(matchers: Option<&CharMatchers>) -> Result<Matcher> {
    let Some(matchers) = matchers else {
        return Ok(Matcher::never());
    };
    let patterns = matchers
        .as_slice()
        .iter()
        .map(CharMatcher::resolve)
        .collect::<Result<Vec<_>>>()?;
    Ok(Matcher { patterns })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_shared() {
        let a = registry() as *const Registry;
        let b = registry() as *const Registry;
        assert_eq!(a, b);
        assert_eq!(registry().len(), CLASSES.len());
    }

    #[test]
    fn test_lookup() {
        let latin = CharClass::lookup("Latin").unwrap();
        assert_eq!(latin.name(), "Latin");
        assert!(latin.pattern().is_match("a"));
        assert!(!latin.pattern().is_match("1"));
    }

    #[test]
    fn test_unknown_class() {
        match CharClass::lookup("Klingon") {
            Err(StyleError::UnknownClass(key)) => assert_eq!(key, "Klingon"),
            other => panic!("expected UnknownClass, got {:?}", other.map(|c| c.name())),
        }
        let matchers = CharMatchers::from("Klingon");
        assert!(create_matcher(Some(&matchers)).is_err());
    }

    #[test]
    fn test_scripts_and_categories() {
        let m = |key: &str| create_matcher(Some(&CharMatchers::from(key))).unwrap();
        assert!(m("Han").is_match("漢"));
        assert!(m("Hiragana").is_match("あ"));
        assert!(m("Katakana").is_match("カ"));
        assert!(m("Number").is_match("٣"));
        assert!(m("Yakumono").is_match("「"));
        assert!(!m("Yakumono").is_match("a"));
        assert!(m("Space").is_match(" "));
        assert!(!m("Space").is_match("\n"));
        assert!(m("LineBreak").is_match("\r\n"));
    }

    #[test]
    fn test_or_combination() {
        let matchers = CharMatchers::from(["Latin", "Number"]);
        let m = create_matcher(Some(&matchers)).unwrap();
        assert!(m.is_match("a"));
        assert!(m.is_match("7"));
        assert!(!m.is_match("!"));
    }

    #[test]
    fn test_never() {
        let m = create_matcher(None).unwrap();
        assert!(m.is_never());
        assert!(!m.is_match("a"));
        assert!(!m.is_match(""));
        assert_eq!(m.match_len_at("abc", 0), None);
    }

    #[test]
    fn test_custom_class_and_pattern() {
        let vowels = CharClass::new("Vowel", "[aeiou]").unwrap();
        let m = create_matcher(Some(&CharMatchers::from(vowels))).unwrap();
        assert!(m.is_match("e"));
        assert!(!m.is_match("x"));

        let m = create_matcher(Some(&CharMatchers::from(Regex::new("x+").unwrap()))).unwrap();
        assert_eq!(m.find_all("axxbx"), vec![(1, 3), (4, 5)]);
    }

    #[test]
    fn test_match_len_at_is_anchored() {
        let m = create_matcher(Some(&CharMatchers::from(Regex::new("b+").unwrap()))).unwrap();
        assert_eq!(m.match_len_at("abb", 0), None);
        assert_eq!(m.match_len_at("abb", 1), Some(2));
        assert_eq!(m.match_len_at("abb", 3), None);
    }

    #[test]
    fn test_match_len_at_sees_preceding_text() {
        let start = create_matcher(Some(&CharMatchers::from(Regex::new("^a").unwrap()))).unwrap();
        assert_eq!(start.match_len_at("aaa", 0), Some(1));
        assert_eq!(start.match_len_at("aaa", 1), None);

        let word = create_matcher(Some(&CharMatchers::from(Regex::new(r"\bab").unwrap()))).unwrap();
        assert_eq!(word.match_len_at("xab", 1), None);
        assert_eq!(word.match_len_at("x ab", 2), Some(2));
    }

    #[test]
    fn test_shared_class_not_mutated() {
        let latin = CharClass::lookup("Latin").unwrap();
        let m = create_matcher(Some(&CharMatchers::from(latin.clone()))).unwrap();
        assert_eq!(m.find_all("ab1c").len(), 3);
        assert_eq!(latin.pattern().as_str(), r"\p{Script=Latin}");
    }
}
