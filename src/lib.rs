//! rangestyle - rule-based text styling
//!
//! Declarative rules (by character class, position, line, delimiter pair or
//! grapheme predicate) are resolved against a text into sorted,
//! non-overlapping `(from, count) -> style` ranges, in UTF-16 code units.
//! The ranges are then handed to a host through the [`StyleSink`] contract.
//!
//! ```no_run
//! use rangestyle::{CharClassBuilder, Composer, LineBuilder, Style, StyleBuilder};
//!
//! let composer = Composer::new()
//!     .add(CharClassBuilder::new().rule("Number", Style::new().with_font_size(20.0)))
//!     .add(LineBuilder::new().rule(0usize, Style::new().with_bold()));
//! let ranges = composer.resolve("Chapter 1\nbody").unwrap();
//! ```

pub mod apply;
pub mod builder;
pub mod charclass;
pub mod compose;
pub mod config;
pub mod error;
pub mod grapheme;
pub mod offset;
pub mod range;
pub mod style;
pub mod terminal;

pub use apply::{apply_layout, apply_ranges, apply_style, StyleSink};
pub use builder::{
    CharClassBuilder, ClassMode, ClassRun, DelimiterMatch, Depth, GraphemeBuilder, LineBuilder,
    Nesting, PositionBuilder, PositionMode, PositionRule, RangeRule, StyleBuilder,
    SurroundingBuilder, Target,
};
pub use charclass::{create_matcher, registry, CharClass, CharMatcher, CharMatchers, Matcher};
pub use compose::Composer;
pub use error::{HostRequest, Result, StyleError};
pub use grapheme::{segment_text, GraphemeContext, GraphemeRule, Segmentation};
pub use range::{
    add_normalized_range, add_normalized_ranges, merge_ranges, normalize_ranges, Range, StyledRange,
};
pub use style::{Color, Layout, LayoutField, Style, StyleField, Value};
pub use terminal::TerminalSink;
