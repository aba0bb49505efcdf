//! Style attribute bags
//!
//! A [`Style`] is an open mapping from character-style field name to
//! [`Value`]. Bags compose field by field: merging `b` over `a` keeps every
//! field of `a` that `b` does not mention. Field names are only checked when
//! a bag reaches the host (see [`crate::apply`]), against the closed
//! [`StyleField`] and [`LayoutField`] enumerations.

use std::collections::BTreeMap;
use std::fmt;

/// RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a color from float components
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_rgb8(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Create a color from 8-bit components
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    /// Components scaled to 8 bits
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let scale = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }
}

/// A single style field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    Color(Color),
}

impl Value {
    /// The kind of this value, for validation messages
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::Color(_) => ValueKind::Color,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Color(c) => {
                let (r, g, b) = c.to_rgb8();
                write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

/// Value kinds accepted by style and layout fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Number,
    Text,
    Color,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Color => "color",
        }
    }
}

/// Character style fields the host knows how to set over a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleField {
    FillColor,
    StrokeColor,
    StrokeWidth,
    Font,
    FontSize,
    Tracking,
    /// Applied per character boundary, not per range
    Kerning,
    AllCaps,
    SmallCaps,
    Ligature,
    BaselineShift,
    BaselineOption,
    BaselineDirection,
    DigitSet,
    LineJoin,
    HorizontalScale,
    VerticalScale,
    FauxBold,
    FauxItalic,
}

impl StyleField {
    pub const ALL: [StyleField; 19] = [
        StyleField::FillColor,
        StyleField::StrokeColor,
        StyleField::StrokeWidth,
        StyleField::Font,
        StyleField::FontSize,
        StyleField::Tracking,
        StyleField::Kerning,
        StyleField::AllCaps,
        StyleField::SmallCaps,
        StyleField::Ligature,
        StyleField::BaselineShift,
        StyleField::BaselineOption,
        StyleField::BaselineDirection,
        StyleField::DigitSet,
        StyleField::LineJoin,
        StyleField::HorizontalScale,
        StyleField::VerticalScale,
        StyleField::FauxBold,
        StyleField::FauxItalic,
    ];

    /// Field name as used in style bags and rule files
    pub fn name(&self) -> &'static str {
        match self {
            StyleField::FillColor => "fillColor",
            StyleField::StrokeColor => "strokeColor",
            StyleField::StrokeWidth => "strokeWidth",
            StyleField::Font => "font",
            StyleField::FontSize => "fontSize",
            StyleField::Tracking => "tracking",
            StyleField::Kerning => "kerning",
            StyleField::AllCaps => "allCaps",
            StyleField::SmallCaps => "smallCaps",
            StyleField::Ligature => "ligature",
            StyleField::BaselineShift => "baselineShift",
            StyleField::BaselineOption => "baselineOption",
            StyleField::BaselineDirection => "baselineDirection",
            StyleField::DigitSet => "digitSet",
            StyleField::LineJoin => "lineJoin",
            StyleField::HorizontalScale => "horizontalScale",
            StyleField::VerticalScale => "verticalScale",
            StyleField::FauxBold => "fauxBold",
            StyleField::FauxItalic => "fauxItalic",
        }
    }

    /// Parse a field from its name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    /// The value kind this field accepts
    pub fn kind(&self) -> ValueKind {
        match self {
            StyleField::FillColor | StyleField::StrokeColor => ValueKind::Color,
            StyleField::StrokeWidth
            | StyleField::FontSize
            | StyleField::Tracking
            | StyleField::Kerning
            | StyleField::BaselineShift
            | StyleField::HorizontalScale
            | StyleField::VerticalScale => ValueKind::Number,
            StyleField::Font
            | StyleField::BaselineOption
            | StyleField::BaselineDirection
            | StyleField::DigitSet
            | StyleField::LineJoin => ValueKind::Text,
            StyleField::AllCaps
            | StyleField::SmallCaps
            | StyleField::Ligature
            | StyleField::FauxBold
            | StyleField::FauxItalic => ValueKind::Bool,
        }
    }
}

/// Paragraph-scope fields applied once per text, never per range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutField {
    Direction,
    Justification,
    LeftMargin,
    RightMargin,
    FirstLineIndent,
    LeadingType,
    SpaceBefore,
    SpaceAfter,
    HangingPunctuation,
    EveryLineComposer,
}

impl LayoutField {
    pub const ALL: [LayoutField; 10] = [
        LayoutField::Direction,
        LayoutField::Justification,
        LayoutField::LeftMargin,
        LayoutField::RightMargin,
        LayoutField::FirstLineIndent,
        LayoutField::LeadingType,
        LayoutField::SpaceBefore,
        LayoutField::SpaceAfter,
        LayoutField::HangingPunctuation,
        LayoutField::EveryLineComposer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayoutField::Direction => "direction",
            LayoutField::Justification => "justification",
            LayoutField::LeftMargin => "leftMargin",
            LayoutField::RightMargin => "rightMargin",
            LayoutField::FirstLineIndent => "firstLineIndent",
            LayoutField::LeadingType => "leadingType",
            LayoutField::SpaceBefore => "spaceBefore",
            LayoutField::SpaceAfter => "spaceAfter",
            LayoutField::HangingPunctuation => "hangingPunctuation",
            LayoutField::EveryLineComposer => "everyLineComposer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            LayoutField::Direction | LayoutField::Justification | LayoutField::LeadingType => {
                ValueKind::Text
            }
            LayoutField::LeftMargin
            | LayoutField::RightMargin
            | LayoutField::FirstLineIndent
            | LayoutField::SpaceBefore
            | LayoutField::SpaceAfter => ValueKind::Number,
            LayoutField::HangingPunctuation | LayoutField::EveryLineComposer => ValueKind::Bool,
        }
    }
}

/// Character style attribute bag
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    fields: BTreeMap<String, Value>,
}

impl Style {
    /// Create an empty style
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set an arbitrary field
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder: set fill color
    pub fn with_fill_color(self, color: Color) -> Self {
        self.with(StyleField::FillColor.name(), color)
    }

    /// Builder: set stroke color
    pub fn with_stroke_color(self, color: Color) -> Self {
        self.with(StyleField::StrokeColor.name(), color)
    }

    /// Builder: set font size
    pub fn with_font_size(self, size: f64) -> Self {
        self.with(StyleField::FontSize.name(), size)
    }

    /// Builder: set font name
    pub fn with_font(self, font: &str) -> Self {
        self.with(StyleField::Font.name(), font)
    }

    /// Builder: set tracking
    pub fn with_tracking(self, tracking: f64) -> Self {
        self.with(StyleField::Tracking.name(), tracking)
    }

    /// Builder: set faux bold
    pub fn with_bold(self) -> Self {
        self.with(StyleField::FauxBold.name(), true)
    }

    /// Builder: set faux italic
    pub fn with_italic(self) -> Self {
        self.with(StyleField::FauxItalic.name(), true)
    }

    /// Set a field in place
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overlay `other` onto this style; `other` wins per field
    pub fn merge(&mut self, other: &Style) {
        for (name, value) in &other.fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// A copy of this style with `other` overlaid
    pub fn merged(&self, other: &Style) -> Style {
        let mut style = self.clone();
        style.merge(other);
        style
    }
}

/// Paragraph layout attribute bag
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    fields: BTreeMap<String, Value>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set an arbitrary field
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder: set justification
    pub fn with_justification(self, justification: &str) -> Self {
        self.with(LayoutField::Justification.name(), justification)
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Accumulate another layout; later options win per field
    pub fn extend(&mut self, other: &Layout) {
        for (name, value) in &other.fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }
}
