//! Terminal host using crossterm
//!
//! [`TerminalSink`] records styles per UTF-16 unit and renders the text with
//! ANSI attributes. Only the fields a terminal can show are honoured:
//!
//! | field | rendering |
//! |---|---|
//! | `fillColor` | foreground colour |
//! | `strokeColor` | background colour |
//! | `fauxBold` | bold |
//! | `fauxItalic` | italic |
//! | `allCaps` | uppercase |
//! | `baselineShift` != 0 | underline |
//!
//! Other style fields are accepted and ignored. Of the layout fields only
//! `leftMargin` and `firstLineIndent` (in columns) have an effect.

use std::io::Write;

use crossterm::{
    queue,
    style::{
        self, Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
};

use crate::apply::StyleSink;
use crate::error::Result;
use crate::grapheme::{is_line_break, segment_text};
use crate::style::{Color, LayoutField, StyleField, Value};

/// Terminal attributes of one UTF-16 unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub upper: bool,
    pub underline: bool,
}

impl Cell {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A [`StyleSink`] that renders to a terminal
#[derive(Debug, Clone)]
pub struct TerminalSink {
    cells: Vec<Cell>,
    left_margin: usize,
    first_line_indent: usize,
}

impl TerminalSink {
    /// A sink sized for `text`
    pub fn new(text: &str) -> Self {
        Self {
            cells: vec![Cell::default(); text.encode_utf16().count()],
            left_margin: 0,
            first_line_indent: 0,
        }
    }

    /// Attributes at a UTF-16 index
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    fn update(&mut self, from: usize, count: usize, f: impl Fn(&mut Cell)) {
        let end = (from + count).min(self.cells.len());
        for cell in self.cells.iter_mut().take(end).skip(from) {
            f(cell);
        }
    }

    /// Render `text` with the recorded attributes
    ///
    /// Each cluster takes the attributes of its first UTF-16 unit.
    /// Attributes are reset before every line break and at the end.
    pub fn render<W: Write>(&self, text: &str, out: &mut W) -> Result<()> {
        let seg = segment_text(text);
        let mut current = Cell::default();
        let mut at_line_start = true;

        for grapheme in seg.graphemes() {
            if at_line_start {
                let indent = self.left_margin
                    + if grapheme.line == 0 { self.first_line_indent } else { 0 };
                if indent > 0 {
                    queue!(out, Print(" ".repeat(indent)))?;
                }
                at_line_start = false;
            }

            if is_line_break(grapheme.text) {
                if !current.is_plain() {
                    reset(out)?;
                    current = Cell::default();
                }
                queue!(out, Print(grapheme.text))?;
                at_line_start = true;
                continue;
            }

            let cell = self.cells.get(grapheme.offset).copied().unwrap_or_default();
            if cell != current {
                reset(out)?;
                set_attributes(out, &cell)?;
                current = cell;
            }
            if cell.upper {
                queue!(out, Print(grapheme.text.to_uppercase()))?;
            } else {
                queue!(out, Print(grapheme.text))?;
            }
        }

        if !current.is_plain() {
            reset(out)?;
        }
        out.flush()?;
        Ok(())
    }
}

fn reset<W: Write>(out: &mut W) -> Result<()> {
    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
    Ok(())
}

fn set_attributes<W: Write>(out: &mut W, cell: &Cell) -> Result<()> {
    if let Some(fg) = cell.fg {
        queue!(out, SetForegroundColor(to_terminal_color(fg)))?;
    }
    if let Some(bg) = cell.bg {
        queue!(out, SetBackgroundColor(to_terminal_color(bg)))?;
    }
    if cell.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if cell.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if cell.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    Ok(())
}

fn to_terminal_color(color: Color) -> style::Color {
    let (r, g, b) = color.to_rgb8();
    style::Color::Rgb { r, g, b }
}

impl StyleSink for TerminalSink {
    fn set_style(
        &mut self,
        field: StyleField,
        value: &Value,
        from: usize,
        count: usize,
    ) -> Result<()> {
        match field {
            StyleField::FillColor => {
                let color = value.as_color();
                self.update(from, count, |cell| cell.fg = color);
            }
            StyleField::StrokeColor => {
                let color = value.as_color();
                self.update(from, count, |cell| cell.bg = color);
            }
            StyleField::FauxBold => {
                let on = value.as_bool().unwrap_or(false);
                self.update(from, count, |cell| cell.bold = on);
            }
            StyleField::FauxItalic => {
                let on = value.as_bool().unwrap_or(false);
                self.update(from, count, |cell| cell.italic = on);
            }
            StyleField::AllCaps => {
                let on = value.as_bool().unwrap_or(false);
                self.update(from, count, |cell| cell.upper = on);
            }
            StyleField::BaselineShift => {
                let on = value.as_number().map_or(false, |shift| shift != 0.0);
                self.update(from, count, |cell| cell.underline = on);
            }
            _ => {}
        }
        Ok(())
    }

    fn set_kerning(&mut self, _index: usize, _value: f64) -> Result<()> {
        Ok(())
    }

    fn set_layout(&mut self, field: LayoutField, value: &Value) -> Result<()> {
        let columns = value.as_number().map_or(0, |n| n.max(0.0) as usize);
        match field {
            LayoutField::LeftMargin => self.left_margin = columns,
            LayoutField::FirstLineIndent => self.first_line_indent = columns,
            _ => {}
        }
        Ok(())
    }
}
