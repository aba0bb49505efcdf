//! Host adapter
//!
//! A [`StyleSink`] is whatever owns the styled text: it receives one setter
//! call per style field over a UTF-16 run, one per index for kerning, and
//! one per layout field. Every field is validated before any setter runs,
//! so a bad style never leaves a range half-applied.

use crate::error::{Result, StyleError};
use crate::range::StyledRange;
use crate::style::{Layout, LayoutField, Style, StyleField, Value, ValueKind};

/// Setter contract for a styled-text host
pub trait StyleSink {
    /// Set `field` to `value` over `count` UTF-16 units starting at `from`
    fn set_style(
        &mut self,
        field: StyleField,
        value: &Value,
        from: usize,
        count: usize,
    ) -> Result<()>;

    /// Set kerning before the UTF-16 unit at `index`
    fn set_kerning(&mut self, index: usize, value: f64) -> Result<()>;

    /// Set a paragraph-scope field
    fn set_layout(&mut self, field: LayoutField, value: &Value) -> Result<()>;
}

fn check_kind(name: &str, expected: ValueKind, value: &Value) -> Result<()> {
    if value.kind() == expected {
        Ok(())
    } else {
        Err(StyleError::InvalidValue {
            field: name.to_string(),
            expected: expected.name(),
        })
    }
}

fn validate_style(style: &Style) -> Result<Vec<(StyleField, &Value)>> {
    style
        .iter()
        .map(|(name, value)| {
            let field = StyleField::from_name(name)
                .ok_or_else(|| StyleError::UnknownStyleField(name.to_string()))?;
            check_kind(name, field.kind(), value)?;
            Ok((field, value))
        })
        .collect()
}

/// Apply `style` over `count` UTF-16 units starting at `from`
///
/// Zero-length runs are dropped without touching the host.
pub fn apply_style(
    style: &Style,
    from: usize,
    count: usize,
    sink: &mut dyn StyleSink,
) -> Result<()> {
    let fields = validate_style(style)?;
    if count == 0 {
        return Ok(());
    }

    for (field, value) in fields {
        match (field, value) {
            (StyleField::Kerning, Value::Number(kerning)) => {
                for index in from..from + count {
                    sink.set_kerning(index, *kerning)?;
                }
            }
            _ => sink.set_style(field, value, from, count)?,
        }
    }
    Ok(())
}

/// Apply paragraph layout once
pub fn apply_layout(layout: &Layout, sink: &mut dyn StyleSink) -> Result<()> {
    let fields = layout
        .iter()
        .map(|(name, value)| {
            let field = LayoutField::from_name(name)
                .ok_or_else(|| StyleError::UnknownLayoutField(name.to_string()))?;
            check_kind(name, field.kind(), value)?;
            Ok((field, value))
        })
        .collect::<Result<Vec<_>>>()?;

    for (field, value) in fields {
        sink.set_layout(field, value)?;
    }
    Ok(())
}

/// Apply every range in order
pub fn apply_ranges(ranges: &[StyledRange], sink: &mut dyn StyleSink) -> Result<()> {
    for range in ranges {
        apply_style(&range.style, range.from, range.count, sink)?;
    }
    Ok(())
}
