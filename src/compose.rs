//! Builder composition
//!
//! A [`Composer`] stacks builders. Each layer resolves on its own and is
//! folded into the accumulated ranges in order, so a later layer overrides
//! earlier ones field by field wherever they overlap.

use std::fmt;

use log::debug;

use crate::apply::{apply_layout, apply_ranges, StyleSink};
use crate::builder::StyleBuilder;
use crate::error::Result;
use crate::range::{add_normalized_ranges, StyledRange};
use crate::style::Layout;

/// An ordered stack of builders with its own layout
#[derive(Default)]
pub struct Composer {
    layers: Vec<Box<dyn StyleBuilder>>,
    layout: Layout,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a layer on top
    pub fn add(mut self, layer: impl StyleBuilder + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Add an already boxed layer on top
    pub fn push(&mut self, layer: Box<dyn StyleBuilder>) {
        self.layers.push(layer);
    }

    /// Builder: add composer-level layout options
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout.extend(&layout);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("layers", &self.layers.len())
            .field("layout", &self.layout)
            .finish()
    }
}

impl StyleBuilder for Composer {
    fn resolve(&self, text: &str) -> Result<Vec<StyledRange>> {
        let mut layers = self.layers.iter();
        let mut ranges = match layers.next() {
            Some(first) => first.resolve(text)?,
            None => return Ok(Vec::new()),
        };
        for layer in layers {
            add_normalized_ranges(&mut ranges, &layer.resolve(text)?);
        }
        debug!("composer: {} layers -> {} ranges", self.layers.len(), ranges.len());
        Ok(ranges)
    }

    fn layout_options(&self) -> &Layout {
        &self.layout
    }

    /// Layer layouts in order, then this composer's own, then the ranges
    fn apply(&self, text: &str, sink: &mut dyn StyleSink) -> Result<()> {
        for layer in &self.layers {
            apply_layout(layer.layout_options(), sink)?;
        }
        apply_layout(&self.layout, sink)?;
        apply_ranges(&self.resolve(text)?, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CharClassBuilder, LineBuilder, PositionBuilder};
    use crate::range::Range;
    use crate::style::{Color, LayoutField, Style, StyleField, Value};

    fn fill(hex: &str) -> Style {
        Style::new().with_fill_color(Color::from_hex(hex).unwrap())
    }

    #[test]
    fn test_composition_override() {
        let red = fill("#ff0000");
        let blue = fill("#0000ff");
        let composer = Composer::new()
            .add(PositionBuilder::new().rule(Range::new(0, 3), red.clone()))
            .add(PositionBuilder::new().rule(1usize, blue.clone()));
        assert_eq!(composer.len(), 2);
        assert_eq!(
            composer.resolve("abc").unwrap(),
            vec![
                StyledRange::new(0, 1, red.clone()),
                StyledRange::new(1, 1, blue),
                StyledRange::new(2, 1, red),
            ]
        );
    }

    #[test]
    fn test_later_layer_merges_fields() {
        let composer = Composer::new()
            .add(CharClassBuilder::new().style(Style::new().with_font_size(10.0)))
            .add(LineBuilder::new().rule(1usize, Style::new().with_bold()));
        let ranges = composer.resolve("ab\ncd").unwrap();
        assert_eq!(
            ranges,
            vec![
                StyledRange::new(0, 3, Style::new().with_font_size(10.0)),
                StyledRange::new(3, 2, Style::new().with_font_size(10.0).with_bold()),
            ]
        );
    }

    #[test]
    fn test_empty_composer() {
        let composer = Composer::new();
        assert!(composer.is_empty());
        assert!(composer.resolve("abc").unwrap().is_empty());
    }

    #[test]
    fn test_nested_composer() {
        let inner = Composer::new().add(PositionBuilder::new().rule(0usize, fill("#00ff00")));
        let outer = Composer::new()
            .add(inner)
            .add(PositionBuilder::new().rule(1usize, fill("#0000ff")));
        assert_eq!(outer.resolve("ab").unwrap().len(), 2);
    }

    #[test]
    fn test_apply_order() {
        #[derive(Default)]
        struct Log(Vec<String>);

        impl StyleSink for Log {
            fn set_style(
                &mut self,
                field: StyleField,
                _: &Value,
                from: usize,
                count: usize,
            ) -> Result<()> {
                self.0.push(format!("{}@{}+{}", field.name(), from, count));
                Ok(())
            }
            fn set_kerning(&mut self, index: usize, _: f64) -> Result<()> {
                self.0.push(format!("kerning@{}", index));
                Ok(())
            }
            fn set_layout(&mut self, field: LayoutField, value: &Value) -> Result<()> {
                self.0.push(format!("{}={}", field.name(), value));
                Ok(())
            }
        }

        let composer = Composer::new()
            .add(
                LineBuilder::new()
                    .layout(Layout::new().with_justification("left"))
                    .style(Style::new().with_bold()),
            )
            .layout(Layout::new().with_justification("right"));
        let mut log = Log::default();
        composer.apply("ab", &mut log).unwrap();
        assert_eq!(
            log.0,
            vec![
                "justification=\"left\"".to_string(),
                "justification=\"right\"".to_string(),
                "fauxBold@0+2".to_string(),
            ]
        );
    }
}
