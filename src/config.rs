//! Rule files
//!
//! A rule file is a TOML document describing a [`Composer`]: optional
//! composer-level `[layout]`, then one `[[layer]]` per builder, bottom to
//! top. Each layer has a `kind`, kind-specific settings, an optional
//! `[layer.layout]` and any number of `[[layer.rule]]` entries.
//!
//! Example:
//! ```toml
//! [layout]
//! justification = "center"
//!
//! [[layer]]
//! kind = "charclass"
//! mode = "exclusive"
//! [[layer.rule]]
//! class = ["Han", "Hiragana"]
//! style = { fontSize = 12 }
//! [[layer.rule]]
//! pattern = "[0-9]+"
//! style = { fillColor = "#cc3300" }
//!
//! [[layer]]
//! kind = "surrounding"
//! open = "("
//! close = ")"
//! nesting = "balanced"
//! target = "content"
//! [[layer.rule]]
//! style = { fauxItalic = true }
//! ```
//!
//! A rule without a selector (`class`, `pattern`, `index`, `from`) stands
//! for the layer's default rule.

use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;
use toml::{Table, Value as TomlValue};

use crate::builder::{
    CharClassBuilder, ClassMode, LineBuilder, Nesting, PositionBuilder, RangeRule,
    SurroundingBuilder, Target,
};
use crate::charclass::{CharMatcher, CharMatchers};
use crate::compose::Composer;
use crate::error::{Result, StyleError};
use crate::range::Range;
use crate::style::{Color, Layout, Style, StyleField, Value, ValueKind};

/// Load a rule file from disk
pub fn load(path: &Path) -> Result<Composer> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

/// Build a composer from rule file contents
pub fn parse(contents: &str) -> Result<Composer> {
    let doc = contents
        .parse::<Table>()
        .map_err(|e| StyleError::RuleFile(e.to_string()))?;

    for key in doc.keys() {
        if key != "layout" && key != "layer" {
            return Err(rule_error(format!("unknown top-level key '{}'", key)));
        }
    }

    let mut composer = Composer::new();
    if let Some(layout) = doc.get("layout") {
        composer = composer.layout(parse_layout(layout)?);
    }

    let layers = match doc.get("layer") {
        Some(TomlValue::Array(layers)) => layers.as_slice(),
        Some(_) => return Err(rule_error("'layer' must be an array of tables")),
        None => &[][..],
    };
    for (i, layer) in layers.iter().enumerate() {
        let table = layer
            .as_table()
            .ok_or_else(|| rule_error(format!("layer {} is not a table", i)))?;
        parse_layer(&mut composer, table).map_err(|e| match e {
            StyleError::RuleFile(msg) => rule_error(format!("layer {}: {}", i, msg)),
            other => other,
        })?;
    }

    debug!("rule file: {} layers", composer.len());
    Ok(composer)
}

fn rule_error(msg: impl Into<String>) -> StyleError {
    StyleError::RuleFile(msg.into())
}

fn parse_layer(composer: &mut Composer, table: &Table) -> Result<()> {
    let kind = get_str(table, "kind")?.ok_or_else(|| rule_error("missing 'kind'"))?;
    let layout = match table.get("layout") {
        Some(value) => parse_layout(value)?,
        None => Layout::new(),
    };
    let rules = rule_tables(table)?;

    match kind {
        "charclass" => {
            check_keys(table, &["kind", "layout", "rule", "mode"])?;
            let mode = match get_str(table, "mode")?.unwrap_or("overlay") {
                "overlay" => ClassMode::Overlay,
                "exclusive" => ClassMode::Exclusive,
                other => return Err(rule_error(format!("unknown charclass mode '{}'", other))),
            };
            let mut builder = CharClassBuilder::with_mode(mode).layout(layout);
            for rule in rules {
                check_keys(rule, &["style", "class", "pattern"])?;
                let style = parse_style(rule)?;
                builder = match matchers(rule)? {
                    Some(m) => builder.rule(m, style),
                    None => builder.style(style),
                };
            }
            composer.push(Box::new(builder));
        }
        "position" => {
            check_keys(table, &["kind", "layout", "rule", "mode", "skip"])?;
            let mut builder = match get_str(table, "mode")?.unwrap_or("global") {
                "global" => PositionBuilder::new(),
                "line" => PositionBuilder::per_line(),
                other => return Err(rule_error(format!("unknown position mode '{}'", other))),
            };
            if let Some(skip) = table.get("skip") {
                builder = builder.skip_when(class_list(skip, "skip")?);
            }
            let mut builder = builder.layout(layout);
            for rule in rules {
                check_keys(rule, &["style", "index", "from", "count"])?;
                let style = parse_style(rule)?;
                builder = match selection(rule)? {
                    Some(select) => builder.rule(select, style),
                    None => builder.style(style),
                };
            }
            composer.push(Box::new(builder));
        }
        "line" => {
            check_keys(table, &["kind", "layout", "rule"])?;
            let mut builder = LineBuilder::new().layout(layout);
            for rule in rules {
                check_keys(rule, &["style", "index", "from", "count"])?;
                let style = parse_style(rule)?;
                builder = match selection(rule)? {
                    Some(select) => builder.rule(select, style),
                    None => builder.style(style),
                };
            }
            composer.push(Box::new(builder));
        }
        "surrounding" => {
            check_keys(
                table,
                &["kind", "layout", "rule", "open", "close", "target", "nesting", "depth"],
            )?;
            let open = get_str(table, "open")?.ok_or_else(|| rule_error("missing 'open'"))?;
            let close = get_str(table, "close")?.ok_or_else(|| rule_error("missing 'close'"))?;
            let target = match get_str(table, "target")?.unwrap_or("all") {
                "all" => Target::All,
                "content" => Target::Content,
                "delimiter" => Target::Delimiter,
                "open" => Target::Open,
                "close" => Target::Close,
                other => return Err(rule_error(format!("unknown target '{}'", other))),
            };
            let nesting = match get_str(table, "nesting")?.unwrap_or("none") {
                "none" => Nesting::None,
                "balanced" => Nesting::Balanced,
                other => return Err(rule_error(format!("unknown nesting '{}'", other))),
            };
            let mut builder = SurroundingBuilder::new(open, close)?
                .target(target)
                .nesting(nesting)
                .layout(layout);
            if let Some(depth) = table.get("depth") {
                builder = builder.depth(get_index(depth, "depth")?);
            }
            for rule in rules {
                check_keys(rule, &["style", "index", "from", "count"])?;
                let style = parse_style(rule)?;
                builder = match selection(rule)? {
                    Some(select) => builder.rule(select, style),
                    None => builder.style(style),
                };
            }
            composer.push(Box::new(builder));
        }
        other => return Err(rule_error(format!("unknown layer kind '{}'", other))),
    }
    Ok(())
}

fn check_keys(table: &Table, allowed: &[&str]) -> Result<()> {
    match table.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(rule_error(format!("unexpected key '{}'", key))),
        None => Ok(()),
    }
}

fn get_str<'t>(table: &'t Table, key: &str) -> Result<Option<&'t str>> {
    match table.get(key) {
        Some(TomlValue::String(s)) => Ok(Some(s)),
        Some(_) => Err(rule_error(format!("'{}' must be a string", key))),
        None => Ok(None),
    }
}

fn get_index(value: &TomlValue, key: &str) -> Result<usize> {
    value
        .as_integer()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| rule_error(format!("'{}' must be a non-negative integer", key)))
}

fn rule_tables(table: &Table) -> Result<Vec<&Table>> {
    match table.get("rule") {
        Some(TomlValue::Array(rules)) => rules
            .iter()
            .map(|rule| rule.as_table().ok_or_else(|| rule_error("rule is not a table")))
            .collect(),
        Some(_) => Err(rule_error("'rule' must be an array of tables")),
        None => Ok(Vec::new()),
    }
}

fn class_list(value: &TomlValue, key: &str) -> Result<CharMatchers> {
    match value {
        TomlValue::String(s) => Ok(CharMatchers::from(s.as_str())),
        TomlValue::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(CharMatcher::from)
                    .ok_or_else(|| rule_error(format!("'{}' entries must be strings", key)))
            })
            .collect::<Result<Vec<_>>>()
            .map(CharMatchers::from),
        _ => Err(rule_error(format!("'{}' must be a string or array", key))),
    }
}

/// `class` and `pattern` of a charclass rule, OR-ed
fn matchers(rule: &Table) -> Result<Option<CharMatchers>> {
    let mut all: Vec<CharMatcher> = Vec::new();
    if let Some(class) = rule.get("class") {
        all.extend(class_list(class, "class")?.as_slice().iter().cloned());
    }
    if let Some(pattern) = get_str(rule, "pattern")? {
        all.push(CharMatcher::from(Regex::new(pattern)?));
    }
    Ok(match all.len() {
        0 => None,
        1 => all.pop().map(CharMatchers::One),
        _ => Some(CharMatchers::Many(all)),
    })
}

/// `index` or `from`/`count` of a position, line or surrounding rule
fn selection(rule: &Table) -> Result<Option<RangeRule>> {
    let mut parts = Vec::new();
    match rule.get("index") {
        Some(TomlValue::Array(items)) => {
            for item in items {
                parts.push(RangeRule::Index(get_index(item, "index")?));
            }
        }
        Some(value) => parts.push(RangeRule::Index(get_index(value, "index")?)),
        None => {}
    }
    match (rule.get("from"), rule.get("count")) {
        (Some(from), Some(count)) => parts.push(RangeRule::Range(Range::new(
            get_index(from, "from")?,
            get_index(count, "count")?,
        ))),
        (None, None) => {}
        _ => return Err(rule_error("'from' and 'count' go together")),
    }
    Ok(match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(RangeRule::Many(parts)),
    })
}

fn parse_style(rule: &Table) -> Result<Style> {
    let table = match rule.get("style") {
        Some(TomlValue::Table(table)) => table,
        Some(_) => return Err(rule_error("'style' must be a table")),
        None => return Err(rule_error("rule has no 'style'")),
    };
    let mut style = Style::new();
    for (name, value) in table {
        let is_color = StyleField::from_name(name).map(|f| f.kind()) == Some(ValueKind::Color);
        style.insert(name, to_value(name, value, is_color)?);
    }
    Ok(style)
}

fn parse_layout(value: &TomlValue) -> Result<Layout> {
    let table = value
        .as_table()
        .ok_or_else(|| rule_error("'layout' must be a table"))?;
    let mut layout = Layout::new();
    for (name, value) in table {
        layout.insert(name, to_value(name, value, false)?);
    }
    Ok(layout)
}

fn to_value(name: &str, value: &TomlValue, is_color: bool) -> Result<Value> {
    match value {
        TomlValue::Boolean(b) => Ok(Value::Bool(*b)),
        TomlValue::Integer(n) => Ok(Value::Number(*n as f64)),
        TomlValue::Float(n) => Ok(Value::Number(*n)),
        TomlValue::String(s) if is_color => Color::from_hex(s)
            .map(Value::Color)
            .ok_or_else(|| rule_error(format!("'{}' is not a #rrggbb colour", name))),
        TomlValue::String(s) => Ok(Value::Text(s.clone())),
        _ => Err(rule_error(format!("unsupported value for '{}'", name))),
    }
}
