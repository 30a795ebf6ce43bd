//! Just enough CSS to resolve the styles the audits look at.
//!
//! Rules come from `<style>` blocks and inline `style` attributes. Selectors
//! are matched with `scraper`; the cascade orders by (rough) specificity and
//! then source order. `!important`, media queries and pseudo-elements are
//! ignored. Rules targeting `:focus` / `:focus-visible` are kept apart and
//! only apply when resolving the focused state of an element.

use scraper::Selector;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

fn named_color(name: &str) -> Option<Rgba> {
    let c = match name {
        "black" => Rgba::BLACK,
        "white" => Rgba::WHITE,
        "transparent" => Rgba::TRANSPARENT,
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        "silver" => Rgba::rgb(192, 192, 192),
        "lightgray" | "lightgrey" => Rgba::rgb(211, 211, 211),
        "darkgray" | "darkgrey" => Rgba::rgb(169, 169, 169),
        "yellow" => Rgba::rgb(255, 255, 0),
        "orange" => Rgba::rgb(255, 165, 0),
        "purple" => Rgba::rgb(128, 0, 128),
        "navy" => Rgba::rgb(0, 0, 128),
        "teal" => Rgba::rgb(0, 128, 128),
        "maroon" => Rgba::rgb(128, 0, 0),
        _ => return None,
    };
    Some(c)
}

/// Parses `rgb()`, `rgba()`, `#rgb`, `#rrggbb`, `#rrggbbaa` and a few names.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let v = value.trim().to_ascii_lowercase();

    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(args) = v.strip_prefix("rgba(").or_else(|| v.strip_prefix("rgb(")) {
        let args = args.strip_suffix(')')?;
        let parts: Vec<&str> = args
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            s.parse::<f64>().ok().map(|n| n.round().clamp(0.0, 255.0) as u8)
        };
        let alpha = match parts.get(3) {
            Some(p) => match p.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? / 100.0,
                None => p.parse::<f64>().ok()?,
            },
            None => 1.0,
        };
        return Some(Rgba {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a: alpha,
        });
    }

    named_color(&v)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    let digit = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| digit(&hex[i..i + 1].repeat(2));
            Some(Rgba::rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        6 | 8 => {
            let mut c = Rgba::rgb(digit(&hex[0..2])?, digit(&hex[2..4])?, digit(&hex[4..6])?);
            if hex.len() == 8 {
                c.a = digit(&hex[6..8])? as f64 / 255.0;
            }
            Some(c)
        }
        _ => None,
    }
}

/// `property: value; ...` into lowercase property names and trimmed values.
pub fn parse_declarations(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim().to_string();
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            Some((prop, value))
        })
        .collect()
}

pub struct StyleRule {
    pub selector: Selector,
    pub focus: bool,
    pub specificity: (u32, u32, u32),
    pub order: usize,
    pub declarations: Vec<(String, String)>,
}

fn specificity(selector: &str) -> (u32, u32, u32) {
    let ids = selector.matches('#').count() as u32;
    let classes = (selector.matches('.').count()
        + selector.matches('[').count()
        + selector.matches(':').count()
        - 2 * selector.matches("::").count()) as u32;
    let types = selector
        .split(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
        .filter(|part| part.chars().next().is_some_and(|c| c.is_ascii_alphabetic()))
        .count() as u32;
    (ids, classes, types)
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Parses a stylesheet into rules, numbering them from `first_order`.
/// At-rule blocks are skipped whole.
pub fn parse_stylesheet(css: &str, first_order: usize) -> Vec<StyleRule> {
    let css = strip_comments(css);
    let mut rules = Vec::new();
    let mut order = first_order;
    let mut rest = css.as_str();

    while let Some(open) = rest.find('{') {
        let prelude = rest[..open].trim();

        // find the matching close brace
        let mut depth = 0usize;
        let mut close = None;
        for (i, ch) in rest[open..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else { break };
        let body = &rest[open + 1..close];
        rest = &rest[close + 1..];

        if prelude.starts_with('@') {
            continue;
        }

        let declarations = parse_declarations(body);
        for raw in prelude.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if raw.contains(":focus-within") {
                continue;
            }
            let focus = raw.contains(":focus");
            let stripped = raw.replace(":focus-visible", "").replace(":focus", "");
            let stripped = match stripped.trim() {
                "" => "*".to_string(),
                s => s.to_string(),
            };

            match Selector::parse(&stripped) {
                Ok(selector) => {
                    rules.push(StyleRule {
                        selector,
                        focus,
                        specificity: specificity(raw),
                        order,
                        declarations: declarations.clone(),
                    });
                    order += 1;
                }
                Err(e) => debug!(selector = raw, error = ?e, "skipping unsupported selector"),
            };
        }
    }

    rules
}

/// The resolved properties the audits consume.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub color: Rgba,
    pub background: Rgba,
    pub font_size_px: f64,
    pub font_weight: u16,
    pub outline: Option<String>,
    pub box_shadow: Option<String>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            background: Rgba::TRANSPARENT,
            font_size_px: 16.0,
            font_weight: 400,
            outline: None,
            box_shadow: None,
        }
    }
}

impl ComputedStyle {
    /// Style of a child element: inherits color and font, then applies the
    /// user-agent defaults for `tag` and the declared properties.
    pub fn child(&self, tag: &str, declared: &HashMap<String, String>) -> Self {
        let mut style = Self {
            color: self.color,
            background: Rgba::TRANSPARENT,
            font_size_px: self.font_size_px,
            font_weight: self.font_weight,
            outline: None,
            box_shadow: None,
        };

        let (scale, bold) = match tag {
            "h1" => (2.0, true),
            "h2" => (1.5, true),
            "h3" => (1.17, true),
            "h4" => (1.0, true),
            "h5" => (0.83, true),
            "h6" => (0.67, true),
            "b" | "strong" | "th" => (1.0, true),
            _ => (1.0, false),
        };
        style.font_size_px *= scale;
        if bold {
            style.font_weight = 700;
        }

        for (prop, value) in declared {
            match prop.as_str() {
                "color" => {
                    if let Some(c) = parse_color(value) {
                        style.color = c;
                    }
                }
                "background-color" => {
                    if let Some(c) = parse_color(value) {
                        style.background = c;
                    }
                }
                "font-size" => {
                    if let Some(px) = parse_font_size(value, self.font_size_px) {
                        style.font_size_px = px;
                    }
                }
                "font-weight" => style.font_weight = parse_font_weight(value, self.font_weight),
                "outline" => style.outline = Some(value.clone()),
                "box-shadow" => style.box_shadow = Some(value.clone()),
                _ => {}
            }
        }

        style
    }

    pub fn font_size_pt(&self) -> f64 {
        self.font_size_px * 0.75
    }
}

/// Folds shorthands into the longhands the resolver understands.
pub fn normalize_declaration(prop: &str, value: &str, into: &mut HashMap<String, String>) {
    match prop {
        "background" => {
            let color =
                value.split_whitespace().find_map(|token| parse_color(token).map(|_| token));
            if let Some(token) = color {
                into.insert("background-color".to_string(), token.to_string());
            } else if value.trim() == "none" {
                into.insert("background-color".to_string(), "transparent".to_string());
            }
        }
        "outline-style" if value.trim() == "none" => {
            into.insert("outline".to_string(), "none".to_string());
        }
        "outline-width" if is_zero_length(value) => {
            into.insert("outline".to_string(), "0".to_string());
        }
        _ => {
            into.insert(prop.to_string(), value.to_string());
        }
    }
}

pub fn is_zero_length(value: &str) -> bool {
    let v = value.trim();
    let number = v.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    number.parse::<f64>().map(|n| n == 0.0).unwrap_or(false)
}

fn parse_font_size(value: &str, parent_px: f64) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    let keyword = match v.as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }

    let unit_start = v.find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))?;
    let (number, unit) = v.split_at(unit_start);
    let n: f64 = number.parse().ok()?;
    match unit {
        "px" => Some(n),
        "pt" => Some(n / 0.75),
        "em" => Some(n * parent_px),
        "rem" => Some(n * 16.0),
        "%" => Some(n / 100.0 * parent_px),
        _ => None,
    }
}

fn parse_font_weight(value: &str, parent: u16) -> u16 {
    match value.trim() {
        "normal" => 400,
        "bold" => 700,
        "bolder" => (parent + 300).min(900),
        "lighter" => parent.saturating_sub(300).max(100),
        v => v.parse().unwrap_or(parent),
    }
}
