use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use super::style::{
    normalize_declaration, parse_declarations, parse_stylesheet, ComputedStyle, Rgba, StyleRule,
};
use super::{AuditError, ElementSnapshot};

/// A parsed document plus its author styles. Audits only ever read it.
pub struct Page {
    html: Html,
    rules: Vec<StyleRule>,
}

pub fn selector(css: &str) -> Result<Selector, AuditError> {
    Selector::parse(css).map_err(|e| AuditError::Selector {
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })
}

impl Page {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);

        let mut rules = Vec::new();
        if let Ok(style_sel) = Selector::parse("style") {
            for block in html.select(&style_sel) {
                let css: String = block.text().collect();
                let first = rules.len();
                rules.extend(parse_stylesheet(&css, first));
            }
        }

        Self { html, rules }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, AuditError> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).collect())
    }

    pub fn exists(&self, css: &str) -> Result<bool, AuditError> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).next().is_some())
    }

    pub fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>, AuditError> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).next())
    }

    /// Text of `<body>`, or of the whole document when there is none.
    pub fn body_text(&self) -> String {
        let body = self.first("body").ok().flatten();
        match body {
            Some(b) => text_of(b),
            None => self.html.root_element().text().collect(),
        }
    }

    pub fn has_label_for(&self, id: &str) -> bool {
        self.select("label")
            .map(|labels| labels.iter().any(|l| l.value().attr("for") == Some(id)))
            .unwrap_or(false)
    }

    /// Author declarations for `el`, cascade applied. Focus rules only
    /// participate when `focused`.
    pub fn declared(&self, el: ElementRef<'_>, focused: bool) -> HashMap<String, String> {
        let mut matched: Vec<&StyleRule> = self
            .rules
            .iter()
            .filter(|r| (focused || !r.focus) && r.selector.matches(&el))
            .collect();
        matched.sort_by_key(|r| (r.specificity, r.order));

        let mut out = HashMap::new();
        for rule in matched {
            for (prop, value) in &rule.declarations {
                normalize_declaration(prop, value, &mut out);
            }
        }
        if let Some(inline) = el.value().attr("style") {
            for (prop, value) in parse_declarations(inline) {
                normalize_declaration(&prop, &value, &mut out);
            }
        }
        out
    }

    fn resolve(&self, el: ElementRef<'_>, focused: bool) -> ComputedStyle {
        let mut chain: Vec<ElementRef<'_>> = el.ancestors().filter_map(ElementRef::wrap).collect();
        chain.reverse();

        let mut style = ComputedStyle::default();
        for node in chain {
            style = style.child(node.value().name(), &self.declared(node, false));
        }
        style.child(el.value().name(), &self.declared(el, focused))
    }

    pub fn computed_style(&self, el: ElementRef<'_>) -> ComputedStyle {
        self.resolve(el, false)
    }

    pub fn focused_style(&self, el: ElementRef<'_>) -> ComputedStyle {
        self.resolve(el, true)
    }

    /// Nearest non-transparent background on `el` or its ancestors; white if none.
    pub fn effective_background(&self, el: ElementRef<'_>) -> Rgba {
        std::iter::once(el)
            .chain(el.ancestors().filter_map(ElementRef::wrap))
            .map(|node| self.computed_style(node).background)
            .find(|bg| !bg.is_transparent())
            .unwrap_or(Rgba::WHITE)
    }
}

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

pub fn tag_of(el: ElementRef<'_>) -> &str {
    el.value().name()
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

pub fn has_attr(el: ElementRef<'_>, name: &str) -> bool {
    el.value().attr(name).is_some()
}

/// Closest ancestor (not self) with the given tag.
pub fn closest<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap).find(|a| a.value().name() == tag)
}

pub fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

pub fn snapshot(el: ElementRef<'_>) -> ElementSnapshot {
    let value = el.value();
    ElementSnapshot {
        tag: value.name().to_ascii_uppercase(),
        id: value.id().map(str::to_string),
        classes: value.classes().map(str::to_string).collect(),
        excerpt: excerpt(&text_of(el), 50),
    }
}
