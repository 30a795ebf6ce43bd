use reqwest::Url;
use serde::Serialize;
use std::fmt::Write as _;

use super::dom::{attr, text_of, Page};
use super::AuditError;

const PLACEHOLDER_HREFS: &[&str] = &["#", "#!", "javascript:void(0)"];

/// `#`, `#!` and `javascript:void(0)`. In-page anchors such as `#faq` are real destinations.
pub fn is_placeholder(href: &str) -> bool {
    PLACEHOLDER_HREFS.contains(&href.trim())
}

/// An absolute http(s) link to a host other than `site_host` or one of its subdomains.
/// Without a known site host every absolute http(s) link counts as external.
pub fn is_external(href: &str, site_host: Option<&str>) -> bool {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return false;
    }
    let (Some(site), Ok(url)) = (site_host, Url::parse(href)) else {
        return true;
    };
    match url.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            let site = site.trim().to_ascii_lowercase();
            !(host == site || host.ends_with(&format!(".{site}")))
        }
        None => true,
    }
}

pub fn has_noopener(rel: Option<&str>) -> bool {
    rel.is_some_and(|r| r.split_whitespace().any(|t| t.eq_ignore_ascii_case("noopener")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEntry {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    pub total: usize,
    pub internal: usize,
    pub external: usize,
    pub placeholders: usize,
    pub placeholder_links: Vec<LinkEntry>,
    pub external_links: Vec<LinkEntry>,
    /// External hrefs without `rel="noopener"`.
    pub missing_noopener: Vec<String>,
}

impl LinkSummary {
    /// Classifies every `a[href]` on the page.
    pub fn collect(page: &Page, site_host: Option<&str>) -> Result<Self, AuditError> {
        let mut summary = LinkSummary::default();

        for link in page.select("a[href]")? {
            let Some(href) = attr(link, "href") else { continue };
            summary.total += 1;
            let entry = LinkEntry {
                text: text_of(link).trim().to_string(),
                href: href.to_string(),
            };

            if is_placeholder(href) {
                summary.placeholders += 1;
                summary.placeholder_links.push(entry);
            } else if is_external(href, site_host) {
                summary.external += 1;
                if !has_noopener(attr(link, "rel")) {
                    summary.missing_noopener.push(href.to_string());
                }
                summary.external_links.push(entry);
            } else {
                summary.internal += 1;
            }
        }

        Ok(summary)
    }

    pub fn render(&self) -> String {
        let mut out = String::from("\n🔗 LINK VALIDATION TEST\n\n");
        for link in &self.placeholder_links {
            let _ = writeln!(out, "⚠️  Placeholder link: \"{}\" -> {}", link.text, link.href);
        }
        for link in &self.external_links {
            let _ = writeln!(out, "🌐 External: \"{}\" -> {}", link.text, link.href);
        }
        for href in &self.missing_noopener {
            let _ = writeln!(out, "⚠️  External link missing rel=\"noopener\": {href}");
        }

        out.push_str("\n📊 Link Summary:\n");
        let _ = writeln!(out, "   Total: {}", self.total);
        let _ = writeln!(out, "   Internal: {}", self.internal);
        let _ = writeln!(out, "   External: {}", self.external);
        let _ = writeln!(out, "   Placeholders: {}", self.placeholders);

        if self.placeholders > 0 {
            let _ = writeln!(
                out,
                "⚠️  {} placeholder links need real destinations",
                self.placeholders
            );
        } else {
            out.push_str("✅ No placeholder links found\n");
        }
        out
    }
}
