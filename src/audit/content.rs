use regex::Regex;
use scraper::ElementRef;
use serde::Serialize;
use std::fmt::Write as _;
use tracing::warn;

use super::dom::{attr, closest, excerpt, has_attr, snapshot, tag_of, text_of, Page};
use super::links::{has_noopener, is_external, is_placeholder};
use super::{AuditError, AuditSummary, ElementSnapshot, Severity};
use crate::config::AuditConfig;

const COPY_ELEMENTS: &str = "h1, h2, h3, h4, h5, h6, p, span, button, a";
const CTA_ELEMENTS: &str = "button, .button-primary, .button-secondary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentIssueType {
    Spelling,
    Grammar,
    Link,
    Cta,
    Consistency,
    Accessibility,
    Legal,
}

impl ContentIssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentIssueType::Spelling => "spelling",
            ContentIssueType::Grammar => "grammar",
            ContentIssueType::Link => "link",
            ContentIssueType::Cta => "cta",
            ContentIssueType::Consistency => "consistency",
            ContentIssueType::Accessibility => "accessibility",
            ContentIssueType::Legal => "legal",
        }
    }

    const ALL: [ContentIssueType; 7] = [
        ContentIssueType::Spelling,
        ContentIssueType::Grammar,
        ContentIssueType::Link,
        ContentIssueType::Cta,
        ContentIssueType::Consistency,
        ContentIssueType::Accessibility,
        ContentIssueType::Legal,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentIssue {
    #[serde(rename = "type")]
    pub kind: ContentIssueType,
    pub severity: Severity,
    pub message: String,
    pub element: Option<ElementSnapshot>,
    pub location: Option<String>,
}

impl ContentIssue {
    fn at(
        kind: ContentIssueType,
        severity: Severity,
        message: impl Into<String>,
        element: ElementRef<'_>,
        location: String,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            element: Some(snapshot(element)),
            location: Some(location),
        }
    }

    fn page(
        kind: ContentIssueType,
        severity: Severity,
        message: impl Into<String>,
        location: &str,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            element: None,
            location: Some(location.to_string()),
        }
    }
}

type Check = fn(&AuditConfig, &Page, &mut Vec<ContentIssue>) -> Result<(), AuditError>;

const CHECKS: &[(&str, Check)] = &[
    ("spelling_and_grammar", check_spelling_and_grammar),
    ("brand_consistency", check_brand_consistency),
    ("links", check_links),
    ("ctas", check_ctas),
    ("accessibility", check_accessibility),
    ("legal", check_legal_compliance),
    ("metadata", check_metadata),
];

/// Copy, link, CTA, legal and metadata review over the current page.
#[derive(Debug, Default)]
pub struct ContentReviewer {
    config: AuditConfig,
    issues: Vec<ContentIssue>,
}

impl ContentReviewer {
    pub fn new(config: AuditConfig) -> Self {
        Self { config, issues: Vec::new() }
    }

    /// Runs every check in order. Replaces the previous run's issues.
    pub fn run_checks(&mut self, page: &Page) -> &[ContentIssue] {
        self.issues.clear();
        for (name, check) in CHECKS {
            if let Err(e) = check(&self.config, page, &mut self.issues) {
                warn!(check = name, error = %e, "content check failed; continuing");
            }
        }
        &self.issues
    }

    pub fn issues(&self) -> &[ContentIssue] {
        &self.issues
    }

    /// Counts by severity, grouped by issue type.
    pub fn summary(&self) -> AuditSummary {
        AuditSummary::from_issues(
            self.issues.iter().map(|i| (i.severity, i.kind.as_str().to_string())),
        )
    }

    pub fn generate_report(&self) -> String {
        let summary = self.summary();

        let mut report = String::from("\n=== CONTENT REVIEW REPORT ===\n");
        let _ = writeln!(report, "Total Issues: {}", summary.total);
        let _ = writeln!(
            report,
            "Errors: {} | Warnings: {} | Info: {}\n",
            summary.errors, summary.warnings, summary.info
        );

        if summary.errors == 0 && summary.warnings == 0 {
            report.push_str("✅ Excellent! No critical issues found.\n");
        }

        for kind in ContentIssueType::ALL {
            let group: Vec<&ContentIssue> = self.issues.iter().filter(|i| i.kind == kind).collect();
            if group.is_empty() {
                continue;
            }
            let _ = writeln!(report, "\n--- {} ISSUES ---", kind.as_str().to_ascii_uppercase());
            for (index, issue) in group.iter().enumerate() {
                let _ = writeln!(report, "{} {}", issue.severity.icon(), issue.message);
                if let Some(location) = &issue.location {
                    let _ = writeln!(report, "   Location: {location}");
                }
                if index + 1 < group.len() {
                    report.push('\n');
                }
            }
        }

        report
    }
}

fn element_location(label: &str, index: usize, el: ElementRef<'_>, max: usize) -> String {
    format!("{label} {index}: {}...", excerpt(&text_of(el), max))
}

fn check_spelling_and_grammar(
    config: &AuditConfig,
    page: &Page,
    issues: &mut Vec<ContentIssue>,
) -> Result<(), AuditError> {
    for (index, el) in page.select(COPY_ELEMENTS)?.into_iter().enumerate() {
        let raw = text_of(el);
        let lower = raw.to_lowercase();

        for (wrong, correct) in &config.misspellings {
            if lower.contains(wrong.as_str()) {
                issues.push(ContentIssue::at(
                    ContentIssueType::Spelling,
                    Severity::Error,
                    format!("Misspelling found: \"{wrong}\" should be \"{correct}\""),
                    el,
                    element_location("Element", index, el, 50),
                ));
            }
        }

        // Source indentation is not copy; only look inside each line.
        if raw.lines().any(|line| line.trim().contains("  ")) {
            issues.push(ContentIssue::at(
                ContentIssueType::Grammar,
                Severity::Warning,
                "Double spaces found",
                el,
                element_location("Element", index, el, 50),
            ));
        }

        if tag_of(el) == "p" {
            let text = raw.trim();
            let sentences = text.split('.').filter(|s| !s.trim().is_empty()).count();
            if sentences > 1 && !text.ends_with(['.', '!', '?']) {
                issues.push(ContentIssue::at(
                    ContentIssueType::Grammar,
                    Severity::Warning,
                    "Paragraph may be missing ending punctuation",
                    el,
                    element_location("Element", index, el, 50),
                ));
            }
        }
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// True at the start of the text or right after `.`, `!` or `?` and whitespace.
fn starts_sentence(text: &str, at: usize) -> bool {
    let before = text[..at].trim_end();
    before.is_empty() || before.ends_with(['.', '!', '?'])
}

fn check_brand_consistency(
    config: &AuditConfig,
    page: &Page,
    issues: &mut Vec<ContentIssue>,
) -> Result<(), AuditError> {
    let patterns = config
        .brand_terms
        .iter()
        .map(|(term, canonical)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))
                .map(|re| (re, canonical.as_str()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (index, el) in page.select(COPY_ELEMENTS)?.into_iter().enumerate() {
        let text = text_of(el).split_whitespace().collect::<Vec<_>>().join(" ");

        for (re, canonical) in &patterns {
            for found in re.find_iter(&text) {
                let expected = if starts_sentence(&text, found.start()) {
                    capitalize(canonical)
                } else {
                    canonical.to_string()
                };
                if found.as_str() != expected {
                    issues.push(ContentIssue::at(
                        ContentIssueType::Consistency,
                        Severity::Warning,
                        format!(
                            "Brand term inconsistency: \"{}\" should be \"{expected}\"",
                            found.as_str()
                        ),
                        el,
                        element_location("Element", index, el, 50),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn check_links(
    config: &AuditConfig,
    page: &Page,
    issues: &mut Vec<ContentIssue>,
) -> Result<(), AuditError> {
    let vague = config
        .vague_link_text
        .iter()
        .map(|phrase| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase))))
        .collect::<Result<Vec<_>, _>>()?;

    for (index, link) in page.select("a")?.into_iter().enumerate() {
        let text = text_of(link);
        let text = text.trim();

        let Some(href) = attr(link, "href").filter(|h| !h.trim().is_empty()) else {
            issues.push(ContentIssue::at(
                ContentIssueType::Link,
                Severity::Error,
                "Link missing href attribute",
                link,
                element_location("Link", index, link, 30),
            ));
            continue;
        };

        if text.is_empty() {
            issues.push(ContentIssue::at(
                ContentIssueType::Link,
                Severity::Error,
                "Link has no text content",
                link,
                format!("Link {index}: href=\"{href}\""),
            ));
        }

        if is_placeholder(href) {
            issues.push(ContentIssue::at(
                ContentIssueType::Link,
                Severity::Warning,
                "Placeholder link found - needs real destination",
                link,
                element_location("Link", index, link, 30),
            ));
        }

        if is_external(href, config.site_host.as_deref()) && !has_noopener(attr(link, "rel")) {
            issues.push(ContentIssue::at(
                ContentIssueType::Link,
                Severity::Warning,
                "External link missing rel=\"noopener\" for security",
                link,
                element_location("Link", index, link, 30),
            ));
        }

        if vague.iter().any(|re| re.is_match(text)) {
            issues.push(ContentIssue::at(
                ContentIssueType::Accessibility,
                Severity::Info,
                "Link text could be more descriptive for screen readers",
                link,
                format!("Link {index}: {text}"),
            ));
        }
    }
    Ok(())
}

/// Something on or around the button would act on a click.
fn is_wired(button: ElementRef<'_>) -> bool {
    if ["onclick", "formaction", "data-href"].iter().any(|a| has_attr(button, a)) {
        return true;
    }
    if closest(button, "a").is_some_and(|a| has_attr(a, "href")) {
        return true;
    }
    let submits = tag_of(button) == "button"
        && !attr(button, "type").is_some_and(|t| {
            t.eq_ignore_ascii_case("button") || t.eq_ignore_ascii_case("reset")
        });
    submits && closest(button, "form").is_some()
}

fn check_ctas(
    config: &AuditConfig,
    page: &Page,
    issues: &mut Vec<ContentIssue>,
) -> Result<(), AuditError> {
    for (index, button) in page.select(CTA_ELEMENTS)?.into_iter().enumerate() {
        let text = text_of(button).split_whitespace().collect::<Vec<_>>().join(" ");

        if !text.chars().any(char::is_alphanumeric) {
            issues.push(ContentIssue::at(
                ContentIssueType::Cta,
                Severity::Error,
                "CTA button has no text",
                button,
                format!("Button {index}"),
            ));
            continue;
        }

        let lower = text.to_lowercase();
        if !config.action_words.iter().any(|w| lower.contains(w.as_str())) {
            issues.push(ContentIssue::at(
                ContentIssueType::Cta,
                Severity::Info,
                "CTA could use more action-oriented language",
                button,
                format!("Button {index}: \"{text}\""),
            ));
        }

        if text.chars().count() > config.cta_max_len {
            issues.push(ContentIssue::at(
                ContentIssueType::Cta,
                Severity::Warning,
                "CTA text may be too long for mobile",
                button,
                format!("Button {index}: \"{text}\""),
            ));
        }

        if !is_wired(button) {
            issues.push(ContentIssue::at(
                ContentIssueType::Cta,
                Severity::Warning,
                "CTA button may not be functional (no click handler or href)",
                button,
                format!("Button {index}: \"{text}\""),
            ));
        }
    }
    Ok(())
}

fn check_accessibility(
    _config: &AuditConfig,
    page: &Page,
    issues: &mut Vec<ContentIssue>,
) -> Result<(), AuditError> {
    for (index, img) in page.select("img")?.into_iter().enumerate() {
        let location = format!("Image {index}: src=\"{}\"", attr(img, "src").unwrap_or_default());
        match attr(img, "alt") {
            None => issues.push(ContentIssue::at(
                ContentIssueType::Accessibility,
                Severity::Error,
                "Image missing alt attribute",
                img,
                location,
            )),
            Some("") => issues.push(ContentIssue::at(
                ContentIssueType::Accessibility,
                Severity::Info,
                "Image has empty alt text - ensure this is decorative",
                img,
                location,
            )),
            Some(_) => {}
        }
    }

    let mut previous = 0u8;
    for (index, heading) in page.select("h1, h2, h3, h4, h5, h6")?.into_iter().enumerate() {
        let Some(level) = tag_of(heading).strip_prefix('h').and_then(|n| n.parse::<u8>().ok())
        else {
            continue;
        };
        if index == 0 && level != 1 {
            issues.push(ContentIssue::at(
                ContentIssueType::Accessibility,
                Severity::Warning,
                "First heading should be H1",
                heading,
                element_location("Heading", index, heading, 30),
            ));
        }
        if level > previous + 1 {
            issues.push(ContentIssue::at(
                ContentIssueType::Accessibility,
                Severity::Warning,
                format!("Heading level skipped ({previous} to {level})"),
                heading,
                element_location("Heading", index, heading, 30),
            ));
        }
        previous = level;
    }

    for (index, el) in page.select("button, a, input, select, textarea")?.into_iter().enumerate() {
        let positive = attr(el, "tabindex")
            .and_then(|t| t.trim().parse::<i32>().ok())
            .is_some_and(|t| t > 0);
        if positive {
            issues.push(ContentIssue::at(
                ContentIssueType::Accessibility,
                Severity::Warning,
                "Positive tabindex can cause accessibility issues",
                el,
                format!("Interactive element {index}"),
            ));
        }
    }
    Ok(())
}

fn check_legal_compliance(
    config: &AuditConfig,
    page: &Page,
    issues: &mut Vec<ContentIssue>,
) -> Result<(), AuditError> {
    let page_text = page.body_text().to_lowercase();

    for term in &config.legal_terms {
        if !page_text.contains(&term.to_lowercase()) {
            issues.push(ContentIssue::page(
                ContentIssueType::Legal,
                Severity::Warning,
                format!("Missing important legal/privacy term: \"{term}\""),
                "Page content",
            ));
        }
    }

    if !page.exists(r#"a[href*="privacy"]"#)? {
        issues.push(ContentIssue::page(
            ContentIssueType::Legal,
            Severity::Error,
            "No privacy policy link found",
            "Footer or legal section",
        ));
    }

    if !page.exists(r#"a[href*="terms"]"#)? {
        issues.push(ContentIssue::page(
            ContentIssueType::Legal,
            Severity::Warning,
            "No terms of service link found",
            "Footer or legal section",
        ));
    }
    Ok(())
}

fn within(len: usize, (min, max): (usize, usize)) -> bool {
    (min..=max).contains(&len)
}

fn check_metadata(
    config: &AuditConfig,
    page: &Page,
    issues: &mut Vec<ContentIssue>,
) -> Result<(), AuditError> {
    let title_len = page.first("title")?.map(|t| text_of(t).trim().chars().count()).unwrap_or(0);
    if !within(title_len, config.title_len) {
        let (min, max) = config.title_len;
        let mut issue = ContentIssue::page(
            ContentIssueType::Consistency,
            Severity::Warning,
            format!("Page title should be {min}-{max} characters for SEO"),
            "Head section",
        );
        issue.element = page.first("title")?.map(snapshot);
        issues.push(issue);
    }

    let description = page.first(r#"meta[name="description"]"#)?;
    let description_len = description
        .and_then(|m| attr(m, "content"))
        .map(|c| c.chars().count())
        .unwrap_or(0);
    if !within(description_len, config.description_len) {
        let (min, max) = config.description_len;
        let mut issue = ContentIssue::page(
            ContentIssueType::Consistency,
            Severity::Warning,
            format!("Meta description should be {min}-{max} characters for SEO"),
            "Head section",
        );
        issue.element = description.map(snapshot);
        issues.push(issue);
    }

    let og_complete = ["og:title", "og:description", "og:image"]
        .iter()
        .map(|p| page.exists(&format!(r#"meta[property="{p}"]"#)))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .all(|present| present);
    if !og_complete {
        issues.push(ContentIssue::page(
            ContentIssueType::Consistency,
            Severity::Info,
            "Missing Open Graph tags for social media sharing",
            "Head section",
        ));
    }
    Ok(())
}
