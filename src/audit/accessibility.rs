use scraper::ElementRef;
use serde::Serialize;
use std::fmt::Write as _;
use tracing::warn;

use super::contrast::{contrast_ratio, is_large_text, required_aa, required_aaa};
use super::dom::{attr, has_attr, snapshot, tag_of, text_of, Page};
use super::style::is_zero_length;
use super::{AuditError, AuditSummary, ElementSnapshot, Severity, WcagLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityIssueType {
    ColorContrast,
    KeyboardNavigation,
    ScreenReader,
    FocusManagement,
    AriaLabels,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContrastFinding {
    pub ratio: f64,
    pub required: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessibilityIssue {
    #[serde(rename = "type")]
    pub kind: AccessibilityIssueType,
    pub severity: Severity,
    pub message: String,
    pub element: Option<ElementSnapshot>,
    pub wcag_level: WcagLevel,
    pub wcag_criterion: String,
    pub contrast: Option<ContrastFinding>,
}

impl AccessibilityIssue {
    fn new(
        kind: AccessibilityIssueType,
        severity: Severity,
        message: impl Into<String>,
        element: Option<ElementRef<'_>>,
        wcag_level: WcagLevel,
        wcag_criterion: &str,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            element: element.map(snapshot),
            wcag_level,
            wcag_criterion: wcag_criterion.to_string(),
            contrast: None,
        }
    }
}

const TEXT_ELEMENTS: &str = "p, h1, h2, h3, h4, h5, h6, span, a, button, input, label";
const INTERACTIVE_ELEMENTS: &str =
    r#"a, button, input, select, textarea, [tabindex], [role="button"], [role="link"]"#;
const FOCUSABLE_ELEMENTS: &str =
    r#"a, button, input, select, textarea, [tabindex]:not([tabindex="-1"])"#;
const NATIVELY_FOCUSABLE: &[&str] = &["a", "button", "input", "select", "textarea"];
const INTERACTIVE_ROLES: &[&str] = &["button", "link", "tab", "menuitem", "option"];

type Check = fn(&Page, &mut Vec<AccessibilityIssue>) -> Result<(), AuditError>;

const CHECKS: &[(&str, Check)] = &[
    ("color_contrast", check_color_contrast),
    ("keyboard_navigation", check_keyboard_navigation),
    ("screen_reader", check_screen_reader_support),
    ("focus_management", check_focus_visibility),
    ("aria_labels", check_aria_labels),
    ("semantic_html", check_semantic_landmarks),
];

/// WCAG-oriented checks over the current page.
#[derive(Debug, Default)]
pub struct AccessibilityTester {
    issues: Vec<AccessibilityIssue>,
}

impl AccessibilityTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every check in order. Replaces the previous run's issues.
    pub fn run_checks(&mut self, page: &Page) -> &[AccessibilityIssue] {
        self.issues.clear();
        for (name, check) in CHECKS {
            if let Err(e) = check(page, &mut self.issues) {
                warn!(check = name, error = %e, "accessibility check failed; continuing");
            }
        }
        &self.issues
    }

    pub fn issues(&self) -> &[AccessibilityIssue] {
        &self.issues
    }

    /// Counts by severity, grouped by WCAG level.
    pub fn summary(&self) -> AuditSummary {
        AuditSummary::from_issues(
            self.issues.iter().map(|i| (i.severity, i.wcag_level.to_string())),
        )
    }

    /// Text report of the last run. Empty counts if nothing has run yet.
    pub fn generate_report(&self) -> String {
        let summary = self.summary();
        let level = |l: WcagLevel| summary.groups.get(&l.to_string()).copied().unwrap_or(0);

        let mut report = String::from("\n=== ACCESSIBILITY REPORT ===\n");
        let _ = writeln!(report, "Total Issues: {}", summary.total);
        let _ = writeln!(
            report,
            "Errors: {} | Warnings: {} | Info: {}\n",
            summary.errors, summary.warnings, summary.info
        );

        if summary.errors == 0 {
            report.push_str("✅ No critical accessibility errors found!\n");
        } else {
            let _ = writeln!(
                report,
                "❌ {} critical accessibility issues need fixing",
                summary.errors
            );
        }

        report.push_str("\nWCAG Compliance:\n");
        let _ = writeln!(report, "Level A: {} issues", level(WcagLevel::A));
        let _ = writeln!(report, "Level AA: {} issues", level(WcagLevel::AA));
        let _ = writeln!(report, "Level AAA: {} issues\n", level(WcagLevel::AAA));

        for issue in &self.issues {
            let _ = writeln!(
                report,
                "{} [{}] {}",
                issue.severity.icon(),
                issue.wcag_level,
                issue.message
            );
            let _ = writeln!(report, "   WCAG: {}", issue.wcag_criterion);
            if let Some(el) = &issue.element {
                let _ = writeln!(report, "   Element: {el}");
            }
            report.push('\n');
        }

        report
    }
}

fn check_color_contrast(
    page: &Page,
    issues: &mut Vec<AccessibilityIssue>,
) -> Result<(), AuditError> {
    for el in page.select(TEXT_ELEMENTS)? {
        if tag_of(el) != "input" && text_of(el).trim().is_empty() {
            continue;
        }

        let style = page.computed_style(el);
        let background = page.effective_background(el);
        let ratio = contrast_ratio(style.color, background);
        let large = is_large_text(&style);

        let aa = required_aa(large);
        if ratio < aa {
            let mut issue = AccessibilityIssue::new(
                AccessibilityIssueType::ColorContrast,
                Severity::Error,
                format!("Insufficient color contrast: {ratio:.2}:1 (required: {aa}:1)"),
                Some(el),
                WcagLevel::AA,
                "1.4.3 Contrast (Minimum)",
            );
            issue.contrast = Some(ContrastFinding { ratio, required: aa });
            issues.push(issue);
        }

        let aaa = required_aaa(large);
        if ratio < aaa {
            let mut issue = AccessibilityIssue::new(
                AccessibilityIssueType::ColorContrast,
                Severity::Info,
                format!("Below AAA contrast standard: {ratio:.2}:1 (AAA requires: {aaa}:1)"),
                Some(el),
                WcagLevel::AAA,
                "1.4.6 Contrast (Enhanced)",
            );
            issue.contrast = Some(ContrastFinding { ratio, required: aaa });
            issues.push(issue);
        }
    }
    Ok(())
}

fn is_natively_focusable(el: ElementRef<'_>) -> bool {
    NATIVELY_FOCUSABLE.contains(&tag_of(el))
}

/// The element's tab index as a browser would report it.
fn tab_index(el: ElementRef<'_>) -> i32 {
    match attr(el, "tabindex").and_then(|v| v.trim().parse::<i32>().ok()) {
        Some(n) => n,
        None if is_natively_focusable(el) => 0,
        None => -1,
    }
}

fn check_keyboard_navigation(
    page: &Page,
    issues: &mut Vec<AccessibilityIssue>,
) -> Result<(), AuditError> {
    for el in page.select(INTERACTIVE_ELEMENTS)? {
        let native = is_natively_focusable(el);

        if tab_index(el) < 0 && !native {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::KeyboardNavigation,
                Severity::Error,
                "Interactive element not keyboard accessible",
                Some(el),
                WcagLevel::A,
                "2.1.1 Keyboard",
            ));
        }

        let has_keyboard_handler =
            ["onkeydown", "onkeyup", "onkeypress"].iter().any(|h| has_attr(el, h));
        if has_attr(el, "onclick") && !has_keyboard_handler && !native {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::KeyboardNavigation,
                Severity::Warning,
                "Click handler without keyboard equivalent",
                Some(el),
                WcagLevel::A,
                "2.1.1 Keyboard",
            ));
        }
    }
    Ok(())
}

fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    tag_of(el).strip_prefix('h').and_then(|n| n.parse().ok())
}

fn check_screen_reader_support(
    page: &Page,
    issues: &mut Vec<AccessibilityIssue>,
) -> Result<(), AuditError> {
    // 1. heading outline
    let mut previous = 0u8;
    for (index, heading) in page.select("h1, h2, h3, h4, h5, h6")?.into_iter().enumerate() {
        let Some(level) = heading_level(heading) else { continue };

        if index == 0 && level != 1 {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::ScreenReader,
                Severity::Error,
                "Page should start with H1",
                Some(heading),
                WcagLevel::A,
                "1.3.1 Info and Relationships",
            ));
        }
        if level > previous + 1 {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::ScreenReader,
                Severity::Warning,
                format!("Heading level skipped (H{previous} to H{level})"),
                Some(heading),
                WcagLevel::A,
                "1.3.1 Info and Relationships",
            ));
        }
        previous = level;
    }

    // 2. image alternatives
    for img in page.select("img")? {
        match attr(img, "alt") {
            None => issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::ScreenReader,
                Severity::Error,
                "Image missing alt attribute",
                Some(img),
                WcagLevel::A,
                "1.1.1 Non-text Content",
            )),
            Some(alt) if alt.trim().is_empty() => issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::ScreenReader,
                Severity::Info,
                "Image has empty alt text; treated as decorative",
                Some(img),
                WcagLevel::A,
                "1.1.1 Non-text Content",
            )),
            Some(_) => {}
        }
    }

    // 3. form labels
    for input in page.select("input, select, textarea")? {
        if attr(input, "type").is_some_and(|t| t.eq_ignore_ascii_case("hidden")) {
            continue;
        }
        let labelled = attr(input, "id").is_some_and(|id| page.has_label_for(id))
            || has_attr(input, "aria-label")
            || has_attr(input, "aria-labelledby")
            || super::dom::closest(input, "label").is_some();

        if !labelled {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::ScreenReader,
                Severity::Error,
                "Form input missing label",
                Some(input),
                WcagLevel::A,
                "1.3.1 Info and Relationships",
            ));
        }
    }

    Ok(())
}

fn outline_visible(outline: Option<&str>) -> bool {
    match outline {
        // user-agent focus ring
        None => true,
        Some(v) => {
            let tokens: Vec<&str> = v.split_whitespace().collect();
            let hidden =
                tokens.contains(&"none") || tokens.first().map_or(true, |t| is_zero_length(t));
            !hidden
        }
    }
}

fn check_focus_visibility(
    page: &Page,
    issues: &mut Vec<AccessibilityIssue>,
) -> Result<(), AuditError> {
    for el in page.select(FOCUSABLE_ELEMENTS)? {
        if has_attr(el, "disabled")
            || attr(el, "type").is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        {
            continue;
        }

        // Focus is simulated on a resolved copy of the style; the page itself is untouched.
        let resting = page.computed_style(el);
        let focused = page.focused_style(el);

        let has_outline = outline_visible(focused.outline.as_deref());
        let has_box_shadow = focused.box_shadow.as_deref().is_some_and(|v| v.trim() != "none");
        let has_background = focused.background != resting.background;

        if !has_outline && !has_box_shadow && !has_background {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::FocusManagement,
                Severity::Error,
                "No visible focus indicator",
                Some(el),
                WcagLevel::AA,
                "2.4.7 Focus Visible",
            ));
        }
    }
    Ok(())
}

fn check_aria_labels(page: &Page, issues: &mut Vec<AccessibilityIssue>) -> Result<(), AuditError> {
    for el in page.select("[role]")? {
        let role = attr(el, "role").unwrap_or_default().trim();
        if !INTERACTIVE_ROLES.contains(&role) {
            continue;
        }
        let named = !text_of(el).trim().is_empty()
            || has_attr(el, "aria-label")
            || has_attr(el, "aria-labelledby");
        if !named {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::AriaLabels,
                Severity::Error,
                format!("Interactive element with role=\"{role}\" missing accessible name"),
                Some(el),
                WcagLevel::A,
                "4.1.2 Name, Role, Value",
            ));
        }
    }

    for el in page.select("[aria-controls]")? {
        if !has_attr(el, "aria-expanded") {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::AriaLabels,
                Severity::Warning,
                "Collapsible element missing aria-expanded",
                Some(el),
                WcagLevel::AA,
                "4.1.2 Name, Role, Value",
            ));
        }
    }
    Ok(())
}

fn check_semantic_landmarks(
    page: &Page,
    issues: &mut Vec<AccessibilityIssue>,
) -> Result<(), AuditError> {
    if !page.exists("main, [role=\"main\"]")? {
        issues.push(AccessibilityIssue::new(
            AccessibilityIssueType::ScreenReader,
            Severity::Warning,
            "Page missing main landmark",
            None,
            WcagLevel::A,
            "1.3.1 Info and Relationships",
        ));
    }

    for list in page.select("ul, ol")? {
        let has_item =
            list.children().filter_map(ElementRef::wrap).any(|c| c.value().name() == "li");
        if !has_item {
            issues.push(AccessibilityIssue::new(
                AccessibilityIssueType::ScreenReader,
                Severity::Warning,
                "Empty list element",
                Some(list),
                WcagLevel::A,
                "1.3.1 Info and Relationships",
            ));
        }
    }
    Ok(())
}
