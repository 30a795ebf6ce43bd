use planety::audit::accessibility::{AccessibilityIssue, AccessibilityIssueType};
use planety::audit::content::{ContentIssue, ContentIssueType};
use planety::audit::contrast::{contrast_ratio, is_large_text};
use planety::audit::forms::{FormEntry, FormReport};
use planety::audit::links::{is_external, LinkSummary};
use planety::audit::performance::{PerformanceSample, PerformanceSnapshot};
use planety::audit::style::{parse_color, ComputedStyle, Rgba};
use planety::audit::{AccessibilityTester, ContentReviewer, Page, Severity, WcagLevel};
use planety::config::AuditConfig;

fn page(body: &str) -> Page {
    Page::parse(&format!(
        "<!DOCTYPE html><html><head><title>t</title></head><body>{body}</body></html>"
    ))
}

fn a11y(page: &Page) -> Vec<AccessibilityIssue> {
    AccessibilityTester::new().run_checks(page).to_vec()
}

fn content(page: &Page) -> Vec<ContentIssue> {
    ContentReviewer::new(AuditConfig::default()).run_checks(page).to_vec()
}

fn of_kind(
    issues: &[AccessibilityIssue],
    kind: AccessibilityIssueType,
) -> Vec<&AccessibilityIssue> {
    issues.iter().filter(|i| i.kind == kind).collect()
}

fn content_of_kind(issues: &[ContentIssue], kind: ContentIssueType) -> Vec<&ContentIssue> {
    issues.iter().filter(|i| i.kind == kind).collect()
}

// Colour math

#[test]
fn test_contrast_ratio_extremes() {
    let ratio = contrast_ratio(Rgba::BLACK, Rgba::WHITE);
    assert!((ratio - 21.0).abs() < 0.01);
    assert!((contrast_ratio(Rgba::WHITE, Rgba::WHITE) - 1.0).abs() < 1e-9);
    assert_eq!(contrast_ratio(Rgba::BLACK, Rgba::WHITE), contrast_ratio(Rgba::WHITE, Rgba::BLACK));
}

#[test]
fn test_parse_color_forms() {
    assert_eq!(parse_color("#fff"), Some(Rgba::WHITE));
    assert_eq!(parse_color("#000000"), Some(Rgba::BLACK));
    assert_eq!(parse_color("rgb(200, 200, 200)"), Some(Rgba::rgb(200, 200, 200)));
    assert_eq!(parse_color("rgb(10 20 30)"), Some(Rgba::rgb(10, 20, 30)));
    assert!(parse_color("rgba(0, 0, 0, 0)").unwrap().is_transparent());
    assert_eq!(parse_color("transparent").map(|c| c.is_transparent()), Some(true));
    assert_eq!(parse_color("#zzz"), None);
    assert_eq!(parse_color("#ééé"), None);
    assert_eq!(parse_color("var(--brand)"), None);
}

#[test]
fn test_large_text_thresholds() {
    let mut style = ComputedStyle::default();
    assert!(!is_large_text(&style));
    style.font_size_px = 24.0; // 18pt
    assert!(is_large_text(&style));
    style.font_size_px = 18.67; // 14pt
    assert!(!is_large_text(&style));
    style.font_weight = 700;
    assert!(is_large_text(&style));
}

// Accessibility: contrast

#[test]
fn test_black_on_white_has_no_contrast_errors() {
    let p = page(
        r#"<main>
             <p style="color: rgb(0,0,0); background-color: rgb(255,255,255)">Hello there</p>
           </main>"#,
    );
    let issues = a11y(&p);
    assert!(of_kind(&issues, AccessibilityIssueType::ColorContrast).is_empty());
}

#[test]
fn test_light_grey_text_is_one_aa_error() {
    let p = page(
        r#"<main>
             <p style="color: rgb(200,200,200); background-color: rgb(255,255,255)">Faint</p>
           </main>"#,
    );
    let issues = a11y(&p);
    let contrast = of_kind(&issues, AccessibilityIssueType::ColorContrast);

    let errors: Vec<_> = contrast.iter().filter(|i| i.severity == Severity::Error).collect();
    assert_eq!(errors.len(), 1);
    let err = errors[0];
    assert_eq!(err.wcag_level, WcagLevel::AA);
    let finding = err.contrast.expect("ratio recorded");
    assert_eq!(finding.required, 4.5);
    assert!((finding.ratio - 1.67).abs() < 0.01, "ratio was {}", finding.ratio);
    assert!(err.message.contains("1.67:1"));

    // the AAA shortfall is informational only
    let infos: Vec<_> = contrast.iter().filter(|i| i.severity == Severity::Info).collect();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].wcag_level, WcagLevel::AAA);
}

#[test]
fn test_contrast_uses_stylesheet_and_ancestor_background() {
    let p = page(
        r#"<style>
             .muted { color: #c8c8c8; }
             .dark { background: #000 url(stars.png); }
           </style>
           <main>
             <p class="muted">Faint copy</p>
             <div class="dark"><p>Black on black</p></div>
             <div class="dark"><p style="color: #fff">White on black</p></div>
           </main>"#,
    );
    let issues = a11y(&p);
    let aa: Vec<_> = of_kind(&issues, AccessibilityIssueType::ColorContrast)
        .into_iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    assert_eq!(aa.len(), 2);
    assert_eq!(aa[0].element.as_ref().unwrap().classes, vec!["muted"]);
    assert!(aa[1].element.as_ref().unwrap().excerpt.contains("Black on black"));
}

#[test]
fn test_large_text_uses_relaxed_threshold() {
    // #949494 on white is about 3.03:1
    let p = page(
        r#"<main>
             <h1 style="color: #949494">Big title</h1>
             <p style="color: #949494">Small copy</p>
           </main>"#,
    );
    let issues = a11y(&p);
    let aa: Vec<_> = of_kind(&issues, AccessibilityIssueType::ColorContrast)
        .into_iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    assert_eq!(aa.len(), 1);
    assert_eq!(aa[0].element.as_ref().unwrap().tag, "P");
}

// Accessibility: screen reader structure

#[test]
fn test_missing_alt_is_exactly_one_error() {
    let p = page(r#"<main><img src="hero.png"></main>"#);
    let issues = a11y(&p);
    let errors: Vec<_> = issues.iter().filter(|i| i.severity == Severity::Error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, AccessibilityIssueType::ScreenReader);
    assert_eq!(errors[0].wcag_criterion, "1.1.1 Non-text Content");
    assert_eq!(errors[0].element.as_ref().unwrap().tag, "IMG");
}

#[test]
fn test_empty_alt_is_info_only() {
    let p = page(r#"<main><img src="divider.png" alt=""></main>"#);
    let issues = a11y(&p);
    assert!(issues.iter().all(|i| i.severity != Severity::Error));
    assert_eq!(issues.iter().filter(|i| i.severity == Severity::Info).count(), 1);
}

#[test]
fn test_heading_outline() {
    let p = page("<main><h2>Welcome</h2><h3>Sub</h3><h5>Deep</h5></main>");
    let issues = a11y(&p);
    let sr = of_kind(&issues, AccessibilityIssueType::ScreenReader);

    assert!(sr
        .iter()
        .any(|i| i.severity == Severity::Error && i.message == "Page should start with H1"));
    let skips: Vec<_> =
        sr.iter().filter(|i| i.message.starts_with("Heading level skipped")).collect();
    assert_eq!(skips.len(), 2);
    assert!(skips[1].message.contains("H3 to H5"));
}

#[test]
fn test_form_controls_need_labels() {
    let p = page(
        r#"<main>
             <label for="email">Email</label><input id="email" type="email">
             <label>Name <input type="text"></label>
             <input aria-label="Search">
             <input type="hidden" name="token">
             <select name="plan"><option>Free</option></select>
           </main>"#,
    );
    let issues = a11y(&p);
    let unlabelled: Vec<_> = of_kind(&issues, AccessibilityIssueType::ScreenReader)
        .into_iter()
        .filter(|i| i.message == "Form input missing label")
        .collect();
    assert_eq!(unlabelled.len(), 1);
    assert_eq!(unlabelled[0].element.as_ref().unwrap().tag, "SELECT");
}

// Accessibility: keyboard, focus, ARIA, landmarks

#[test]
fn test_keyboard_navigation() {
    let p = page(
        r#"<main>
             <div role="button" onclick="open()">Open</div>
             <div role="button" tabindex="0" onclick="open()" onkeydown="open()">Open too</div>
             <button onclick="go()">Native</button>
           </main>"#,
    );
    let issues = a11y(&p);
    let kb = of_kind(&issues, AccessibilityIssueType::KeyboardNavigation);
    assert_eq!(kb.len(), 2);
    assert!(kb.iter().any(|i| i.severity == Severity::Error));
    assert!(kb.iter().any(|i| i.severity == Severity::Warning));
    assert!(kb.iter().all(|i| i.element.as_ref().unwrap().excerpt == "Open"));
}

#[test]
fn test_default_focus_ring_counts_as_visible() {
    let p = page(r#"<main><button>Join</button><a href="/about">About</a></main>"#);
    let issues = a11y(&p);
    assert!(of_kind(&issues, AccessibilityIssueType::FocusManagement).is_empty());
}

#[test]
fn test_suppressed_outline_without_replacement_is_flagged() {
    let p = page(
        r#"<style>
             button:focus { outline: none; }
             a:focus-visible { outline: 0; box-shadow: 0 0 0 3px #3b82f6; }
             .pill:focus { outline-style: none; background-color: #eef; }
           </style>
           <main>
             <button>Join</button>
             <a href="/about">About</a>
             <input class="pill" aria-label="Email">
             <button disabled>Off</button>
           </main>"#,
    );
    let issues = a11y(&p);
    let focus = of_kind(&issues, AccessibilityIssueType::FocusManagement);
    assert_eq!(focus.len(), 1);
    assert_eq!(focus[0].element.as_ref().unwrap().excerpt, "Join");
    assert_eq!(focus[0].wcag_level, WcagLevel::AA);
    assert_eq!(focus[0].wcag_criterion, "2.4.7 Focus Visible");
}

#[test]
fn test_outline_shorthand_with_none_style_is_flagged() {
    let p = page(
        r#"<style>
             .ghost:focus { outline: 2px none; }
             .ring:focus { outline: 2px solid #1d4ed8; }
           </style>
           <main>
             <button class="ghost">Ghost</button>
             <button class="ring">Ring</button>
           </main>"#,
    );
    let issues = a11y(&p);
    let focus = of_kind(&issues, AccessibilityIssueType::FocusManagement);
    assert_eq!(focus.len(), 1);
    assert_eq!(focus[0].element.as_ref().unwrap().excerpt, "Ghost");
}

#[test]
fn test_aria_names_and_expanded_state() {
    let p = page(
        r#"<main>
             <span role="button" tabindex="0" onkeydown="x()"></span>
             <span role="tab" aria-label="Pricing" tabindex="0"></span>
             <button aria-controls="faq-1">Question</button>
             <button aria-controls="faq-2" aria-expanded="false">Question</button>
           </main>"#,
    );
    let issues = a11y(&p);
    let aria = of_kind(&issues, AccessibilityIssueType::AriaLabels);
    assert_eq!(aria.len(), 2);

    let unnamed = aria.iter().find(|i| i.severity == Severity::Error).unwrap();
    assert!(unnamed.message.contains("role=\"button\""));
    assert_eq!(unnamed.wcag_criterion, "4.1.2 Name, Role, Value");

    let expanded = aria.iter().find(|i| i.severity == Severity::Warning).unwrap();
    assert_eq!(expanded.wcag_level, WcagLevel::AA);
}

#[test]
fn test_landmarks_and_lists() {
    let p = page("<div><ul></ul><ol><li>one</li></ol></div>");
    let issues = a11y(&p);
    let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
    assert!(messages.contains(&"Page missing main landmark"));
    assert_eq!(messages.iter().filter(|m| **m == "Empty list element").count(), 1);

    let with_main = page(r#"<div role="main"><ul><li>a</li></ul></div>"#);
    assert!(a11y(&with_main).iter().all(|i| i.message != "Page missing main landmark"));
}

#[test]
fn test_accessibility_report_without_run_is_empty() {
    let report = AccessibilityTester::new().generate_report();
    assert!(report.contains("=== ACCESSIBILITY REPORT ==="));
    assert!(report.contains("Total Issues: 0"));
    assert!(report.contains("Errors: 0 | Warnings: 0 | Info: 0"));
    assert!(report.contains("Level A: 0 issues"));
    assert!(report.contains("Level AAA: 0 issues"));
}

#[test]
fn test_accessibility_report_lists_issues() {
    let p = page(r#"<h2>Start</h2><img src="x.png">"#);
    let mut tester = AccessibilityTester::new();
    tester.run_checks(&p);
    let summary = tester.summary();
    let report = tester.generate_report();

    assert!(summary.errors >= 2);
    assert_eq!(summary.total, tester.issues().len());
    assert!(report.contains(&format!("Total Issues: {}", summary.total)));
    assert!(report.contains("❌ [A] Image missing alt attribute"));
    assert!(report.contains("   Element: IMG"));
    assert!(report.contains("   WCAG: 1.1.1 Non-text Content"));

    // a fresh run replaces the previous issues
    tester.run_checks(&page(r#"<main><h1>Ok</h1></main>"#));
    assert!(tester.issues().iter().all(|i| i.severity != Severity::Error));
}

// Content review

#[test]
fn test_placeholder_link_is_one_warning() {
    let issues = content(&page(r##"<a href="#">Pricing</a>"##));
    let links = content_of_kind(&issues, ContentIssueType::Link);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].severity, Severity::Warning);
    assert!(links[0].message.starts_with("Placeholder link"));
}

#[test]
fn test_in_page_anchor_is_not_a_placeholder() {
    let issues = content(&page(r##"<a href="#faq">Questions</a>"##));
    assert!(content_of_kind(&issues, ContentIssueType::Link).is_empty());
}

#[test]
fn test_empty_link_text_is_one_error() {
    let issues = content(&page(r#"<a href="/pricing"></a>"#));
    let links = content_of_kind(&issues, ContentIssueType::Link);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].severity, Severity::Error);
    assert_eq!(links[0].location.as_deref(), Some("Link 0: href=\"/pricing\""));
}

#[test]
fn test_external_link_needs_noopener() {
    let issues = content(&page(r#"<a href="https://example.org/partners">Partner site</a>"#));
    let links = content_of_kind(&issues, ContentIssueType::Link);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].severity, Severity::Warning);
    assert!(links[0].message.contains("noopener"));

    let safe = content(&page(
        r#"<a href="https://example.org/" rel="noopener noreferrer">Partner site</a>"#,
    ));
    assert!(content_of_kind(&safe, ContentIssueType::Link).is_empty());
}

#[test]
fn test_site_host_and_subdomains_are_internal() {
    assert!(is_external("https://example.org/", Some("planety.app")));
    assert!(!is_external("https://planety.app/about", Some("planety.app")));
    assert!(!is_external("https://blog.planety.app/post", Some("planety.app")));
    assert!(!is_external("/about", Some("planety.app")));
    assert!(is_external("http://planety.app.evil.io/", Some("planety.app")));
    assert!(is_external("https://planety.app/", None));
}

#[test]
fn test_vague_link_text_is_informational() {
    let issues = content(&page(r#"<a href="/story">Read more</a><a href="/there">Thereafter</a>"#));
    let vague: Vec<_> = issues.iter().filter(|i| i.message.contains("more descriptive")).collect();
    assert_eq!(vague.len(), 1);
    assert_eq!(vague[0].severity, Severity::Info);
}

#[test]
fn test_cta_rules() {
    let issues = content(&page(
        r#"<button>!!!</button>
           <button type="button">Sign me up for the monthly cosmic newsletter</button>
           <form><button>Join the waitlist</button></form>
           <a href="/start"><button>Start now</button></a>
           <button onclick="go()">Submit</button>"#,
    ));
    let cta = content_of_kind(&issues, ContentIssueType::Cta);

    let empty: Vec<_> = cta.iter().filter(|i| i.message == "CTA button has no text").collect();
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].severity, Severity::Error);

    let long: Vec<_> = cta.iter().filter(|i| i.message.contains("too long")).collect();
    assert_eq!(long.len(), 1);

    let unwired: Vec<_> =
        cta.iter().filter(|i| i.message.contains("may not be functional")).collect();
    assert_eq!(unwired.len(), 1);
    assert!(unwired[0].location.as_deref().unwrap().contains("newsletter"));

    let passive: Vec<_> = cta.iter().filter(|i| i.severity == Severity::Info).collect();
    assert_eq!(passive.len(), 2); // "Sign me up..." and "Submit"
}

#[test]
fn test_spelling_and_grammar() {
    let issues = content(&page(
        r#"<p>You will recieve updates.</p>
           <p>Meet new  friends.</p>
           <p>First sentence. Second one</p>
           <p>
             Indented source text is fine.
           </p>"#,
    ));
    let spelling = content_of_kind(&issues, ContentIssueType::Spelling);
    assert_eq!(spelling.len(), 1);
    assert_eq!(spelling[0].severity, Severity::Error);
    assert!(spelling[0].message.contains("\"receive\""));

    let grammar = content_of_kind(&issues, ContentIssueType::Grammar);
    assert_eq!(grammar.len(), 2);
    assert!(grammar.iter().any(|i| i.message == "Double spaces found"));
    assert!(grammar.iter().any(|i| i.message == "Paragraph may be missing ending punctuation"));
}

#[test]
fn test_brand_term_capitalisation() {
    let issues = content(&page(
        r#"<p>We love planety. cosmic friends unite.</p><p>Planety is cosmic.</p>"#,
    ));
    let brand: Vec<_> =
        issues.iter().filter(|i| i.message.starts_with("Brand term inconsistency")).collect();
    assert_eq!(brand.len(), 2);
    assert!(brand.iter().any(|i| i.message.contains("\"planety\" should be \"Planety\"")));
    assert!(brand.iter().any(|i| i.message.contains("\"cosmic\" should be \"Cosmic\"")));
}

#[test]
fn test_legal_compliance() {
    let bare = content(&page("<p>Hello</p>"));
    let legal = content_of_kind(&bare, ContentIssueType::Legal);
    assert!(legal
        .iter()
        .any(|i| i.severity == Severity::Error && i.message == "No privacy policy link found"));
    assert!(legal
        .iter()
        .any(|i| i.severity == Severity::Warning && i.message == "No terms of service link found"));
    assert_eq!(legal.iter().filter(|i| i.message.starts_with("Missing important")).count(), 5);

    let compliant = content(&page(
        r#"<p>Your privacy matters. Data protection is built in: everything is secure and encrypted,
           and your data belongs to you.</p>
           <a href="/privacy">Privacy</a> <a href="/terms">Terms</a>"#,
    ));
    assert!(content_of_kind(&compliant, ContentIssueType::Legal).is_empty());
}

#[test]
fn test_metadata_checks() {
    let full = Page::parse(
        r#"<html><head>
             <title>Planety - Find friends who share your cosmic vibe</title>
             <meta name="description" content="Planety matches you with people who share your interests so that friendships can grow naturally, safely, and at your own pace, online and off.">
             <meta property="og:title" content="Planety">
             <meta property="og:description" content="Friendship, reimagined">
             <meta property="og:image" content="/og.png">
           </head><body></body></html>"#,
    );
    let issues = content(&full);
    assert!(issues.iter().all(|i| !i.message.contains("SEO") && !i.message.contains("Open Graph")));

    let bare = content(&page(""));
    assert!(bare.iter().any(|i| i.message == "Page title should be 30-60 characters for SEO"));
    assert!(bare
        .iter()
        .any(|i| i.message == "Meta description should be 120-160 characters for SEO"));
    assert!(bare.iter().any(|i| i.severity == Severity::Info && i.message.contains("Open Graph")));
}

#[test]
fn test_content_accessibility_copy_checks() {
    let issues = content(&page(
        r#"<h2>Start</h2>
           <img src="a.png"><img src="b.png" alt="">
           <button tabindex="3" onclick="x()">Try it</button>"#,
    ));
    let acc = content_of_kind(&issues, ContentIssueType::Accessibility);
    assert!(acc
        .iter()
        .any(|i| i.severity == Severity::Warning && i.message == "First heading should be H1"));
    assert!(acc.iter().any(|i| i.message == "Heading level skipped (0 to 2)"));
    assert!(acc
        .iter()
        .any(|i| i.severity == Severity::Error && i.message == "Image missing alt attribute"));
    assert!(acc
        .iter()
        .any(|i| i.severity == Severity::Info && i.message.starts_with("Image has empty alt")));
    assert!(acc.iter().any(|i| i.message == "Positive tabindex can cause accessibility issues"));
}

#[test]
fn test_content_report_without_run_is_empty() {
    let report = ContentReviewer::new(AuditConfig::default()).generate_report();
    assert!(report.contains("=== CONTENT REVIEW REPORT ==="));
    assert!(report.contains("Total Issues: 0"));
    assert!(report.contains("✅ Excellent! No critical issues found."));
    assert!(!report.contains("ISSUES ---"));
}

#[test]
fn test_content_report_groups_by_type() {
    let mut reviewer = ContentReviewer::new(AuditConfig::default());
    reviewer.run_checks(&page(r##"<a href="#">Pricing</a>"##));
    let report = reviewer.generate_report();
    let summary = reviewer.summary();

    assert!(report.contains("--- LINK ISSUES ---"));
    assert!(report.contains("--- LEGAL ISSUES ---"));
    assert!(report.find("--- LINK ISSUES ---") < report.find("--- LEGAL ISSUES ---"));
    assert_eq!(summary.groups.get("link"), Some(&1));
}

// End to end

#[test]
fn test_end_to_end_scenario() {
    let p = page(
        r#"<h2>Welcome to the galaxy</h2>
           <img src="hero.png">
           <button>!!!</button>
           <a href="https://partner.example.com/">Our partner</a>"#,
    );

    let content = content(&p);
    let a11y = a11y(&p);
    let total = content.len() + a11y.len();
    assert!(total >= 4);

    assert!(content
        .iter()
        .any(|i| i.severity == Severity::Warning && i.message == "First heading should be H1"));
    assert!(a11y
        .iter()
        .any(|i| i.severity == Severity::Error && i.message == "Page should start with H1"));
    assert!(a11y
        .iter()
        .any(|i| i.severity == Severity::Error && i.message == "Image missing alt attribute"));
    assert!(content
        .iter()
        .any(|i| i.severity == Severity::Error && i.message == "CTA button has no text"));
    assert!(content
        .iter()
        .any(|i| i.severity == Severity::Warning && i.message.contains("noopener")));
}

// Links, forms, performance

#[test]
fn test_link_summary() {
    let p = page(
        r##"<a href="#">Top</a>
            <a href="#faq">FAQ</a>
            <a href="/about">About</a>
            <a href="https://planety.app/blog">Blog</a>
            <a href="https://twitter.com/planety">Twitter</a>
            <a href="https://github.com/planety" rel="noopener">Code</a>
            <a>No destination</a>"##,
    );
    let summary = LinkSummary::collect(&p, Some("planety.app")).unwrap();
    assert_eq!(summary.total, 6);
    assert_eq!(summary.placeholders, 1);
    assert_eq!(summary.internal, 3);
    assert_eq!(summary.external, 2);
    assert_eq!(summary.missing_noopener, vec!["https://twitter.com/planety".to_string()]);

    let rendered = summary.render();
    assert!(rendered.contains("Total: 6"));
    assert!(rendered.contains("1 placeholder links need real destinations"));
}

#[test]
fn test_form_report() {
    let p = page(
        r#"<form action="/signup">
             <input type="email" name="email" required>
             <label for="name">Name</label><input id="name" required aria-required="true">
             <input type="hidden" name="ref">
           </form>
           <iframe src="https://docs.google.com/forms/d/abc/viewform"></iframe>"#,
    );
    let report = FormReport::collect(&p).unwrap();
    assert_eq!(report.forms.len(), 2);
    assert_eq!(
        report.forms[0],
        FormEntry::Native {
            action: Some("/signup".to_string()),
            unlabelled_inputs: vec![1],
            missing_aria_required: vec![1],
        }
    );
    assert_eq!(report.forms[1], FormEntry::GoogleForm { has_title: false });
    assert_eq!(report.warnings(), 3);
    assert!(report.render().contains("Google Form iframe missing title attribute"));

    let none = FormReport::collect(&page("<p>No forms</p>")).unwrap();
    assert!(none.forms.is_empty());
    assert!(none.render().contains("No forms found on page"));
}

#[test]
fn test_performance_snapshot() {
    let sample: PerformanceSample = serde_json::from_str(
        r#"{
            "entries": [
                { "entryType": "paint", "name": "first-contentful-paint", "startTime": 812.4 },
                { "entryType": "largest-contentful-paint", "startTime": 1900.0 },
                { "entryType": "resource", "name": "/hero.webp", "duration": 1450.5 },
                { "entryType": "resource", "name": "/app.js", "duration": 120.0 }
            ],
            "network": { "effectiveType": "2g", "downlink": 0.25 },
            "memory": { "usedJSHeapSize": 10485760 }
        }"#,
    )
    .unwrap();

    let snapshot = PerformanceSnapshot::from_sample(&sample);
    assert!(snapshot.timeline_supported);
    assert_eq!(snapshot.timings.len(), 2);
    assert!(snapshot.slow_network);
    assert_eq!(snapshot.slow_resources.len(), 1);
    assert_eq!(snapshot.memory_used_mb, Some(10.0));

    let rendered = snapshot.render();
    assert!(rendered.contains("📊 first-contentful-paint: 812.40ms"));
    assert!(rendered.contains("Slow network detected"));
    assert!(rendered.contains("1 slow resources detected"));
    assert!(rendered.contains("💾 Memory: 10.00 MB used"));

    let empty = PerformanceSnapshot::from_sample(&PerformanceSample::default());
    assert!(!empty.timeline_supported);
    assert!(empty.render().contains("All resources loading efficiently"));
}
