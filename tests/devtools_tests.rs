use planety::audit::performance::PerformanceSample;
use planety::audit::Page;
use planety::config::{AuditConfig, TelemetryConfig};
use planety::devtools::{
    load_page, load_performance_sample, DevTools, DevToolsError, SessionScript,
};
use planety::telemetry::storage::MemoryStore;
use planety::telemetry::{Event, TelemetryRecorder};
use serde_json::json;
use std::sync::Arc;

const LANDING: &str = r##"<!DOCTYPE html>
<html>
<head><title>Planety</title></head>
<body>
  <main>
    <h1>Find your people</h1>
    <img src="hero.png">
    <button>Join the waitlist</button>
    <a href="#">Learn more</a>
    <form action="/signup"><input type="email" name="email" required></form>
  </main>
</body>
</html>"##;

fn tools() -> DevTools {
    let recorder = TelemetryRecorder::new(
        TelemetryConfig::default(),
        Vec::new(),
        Arc::new(MemoryStore::new()),
    );
    DevTools::new(recorder, AuditConfig::default())
}

fn last_named(events: &[Event], name: &str) -> Event {
    events.iter().rev().find(|e| e.name == name).cloned().expect("event recorded")
}

#[test]
fn test_content_review_is_recorded() {
    let tools = tools();
    let review = tools.run_content_review(&Page::parse(LANDING));

    assert_eq!(review.summary.total, review.issues.len());
    assert!(review.report.contains("=== CONTENT REVIEW REPORT ==="));

    let event = last_named(&tools.recorder().events(), "content_review_completed");
    assert_eq!(event.property("total_issues"), Some(&json!(review.summary.total)));
    assert_eq!(event.property("errors"), Some(&json!(review.summary.errors)));
    assert_eq!(event.property("warnings"), Some(&json!(review.summary.warnings)));
    assert_eq!(event.property("info"), Some(&json!(review.summary.info)));
}

#[test]
fn test_accessibility_run_is_recorded() {
    let tools = tools();
    let review = tools.run_accessibility_tests(&Page::parse(LANDING));

    assert!(review.summary.errors >= 1, "missing alt is an error");
    let event = last_named(&tools.recorder().events(), "accessibility_test_completed");
    assert_eq!(event.property("total_issues"), Some(&json!(review.summary.total)));
    let level_a = review.summary.groups.get("A").copied().unwrap_or(0);
    assert_eq!(event.property("wcag_a"), Some(&json!(level_a)));
}

#[test]
fn test_full_suite_records_completion() {
    let tools = tools();
    let sample = PerformanceSample::default();
    let report = tools.run_all_tests(&Page::parse(LANDING), Some(&sample)).unwrap();

    assert!(report.performance.is_some());
    assert_eq!(report.forms.forms.len(), 1);
    assert_eq!(report.links.placeholders, 1);

    let events = tools.recorder().events();
    let done = last_named(&events, "qa_tests_completed");
    assert_eq!(
        done.property("test_types"),
        Some(&json!(["content", "accessibility", "performance", "forms", "links"]))
    );
    assert!(done.property("duration_ms").is_some());
    assert!(events.iter().all(|e| e.name != "qa_tests_failed"));

    let rendered = report.render();
    assert!(rendered.contains("RUNNING ALL QUALITY ASSURANCE TESTS"));
    assert!(rendered.contains("All tests completed in"));
}

#[test]
fn test_suite_without_performance_sample() {
    let tools = tools();
    let report = tools.run_all_tests(&Page::parse(LANDING), None).unwrap();
    assert!(report.performance.is_none());

    let done = last_named(&tools.recorder().events(), "qa_tests_completed");
    assert_eq!(
        done.property("test_types"),
        Some(&json!(["content", "accessibility", "forms", "links"]))
    );
}

#[test]
fn test_export_analytics_writes_dated_file() {
    let dir = tempfile::tempdir().unwrap();
    let tools = tools();
    tools.recorder().track_hero_engagement();

    let (export, path) = tools.export_analytics(dir.path()).unwrap();
    assert!(path.exists());
    assert_eq!(export.session_id, tools.recorder().session_id());
    assert_eq!(export.funnel_steps.len(), 1);

    let missing = dir.path().join("nope");
    assert!(matches!(tools.export_analytics(&missing), Err(DevToolsError::Export(_))));
}

#[test]
fn test_load_page_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_page(&dir.path().join("missing.html")).err().unwrap();
    assert!(matches!(err, DevToolsError::Read { .. }));

    let path = dir.path().join("index.html");
    std::fs::write(&path, LANDING).unwrap();
    let page = load_page(&path).unwrap();
    assert!(page.exists("main").unwrap());
}

#[test]
fn test_performance_sample_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perf.json");
    std::fs::write(
        &path,
        r#"{ "entries": [ { "entryType": "paint", "name": "first-paint", "startTime": 412.5 } ],
             "network": { "effectiveType": "2g", "downlink": 0.2 },
             "memory": { "usedJSHeapSize": 10485760 } }"#,
    )
    .unwrap();

    let sample = load_performance_sample(&path).unwrap();
    let snapshot = tools().test_performance(&sample);
    assert_eq!(snapshot.timings.len(), 1);
    assert!(snapshot.slow_network);
    assert_eq!(snapshot.memory_used_mb, Some(10.0));

    let missing = load_performance_sample(&dir.path().join("missing.json"));
    assert!(matches!(missing, Err(DevToolsError::Read { .. })));

    std::fs::write(&path, "{ \"entries\": 7 }").unwrap();
    assert!(matches!(load_performance_sample(&path), Err(DevToolsError::Script(_))));
}

#[test]
fn test_session_script_replay() {
    let script: SessionScript = serde_json::from_value(json!({
        "viewport": { "height": 1000.0, "document_height": 5000.0 },
        "sections": [ { "id": "hero", "top": 0.0, "height": 1200.0 } ],
        "steps": [
            { "type": "identify", "user_id": "u-42" },
            { "type": "conversion", "step": "hero_engagement" },
            { "type": "scroll", "y": 2000.0 },
            { "type": "faq", "index": 1, "action": "open" },
            { "type": "cta", "cta_type": "primary", "location": "hero" },
            { "type": "dwell", "seconds": 45 },
            { "type": "track", "name": "custom", "properties": { "k": "v" } },
            { "type": "exit" }
        ]
    }))
    .unwrap();

    let tools = tools();
    let recorder = tools.recorder();
    script.replay(recorder);

    assert_eq!(recorder.user_id().as_deref(), Some("u-42"));
    let steps: Vec<String> = recorder.funnel_steps().into_iter().map(|s| s.step).collect();
    assert_eq!(steps, vec!["hero_engagement", "cta_click"]);
    assert_eq!(recorder.max_scroll_percent(), 50);

    let events = recorder.events();
    let faq = last_named(&events, "faq_interaction");
    assert_eq!(faq.property("action"), Some(&json!("open")));
    let dwell = last_named(&events, "time_on_page");
    assert_eq!(dwell.property("seconds"), Some(&json!(30)));
    let custom = last_named(&events, "custom");
    assert_eq!(custom.property("k"), Some(&json!("v")));
    assert_eq!(events.last().map(|e| e.name.as_str()), Some("page_exit"));
}

#[test]
fn test_session_script_rejects_unknown_steps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{ "steps": [ { "type": "teleport" } ] }"#).unwrap();

    assert!(matches!(SessionScript::load(&path), Err(DevToolsError::Script(_))));
}
