//! Developer entry points: the audits, link/form/performance checks, and
//! analytics export, each reporting its outcome back through telemetry.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use crate::audit::forms::FormReport;
use crate::audit::links::LinkSummary;
use crate::audit::performance::{PerformanceSample, PerformanceSnapshot};
use crate::audit::{
    AccessibilityIssue, AccessibilityTester, AuditError, AuditSummary, ContentIssue,
    ContentReviewer, Page,
};
use crate::config::AuditConfig;
use crate::telemetry::event::{props, FaqAction, Properties};
use crate::telemetry::storage::StorageError;
use crate::telemetry::{AnalyticsExport, TelemetryRecorder};

#[derive(Debug, Error)]
pub enum DevToolsError {
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error("analytics export failed: {0}")]
    Export(#[from] StorageError),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON input: {0}")]
    Script(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentReview {
    pub issues: Vec<ContentIssue>,
    pub summary: AuditSummary,
    pub report: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessibilityReview {
    pub issues: Vec<AccessibilityIssue>,
    pub summary: AuditSummary,
    pub report: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub content: ContentReview,
    pub accessibility: AccessibilityReview,
    pub performance: Option<PerformanceSnapshot>,
    pub forms: FormReport,
    pub links: LinkSummary,
    pub duration_ms: u64,
}

impl SuiteReport {
    pub fn render(&self) -> String {
        let rule = "=".repeat(50);
        let mut out = format!("\n🧪 RUNNING ALL QUALITY ASSURANCE TESTS\n\n{rule}\n");
        out.push_str(&self.content.report);
        out.push_str(&self.accessibility.report);
        if let Some(perf) = &self.performance {
            out.push_str(&perf.render());
        }
        out.push_str(&self.forms.render());
        out.push_str(&self.links.render());
        out.push_str(&format!("\n{rule}\n✅ All tests completed in {}ms\n", self.duration_ms));
        out
    }
}

fn read(path: &Path) -> Result<String, DevToolsError> {
    std::fs::read_to_string(path).map_err(|source| DevToolsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_page(path: &Path) -> Result<Page, DevToolsError> {
    Ok(Page::parse(&read(path)?))
}

/// Reads a performance sample written by the browser-side collector.
pub fn load_performance_sample(path: &Path) -> Result<PerformanceSample, DevToolsError> {
    Ok(serde_json::from_str(&read(path)?)?)
}

fn counts(summary: &AuditSummary) -> Properties {
    props([
        ("total_issues", json!(summary.total)),
        ("errors", json!(summary.errors)),
        ("warnings", json!(summary.warnings)),
        ("info", json!(summary.info)),
    ])
}

/// The developer console, bound to one telemetry session.
#[derive(Clone)]
pub struct DevTools {
    recorder: TelemetryRecorder,
    audit: AuditConfig,
}

impl DevTools {
    pub fn new(recorder: TelemetryRecorder, audit: AuditConfig) -> Self {
        Self { recorder, audit }
    }

    pub fn recorder(&self) -> &TelemetryRecorder {
        &self.recorder
    }

    pub fn run_content_review(&self, page: &Page) -> ContentReview {
        let mut reviewer = ContentReviewer::new(self.audit.clone());
        let issues = reviewer.run_checks(page).to_vec();
        let summary = reviewer.summary();

        self.recorder.track("content_review_completed", Some(counts(&summary)));
        info!(total = summary.total, errors = summary.errors, "content review completed");

        ContentReview { issues, summary, report: reviewer.generate_report() }
    }

    pub fn run_accessibility_tests(&self, page: &Page) -> AccessibilityReview {
        let mut tester = AccessibilityTester::new();
        let issues = tester.run_checks(page).to_vec();
        let summary = tester.summary();

        let mut p = counts(&summary);
        for level in ["A", "AA", "AAA"] {
            let n = summary.groups.get(level).copied().unwrap_or(0);
            p.insert(format!("wcag_{}", level.to_ascii_lowercase()), json!(n));
        }
        self.recorder.track("accessibility_test_completed", Some(p));
        info!(total = summary.total, errors = summary.errors, "accessibility test completed");

        AccessibilityReview { issues, summary, report: tester.generate_report() }
    }

    pub fn check_links(&self, page: &Page) -> Result<LinkSummary, DevToolsError> {
        Ok(LinkSummary::collect(page, self.audit.site_host.as_deref())?)
    }

    pub fn validate_forms(&self, page: &Page) -> Result<FormReport, DevToolsError> {
        Ok(FormReport::collect(page)?)
    }

    pub fn test_performance(&self, sample: &PerformanceSample) -> PerformanceSnapshot {
        PerformanceSnapshot::from_sample(sample)
    }

    /// Runs every check against `page`. Records `qa_tests_completed`, or
    /// `qa_tests_failed` with the error if a check could not run at all.
    pub fn run_all_tests(
        &self,
        page: &Page,
        performance: Option<&PerformanceSample>,
    ) -> Result<SuiteReport, DevToolsError> {
        let started = Instant::now();

        match self.run_suite(page, performance, started) {
            Ok(report) => {
                let mut test_types = vec!["content", "accessibility"];
                if report.performance.is_some() {
                    test_types.push("performance");
                }
                test_types.extend(["forms", "links"]);
                self.recorder.track(
                    "qa_tests_completed",
                    Some(props([
                        ("duration_ms", json!(report.duration_ms)),
                        ("test_types", json!(test_types)),
                    ])),
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "test suite failed");
                self.recorder
                    .track("qa_tests_failed", Some(props([("error", json!(e.to_string()))])));
                Err(e)
            }
        }
    }

    fn run_suite(
        &self,
        page: &Page,
        performance: Option<&PerformanceSample>,
        started: Instant,
    ) -> Result<SuiteReport, DevToolsError> {
        let content = self.run_content_review(page);
        let accessibility = self.run_accessibility_tests(page);
        let performance = performance.map(|s| self.test_performance(s));
        let forms = self.validate_forms(page)?;
        let links = self.check_links(page)?;

        Ok(SuiteReport {
            content,
            accessibility,
            performance,
            forms,
            links,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Writes the session export into `dir` and returns it with the file path.
    pub fn export_analytics(
        &self,
        dir: &Path,
    ) -> Result<(AnalyticsExport, PathBuf), DevToolsError> {
        let path = self.recorder.export_to_file(dir)?;
        Ok((self.recorder.export_data(), path))
    }
}

// Scripted sessions

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub height: f64,
    pub document_height: f64,
}

/// One recorded interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStep {
    Track {
        name: String,
        #[serde(default)]
        properties: Option<Properties>,
    },
    Conversion {
        step: String,
        #[serde(default)]
        metadata: Option<Properties>,
    },
    Cta {
        cta_type: String,
        location: String,
    },
    ButtonClick {
        text: String,
        location: String,
        #[serde(default)]
        destination: Option<String>,
    },
    LinkClick {
        text: String,
        url: String,
        location: String,
    },
    Faq {
        index: usize,
        action: FaqAction,
    },
    Scroll {
        y: f64,
    },
    Dwell {
        seconds: u64,
    },
    Identify {
        user_id: String,
    },
    AbTest {
        name: String,
    },
    Exit,
}

/// A page session to replay through the recorder, read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionScript {
    pub viewport: Option<Viewport>,
    pub sections: Vec<SectionLayout>,
    pub steps: Vec<SessionStep>,
}

impl SessionScript {
    pub fn load(path: &Path) -> Result<Self, DevToolsError> {
        Ok(serde_json::from_str(&read(path)?)?)
    }

    pub fn replay(&self, recorder: &TelemetryRecorder) {
        if let Some(vp) = &self.viewport {
            recorder.set_viewport(vp.height, vp.document_height);
        }
        for s in &self.sections {
            recorder.set_section_bounds(&s.id, s.top, s.height);
        }

        for step in &self.steps {
            match step {
                SessionStep::Track { name, properties } => recorder.track(name, properties.clone()),
                SessionStep::Conversion { step, metadata } => {
                    recorder.track_conversion_step(step, metadata.clone())
                }
                SessionStep::Cta { cta_type, location } => {
                    recorder.track_cta_click(cta_type, location)
                }
                SessionStep::ButtonClick { text, location, destination } => {
                    recorder.track_button_click(text, location, destination.as_deref())
                }
                SessionStep::LinkClick { text, url, location } => {
                    recorder.track_link_click(text, url, location)
                }
                SessionStep::Faq { index, action } => {
                    recorder.track_faq_interaction(*index, *action)
                }
                SessionStep::Scroll { y } => recorder.on_scroll(*y),
                SessionStep::Dwell { seconds } => {
                    recorder.record_dwell(std::time::Duration::from_secs(*seconds))
                }
                SessionStep::Identify { user_id } => {
                    recorder.set_user_id(user_id);
                }
                SessionStep::AbTest { name } => {
                    recorder.ab_test_view(name);
                }
                SessionStep::Exit => recorder.page_exit(),
            }
        }
    }
}
