//! Core Web Vitals and environment signals.
//!
//! Each signal source is optional. A missing capability is logged once as a
//! warning and skipped; the other signals are unaffected.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing::warn;

use super::event::props;
use super::recorder::TelemetryRecorder;

pub const SLOW_RESOURCE_MS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

impl VitalRating {
    fn grade(value: f64, good: f64, poor: f64) -> Self {
        if value <= good {
            VitalRating::Good
        } else if value <= poor {
            VitalRating::NeedsImprovement
        } else {
            VitalRating::Poor
        }
    }

    pub fn lcp(ms: f64) -> Self {
        Self::grade(ms, 2500.0, 4000.0)
    }

    pub fn fid(ms: f64) -> Self {
        Self::grade(ms, 100.0, 300.0)
    }

    pub fn cls(score: f64) -> Self {
        Self::grade(score, 0.1, 0.25)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VitalRating::Good => "good",
            VitalRating::NeedsImprovement => "needs_improvement",
            VitalRating::Poor => "poor",
        }
    }
}

/// Browser performance timeline entries, as the page reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entryType", rename_all = "kebab-case")]
pub enum PerformanceEntry {
    Paint {
        name: String,
        #[serde(rename = "startTime")]
        start_time: f64,
    },
    LargestContentfulPaint {
        #[serde(rename = "startTime")]
        start_time: f64,
    },
    FirstInput {
        #[serde(rename = "startTime")]
        start_time: f64,
        #[serde(rename = "processingStart")]
        processing_start: f64,
    },
    LayoutShift {
        value: f64,
        #[serde(rename = "hadRecentInput", default)]
        had_recent_input: bool,
    },
    Resource {
        name: String,
        duration: f64,
        #[serde(rename = "transferSize", default)]
        transfer_size: Option<u64>,
        #[serde(rename = "initiatorType", default)]
        initiator_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTiming {
    pub fetch_start: f64,
    pub dom_content_loaded_event_end: f64,
    pub load_event_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub effective_type: String,
    pub downlink: f64,
    #[serde(default)]
    pub rtt: Option<f64>,
    #[serde(default)]
    pub save_data: bool,
}

impl NetworkInfo {
    pub fn is_slow(&self) -> bool {
        matches!(self.effective_type.as_str(), "slow-2g" | "2g")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    pub charging: bool,
    pub level: f64,
    #[serde(default)]
    pub charging_time: Option<f64>,
    #[serde(default)]
    pub discharging_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_pixel_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptError {
    pub message: String,
    pub filename: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub stack: Option<String>,
}

struct VitalsState {
    cls: f64,
    visible_since: Instant,
}

/// Turns performance entries and environment signals into events.
#[derive(Clone)]
pub struct VitalsMonitor {
    recorder: TelemetryRecorder,
    state: Arc<Mutex<VitalsState>>,
}

impl VitalsMonitor {
    pub fn new(recorder: TelemetryRecorder) -> Self {
        Self {
            recorder,
            state: Arc::new(Mutex::new(VitalsState { cls: 0.0, visible_since: Instant::now() })),
        }
    }

    pub fn cumulative_layout_shift(&self) -> f64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).cls
    }

    /// `None` means the timeline API is not available in this environment.
    pub fn observe_entries(&self, entries: Option<&[PerformanceEntry]>) {
        let Some(entries) = entries else {
            warn!("performance timeline not supported; web vitals not tracked");
            return;
        };

        let mut shifted = false;
        for entry in entries {
            match entry {
                PerformanceEntry::LargestContentfulPaint { start_time } => {
                    self.recorder.track(
                        "core_web_vital_lcp",
                        Some(props([
                            ("value", json!(start_time)),
                            ("rating", json!(VitalRating::lcp(*start_time).as_str())),
                        ])),
                    );
                }
                PerformanceEntry::FirstInput { start_time, processing_start } => {
                    let delay = processing_start - start_time;
                    self.recorder.track(
                        "core_web_vital_fid",
                        Some(props([
                            ("value", json!(delay)),
                            ("rating", json!(VitalRating::fid(delay).as_str())),
                        ])),
                    );
                }
                PerformanceEntry::LayoutShift { value, had_recent_input } => {
                    if !had_recent_input {
                        self.state.lock().unwrap_or_else(|e| e.into_inner()).cls += value;
                    }
                    shifted = true;
                }
                PerformanceEntry::Resource { name, duration, transfer_size, initiator_type } => {
                    if *duration > SLOW_RESOURCE_MS {
                        self.recorder.track(
                            "slow_resource_load",
                            Some(props([
                                ("name", json!(name)),
                                ("duration", json!(duration)),
                                ("size", json!(transfer_size)),
                                ("type", json!(initiator_type)),
                            ])),
                        );
                    }
                }
                PerformanceEntry::Paint { .. } => {}
            }
        }

        if shifted {
            let cls = self.cumulative_layout_shift();
            self.recorder.track(
                "core_web_vital_cls",
                Some(props([
                    ("value", json!(cls)),
                    ("rating", json!(VitalRating::cls(cls).as_str())),
                ])),
            );
        }
    }

    /// Records load timings once the page has finished loading.
    pub fn track_performance_metrics(
        &self,
        navigation: Option<&NavigationTiming>,
        entries: &[PerformanceEntry],
    ) {
        let Some(nav) = navigation else {
            warn!("navigation timing not supported; performance metrics skipped");
            return;
        };

        let first_paint = entries.iter().find_map(|e| match e {
            PerformanceEntry::Paint { name, start_time } if name == "first-paint" => {
                Some(*start_time)
            }
            _ => None,
        });
        let lcp = entries.iter().rev().find_map(|e| match e {
            PerformanceEntry::LargestContentfulPaint { start_time } => Some(*start_time),
            _ => None,
        });

        self.recorder.track(
            "performance_metrics",
            Some(props([
                ("page_load_time", json!(nav.load_event_end - nav.fetch_start)),
                ("dom_content_loaded", json!(nav.dom_content_loaded_event_end - nav.fetch_start)),
                ("first_paint", json!(first_paint)),
                ("largest_contentful_paint", json!(lcp)),
            ])),
        );
    }

    pub fn track_network_info(&self, network: Option<&NetworkInfo>) {
        match network {
            Some(n) => self.recorder.track(
                "network_info",
                Some(props([
                    ("effective_type", json!(n.effective_type)),
                    ("downlink", json!(n.downlink)),
                    ("rtt", json!(n.rtt)),
                    ("save_data", json!(n.save_data)),
                ])),
            ),
            None => warn!("network information not supported"),
        }
    }

    pub fn track_battery(&self, battery: Option<&BatteryStatus>) {
        match battery {
            Some(b) => self.recorder.track(
                "battery_status",
                Some(props([
                    ("charging", json!(b.charging)),
                    ("level", json!(b.level)),
                    ("charging_time", json!(b.charging_time)),
                    ("discharging_time", json!(b.discharging_time)),
                ])),
            ),
            None => warn!("battery status not supported"),
        }
    }

    pub fn track_device_info(&self, device: &DeviceInfo) {
        self.recorder.track(
            "device_info",
            Some(props([
                ("user_agent", json!(device.user_agent)),
                ("language", json!(device.language)),
                ("platform", json!(device.platform)),
                ("screen_width", json!(device.screen_width)),
                ("screen_height", json!(device.screen_height)),
                ("viewport_width", json!(device.viewport_width)),
                ("viewport_height", json!(device.viewport_height)),
                ("device_pixel_ratio", json!(device.device_pixel_ratio)),
            ])),
        );
    }

    pub fn on_visibility_change(&self, hidden: bool) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if hidden {
            let visible_ms = st.visible_since.elapsed().as_millis() as u64;
            drop(st);
            self.recorder.track(
                "page_visibility_hidden",
                Some(props([("visible_time_ms", json!(visible_ms))])),
            );
        } else {
            st.visible_since = Instant::now();
            drop(st);
            self.recorder.track("page_visibility_visible", None);
        }
    }

    pub fn track_script_error(&self, error: &ScriptError) {
        self.recorder.track(
            "javascript_error",
            Some(props([
                ("message", json!(error.message)),
                ("filename", json!(error.filename)),
                ("line_number", json!(error.line_number)),
                ("column_number", json!(error.column_number)),
                ("stack", json!(error.stack)),
            ])),
        );
    }

    pub fn track_unhandled_rejection(&self, reason: &str, stack: Option<&str>) {
        self.recorder.track(
            "unhandled_promise_rejection",
            Some(props([("reason", json!(reason)), ("stack", json!(stack))])),
        );
    }
}
