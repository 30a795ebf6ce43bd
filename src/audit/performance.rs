use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::telemetry::vitals::{NetworkInfo, PerformanceEntry, SLOW_RESOURCE_MS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    #[serde(rename = "usedJSHeapSize")]
    pub used_js_heap_size: u64,
    #[serde(rename = "totalJSHeapSize", default)]
    pub total_js_heap_size: Option<u64>,
}

/// Performance data captured from a page, as written by the browser-side collector.
/// Every field is optional; an absent one means the capability was unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSample {
    pub entries: Option<Vec<PerformanceEntry>>,
    pub network: Option<NetworkInfo>,
    pub memory: Option<MemoryInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timing {
    pub name: String,
    pub start_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowResource {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub timeline_supported: bool,
    pub timings: Vec<Timing>,
    pub network: Option<NetworkInfo>,
    pub slow_network: bool,
    pub slow_resources: Vec<SlowResource>,
    pub memory_used_mb: Option<f64>,
}

impl PerformanceSnapshot {
    pub fn from_sample(sample: &PerformanceSample) -> Self {
        let entries = sample.entries.as_deref().unwrap_or_default();

        let timings = entries
            .iter()
            .filter_map(|e| match e {
                PerformanceEntry::Paint { name, start_time } => {
                    Some(Timing { name: name.clone(), start_time_ms: *start_time })
                }
                PerformanceEntry::LargestContentfulPaint { start_time } => {
                    Some(Timing {
                        name: "largest-contentful-paint".to_string(),
                        start_time_ms: *start_time,
                    })
                }
                PerformanceEntry::FirstInput { start_time, .. } => {
                    Some(Timing { name: "first-input".to_string(), start_time_ms: *start_time })
                }
                _ => None,
            })
            .collect();

        let slow_resources = entries
            .iter()
            .filter_map(|e| match e {
                PerformanceEntry::Resource { name, duration, .. }
                    if *duration > SLOW_RESOURCE_MS =>
                {
                    Some(SlowResource { name: name.clone(), duration_ms: *duration })
                }
                _ => None,
            })
            .collect();

        Self {
            timeline_supported: sample.entries.is_some(),
            timings,
            network: sample.network.clone(),
            slow_network: sample.network.as_ref().is_some_and(NetworkInfo::is_slow),
            slow_resources,
            memory_used_mb: sample
                .memory
                .as_ref()
                .map(|m| m.used_js_heap_size as f64 / 1024.0 / 1024.0),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("\n🚀 PERFORMANCE TEST STARTING...\n\n");

        if !self.timeline_supported {
            out.push_str("⚠️  Some performance metrics not available\n");
        }
        for t in &self.timings {
            let _ = writeln!(out, "📊 {}: {:.2}ms", t.name, t.start_time_ms);
        }

        if let Some(network) = &self.network {
            let _ = writeln!(
                out,
                "🌐 Network: {} ({} Mbps)",
                network.effective_type, network.downlink
            );
            if self.slow_network {
                out.push_str("⚠️  Slow network detected - test mobile performance\n");
            }
        }

        if self.slow_resources.is_empty() {
            out.push_str("✅ All resources loading efficiently\n");
        } else {
            let _ = writeln!(out, "⚠️  {} slow resources detected:", self.slow_resources.len());
            for r in &self.slow_resources {
                let _ = writeln!(out, "   {}: {:.2}ms", r.name, r.duration_ms);
            }
        }

        if let Some(mb) = self.memory_used_mb {
            let _ = writeln!(out, "💾 Memory: {mb:.2} MB used");
        }
        out
    }
}
