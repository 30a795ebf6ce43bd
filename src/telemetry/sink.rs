//! Outbound delivery of recorded events.
//!
//! Every sink is optional and failure-isolated: the dispatcher spawns one
//! detached task per sink per event, logs whatever goes wrong and moves on.
//! Nothing is retried and nothing reaches the caller of `track`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::event::Event;

const MAX_FAILURES: usize = 256;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint rejected event with status {0}")]
    Status(reqwest::StatusCode),
    #[error("vendor bridge failed: {0}")]
    Bridge(String),
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, event: &Event) -> Result<(), SinkError>;
}

/// POSTs each event as JSON to the same-origin collection endpoint.
#[derive(Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    fn name(&self) -> &str {
        "collect_endpoint"
    }

    async fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        let response = self.client.post(&self.endpoint).json(event).send().await?;
        if !response.status().is_success() {
            return Err(SinkError::Status(response.status()));
        }
        Ok(())
    }
}

/// Third-party integrations the page may have loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Global site tag: `gtag('event', name, props)`.
    Tag,
    /// Ad pixel: `fbq('track', 'Custom', {event_name, ...props})`.
    Pixel,
    /// Product analytics library: `mixpanel.track(name, props)`.
    Library,
}

/// A single call into a vendor's global function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorCall {
    pub vendor: Vendor,
    pub args: Vec<Value>,
}

impl VendorCall {
    pub fn for_event(vendor: Vendor, event: &Event) -> Self {
        let props = Value::Object(event.properties.clone());
        let args = match vendor {
            Vendor::Tag => vec![json!("event"), json!(event.name), props],
            Vendor::Pixel => {
                let mut payload = event.properties.clone();
                payload.insert("event_name".to_string(), json!(event.name));
                vec![json!("track"), json!("Custom"), Value::Object(payload)]
            }
            Vendor::Library => vec![json!(event.name), props],
        };
        Self { vendor, args }
    }
}

pub type VendorBridge = Arc<dyn Fn(VendorCall) -> Result<(), String> + Send + Sync>;

/// Forwards events to a vendor global through an injected bridge.
pub struct VendorSink {
    vendor: Vendor,
    label: String,
    bridge: VendorBridge,
}

impl VendorSink {
    pub fn new(vendor: Vendor, bridge: VendorBridge) -> Self {
        let label = match vendor {
            Vendor::Tag => "vendor_tag",
            Vendor::Pixel => "vendor_pixel",
            Vendor::Library => "vendor_library",
        };
        Self { vendor, label: label.to_string(), bridge }
    }
}

#[async_trait]
impl TelemetrySink for VendorSink {
    fn name(&self) -> &str {
        &self.label
    }

    async fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        (self.bridge)(VendorCall::for_event(self.vendor, event)).map_err(SinkError::Bridge)
    }
}

/// Keeps delivered events in memory. Useful for diagnostics and tests.
#[derive(Clone, Default)]
pub struct MemorySink {
    delivered: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Event> {
        self.delivered.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl TelemetrySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        self.delivered.lock().unwrap_or_else(|e| e.into_inner()).push(event.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryFailure {
    pub sink: String,
    pub event: String,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Fans events out to every configured sink without blocking the caller.
#[derive(Clone, Default)]
pub struct SinkDispatcher {
    sinks: Vec<Arc<dyn TelemetrySink>>,
    tasks: TaskTracker,
    failures: Arc<Mutex<VecDeque<DeliveryFailure>>>,
}

impl SinkDispatcher {
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks, tasks: TaskTracker::new(), failures: Arc::default() }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn dispatch(&self, event: &Event) {
        if self.sinks.is_empty() {
            return;
        }

        let handle = match Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                warn!(event = %event.name, "no async runtime; event not forwarded to sinks");
                return;
            }
        };

        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let failures = Arc::clone(&self.failures);
            let event = event.clone();

            self.tasks.spawn_on(
                async move {
                    match sink.deliver(&event).await {
                        Ok(()) => {
                            debug!(sink = sink.name(), event = %event.name, "event delivered")
                        }
                        Err(e) => {
                            warn!(
                                sink = sink.name(),
                                event = %event.name,
                                error = %e,
                                "failed to send analytics event"
                            );
                            let mut log = failures.lock().unwrap_or_else(|p| p.into_inner());
                            if log.len() >= MAX_FAILURES {
                                log.pop_front();
                            }
                            log.push_back(DeliveryFailure {
                                sink: sink.name().to_string(),
                                event: event.name.clone(),
                                error: e.to_string(),
                                at: Utc::now(),
                            });
                        }
                    }
                },
                &handle,
            );
        }
    }

    /// Waits for in-flight deliveries. Diagnostics only; `track` never waits.
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    pub fn failures(&self) -> Vec<DeliveryFailure> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }
}
