//! Component-level helpers: one-shot view tracking and form tracking.

use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::event::{props, FieldAction, Properties};
use super::recorder::TelemetryRecorder;

/// Fraction of an element that must be visible before it counts as viewed.
pub const VIEW_THRESHOLD: f64 = 0.5;

struct Watch {
    token: Uuid,
    event_name: String,
    metadata: Properties,
    element_class: Option<String>,
}

type Watches = Arc<Mutex<HashMap<String, Vec<Watch>>>>;

fn lock(watches: &Watches) -> MutexGuard<'_, HashMap<String, Vec<Watch>>> {
    watches.lock().unwrap_or_else(|e| e.into_inner())
}

/// At-most-once "scrolled into view" tracking.
///
/// Every `observe` call is its own watch, even on an element that is already
/// watched. A watch removes itself after firing; dropping or cleaning up its
/// [`ViewSubscription`] removes that watch alone, without firing.
#[derive(Clone)]
pub struct ViewTracker {
    recorder: TelemetryRecorder,
    watches: Watches,
}

impl ViewTracker {
    pub fn new(recorder: TelemetryRecorder) -> Self {
        Self { recorder, watches: Arc::default() }
    }

    pub fn observe(
        &self,
        element_id: &str,
        element_class: Option<&str>,
        event_name: &str,
        metadata: Option<Properties>,
    ) -> ViewSubscription {
        let token = Uuid::new_v4();
        let watch = Watch {
            token,
            event_name: event_name.to_string(),
            metadata: metadata.unwrap_or_default(),
            element_class: element_class.map(str::to_string),
        };
        lock(&self.watches).entry(element_id.to_string()).or_default().push(watch);

        ViewSubscription {
            element_id: element_id.to_string(),
            token,
            watches: Arc::clone(&self.watches),
        }
    }

    /// Reports the visible fraction of an element. Fires every pending watch
    /// on it once and returns how many fired.
    pub fn on_intersection(&self, element_id: &str, visible_ratio: f64) -> usize {
        if visible_ratio < VIEW_THRESHOLD {
            return 0;
        }

        let fired = lock(&self.watches).remove(element_id).unwrap_or_default();
        for watch in &fired {
            let mut p = watch.metadata.clone();
            p.insert("element_id".to_string(), json!(element_id));
            let class = watch.element_class.as_deref().unwrap_or_default();
            p.insert("element_class".to_string(), json!(class));
            self.recorder.track(&watch.event_name, Some(p));
        }
        fired.len()
    }

    pub fn is_watching(&self, element_id: &str) -> bool {
        lock(&self.watches).get(element_id).is_some_and(|w| !w.is_empty())
    }
}

/// Cleanup handle for one view watch.
pub struct ViewSubscription {
    element_id: String,
    token: Uuid,
    watches: Watches,
}

impl ViewSubscription {
    pub fn cleanup(self) {}
}

impl Drop for ViewSubscription {
    fn drop(&mut self) {
        let mut watches = lock(&self.watches);
        if let Some(pending) = watches.get_mut(&self.element_id) {
            pending.retain(|w| w.token != self.token);
            if pending.is_empty() {
                watches.remove(&self.element_id);
            }
        }
    }
}

/// Tracks one named form through the funnel and at field level.
#[derive(Clone)]
pub struct FormTracker {
    recorder: TelemetryRecorder,
    form_name: String,
}

impl FormTracker {
    pub fn new(recorder: TelemetryRecorder, form_name: &str) -> Self {
        Self { recorder, form_name: form_name.to_string() }
    }

    pub fn start(&self) {
        self.recorder.track_form_start();
        self.recorder.track("form_start", Some(props([("form_name", json!(self.form_name))])));
    }

    pub fn submit(&self, success: bool, error_message: Option<&str>) {
        self.recorder.track_form_submit(&self.form_name);
        let mut p = props([("form_name", json!(self.form_name)), ("success", json!(success))]);
        if let Some(msg) = error_message {
            p.insert("error_message".to_string(), json!(msg));
        }
        self.recorder.track("form_submit", Some(p));
    }

    pub fn field(&self, field_name: &str, action: FieldAction) {
        self.recorder.track(
            "form_field_interaction",
            Some(props([
                ("form_name", json!(self.form_name)),
                ("field_name", json!(field_name)),
                ("action", json!(action.as_str())),
            ])),
        );
    }
}
