use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::engagement::{DwellTracker, ScrollDepthTracker};
use super::event::{
    iso_timestamp, props, EngagementLevel, Event, FaqAction, FunnelStage, FunnelStep, Properties,
    SECTION_KEY, SESSION_ID_KEY, TIMESTAMP_KEY, URL_KEY, USER_ID_KEY,
};
use super::metrics::{compute_snapshot, TelemetrySnapshot};
use super::page::{PageLayout, SectionBounds};
use super::sink::{DeliveryFailure, HttpSink, SinkDispatcher, TelemetrySink};
use super::storage::{JsonFileStore, KeyValueStore, MemoryStore, Preferences, StorageError};
use crate::config::PlanetyConfig;
use crate::config::TelemetryConfig;

/// One arm of a two-way experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    A,
    B,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::A => "A",
            Variant::B => "B",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Variant::A),
            "B" => Some(Variant::B),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the recorder holds for this session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsExport {
    pub events: Vec<Event>,
    pub funnel_steps: Vec<FunnelStep>,
    pub session_id: String,
    pub user_id: Option<String>,
}

struct RecorderState {
    user_id: Option<String>,
    events: Vec<Event>,
    funnel: Vec<FunnelStep>,
    layout: PageLayout,
    scroll: ScrollDepthTracker,
    dwell: DwellTracker,
    exited: bool,
}

struct Shared {
    session_id: String,
    config: TelemetryConfig,
    state: Mutex<RecorderState>,
    dispatcher: SinkDispatcher,
    prefs: Preferences,
    started_at: Instant,
    shutdown: CancellationToken,
}

/// Session-scoped event recorder. Cheap to clone; every clone shares one
/// session, one event log and one funnel log.
///
/// Recording never fails and never waits on delivery.
#[derive(Clone)]
pub struct TelemetryRecorder {
    shared: Arc<Shared>,
}

impl TelemetryRecorder {
    pub fn new(
        config: TelemetryConfig,
        sinks: Vec<Arc<dyn TelemetrySink>>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let state = RecorderState {
            user_id: None,
            events: Vec::new(),
            funnel: Vec::new(),
            layout: PageLayout::new(config.sections.clone()),
            scroll: ScrollDepthTracker::new(&config.scroll_thresholds),
            dwell: DwellTracker::new(&config.dwell_thresholds_secs),
            exited: false,
        };

        let recorder = Self {
            shared: Arc::new(Shared {
                session_id: generate_session_id(),
                config,
                state: Mutex::new(state),
                dispatcher: SinkDispatcher::new(sinks),
                prefs: Preferences::new(store),
                started_at: Instant::now(),
                shutdown: CancellationToken::new(),
            }),
        };

        let cfg = &recorder.shared.config;
        recorder.track(
            "page_load",
            Some(props([
                ("url", json!(cfg.page_url)),
                ("referrer", json!(cfg.referrer)),
                ("userAgent", json!(cfg.user_agent)),
            ])),
        );
        recorder.start_dwell_sampling();

        info!(session_id = %recorder.shared.session_id, "telemetry session started");
        recorder
    }

    /// Wires sinks and storage from configuration. A store that cannot be
    /// opened degrades to in-memory storage.
    pub fn from_config(
        config: &PlanetyConfig,
        mut extra_sinks: Vec<Arc<dyn TelemetrySink>>,
    ) -> Self {
        let telemetry = config.telemetry.clone();

        if let Some(endpoint) = &telemetry.collect_endpoint {
            let timeout = Duration::from_millis(telemetry.request_timeout_ms);
            extra_sinks.push(Arc::new(HttpSink::new(endpoint.clone(), timeout)));
        }

        let store: Arc<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => match JsonFileStore::open(path) {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "preference store unavailable; using memory"
                    );
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };

        Self::new(telemetry, extra_sinks, store)
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start_dwell_sampling(&self) {
        let handle = match Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                warn!("no async runtime; time-on-page sampling disabled");
                return;
            }
        };

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let token = self.shared.shutdown.clone();
        let period = Duration::from_secs(self.shared.config.dwell_poll_secs.max(1));

        handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(shared) = weak.upgrade() else { break };
                        TelemetryRecorder { shared }.poll_dwell();
                    }
                }
            }
            debug!("time-on-page sampling stopped");
        });
    }

    /// Builds the event under the lock; caller dispatches after releasing it.
    fn append(&self, st: &mut RecorderState, name: &str, properties: Option<Properties>) -> Event {
        let now = Utc::now();
        let mut properties = properties.unwrap_or_default();

        if !properties.contains_key(SECTION_KEY) {
            properties.insert(SECTION_KEY.to_string(), json!(st.layout.current_section()));
        }
        properties.insert(SESSION_ID_KEY.to_string(), json!(self.shared.session_id));
        match &st.user_id {
            Some(uid) => properties.insert(USER_ID_KEY.to_string(), json!(uid)),
            None => properties.remove(USER_ID_KEY),
        };
        properties.insert(TIMESTAMP_KEY.to_string(), json!(iso_timestamp(now)));
        properties.insert(URL_KEY.to_string(), json!(self.shared.config.page_url));

        let event = Event { name: name.to_string(), properties, occurred_at: now };
        st.events.push(event.clone());
        event
    }

    fn emit(&self, events: Vec<Event>) {
        for event in events {
            debug!(
                event = %event.name,
                properties = %(serde_json::Value::Object(event.properties.clone())),
                "analytics event"
            );
            self.shared.dispatcher.dispatch(&event);
        }
    }

    pub fn track(&self, name: &str, properties: Option<Properties>) {
        let event = {
            let mut st = self.state();
            self.append(&mut st, name, properties)
        };
        self.emit(vec![event]);
    }

    pub fn track_conversion_step(&self, step: &str, metadata: Option<Properties>) {
        let metadata = metadata.unwrap_or_default();

        let event = {
            let mut st = self.state();
            let step_number = st.funnel.len() as u64 + 1;

            let mut step_meta = metadata.clone();
            step_meta.insert(SESSION_ID_KEY.to_string(), json!(self.shared.session_id));
            if let Some(uid) = &st.user_id {
                step_meta.insert(USER_ID_KEY.to_string(), json!(uid));
            }
            st.funnel.push(FunnelStep {
                step: step.to_string(),
                step_number,
                timestamp: Utc::now(),
                metadata: step_meta,
            });

            let mut properties = metadata;
            properties.insert("funnel_step".to_string(), json!(step));
            properties.insert("step_number".to_string(), json!(step_number));
            self.append(&mut st, "conversion_funnel_step", Some(properties))
        };
        self.emit(vec![event]);
    }

    /// Identifies the visitor. Only the first identification sticks.
    pub fn set_user_id(&self, user_id: &str) -> bool {
        let event = {
            let mut st = self.state();
            if let Some(existing) = &st.user_id {
                warn!(
                    existing = %existing,
                    ignored = %user_id,
                    "user already identified for this session"
                );
                return false;
            }
            st.user_id = Some(user_id.to_string());
            self.append(&mut st, "user_identified", Some(props([("userId", json!(user_id))])))
        };
        self.emit(vec![event]);
        true
    }

    // Funnel vocabulary

    fn stage(&self, stage: FunnelStage, metadata: Option<Properties>) {
        self.track_conversion_step(stage.as_str(), metadata);
    }

    pub fn track_hero_engagement(&self) {
        self.stage(FunnelStage::HeroEngagement, None);
    }

    pub fn track_problem_recognition(&self) {
        self.stage(FunnelStage::ProblemRecognition, None);
    }

    pub fn track_solution_interest(&self) {
        self.stage(FunnelStage::SolutionInterest, None);
    }

    pub fn track_feature_exploration(&self, feature: &str) {
        self.stage(FunnelStage::FeatureExploration, Some(props([("feature", json!(feature))])));
    }

    pub fn track_trust_building(&self) {
        self.stage(FunnelStage::TrustBuilding, None);
    }

    pub fn track_cta_click(&self, cta_type: &str, location: &str) {
        self.stage(
            FunnelStage::CtaClick,
            Some(props([("ctaType", json!(cta_type)), ("location", json!(location))])),
        );
    }

    pub fn track_form_start(&self) {
        self.stage(FunnelStage::FormStart, None);
    }

    pub fn track_form_submit(&self, form_type: &str) {
        self.stage(FunnelStage::FormSubmit, Some(props([("formType", json!(form_type))])));
    }

    pub fn track_email_validation(&self) {
        self.stage(FunnelStage::EmailValidation, None);
    }

    // Interaction vocabulary

    pub fn track_button_click(&self, button_text: &str, location: &str, destination: Option<&str>) {
        let mut p = props([("button_text", json!(button_text)), ("location", json!(location))]);
        if let Some(dest) = destination {
            p.insert("destination".to_string(), json!(dest));
        }
        self.track("button_click", Some(p));
    }

    pub fn track_link_click(&self, link_text: &str, url: &str, location: &str) {
        self.track(
            "link_click",
            Some(props([
                ("link_text", json!(link_text)),
                ("url", json!(url)),
                ("location", json!(location)),
            ])),
        );
    }

    pub fn track_video_play(&self, video_title: &str) {
        self.track("video_play", Some(props([("video_title", json!(video_title))])));
    }

    pub fn track_feature_interaction(&self, feature_type: &str, action: &str) {
        self.track(
            "feature_interaction",
            Some(props([("feature_type", json!(feature_type)), ("action", json!(action))])),
        );
    }

    pub fn track_testimonial_interaction(&self, testimonial_index: usize, action: &str) {
        self.track(
            "testimonial_interaction",
            Some(props([
                ("testimonial_index", json!(testimonial_index)),
                ("action", json!(action)),
            ])),
        );
    }

    pub fn track_faq_interaction(&self, question_index: usize, action: FaqAction) {
        self.track(
            "faq_interaction",
            Some(props([
                ("question_index", json!(question_index)),
                ("action", json!(action.as_str())),
            ])),
        );
    }

    pub fn track_component_mount(&self, component: &str) {
        self.track("component_mount", Some(props([("component", json!(component))])));
    }

    // Page geometry and engagement

    pub fn set_viewport(&self, viewport_height: f64, document_height: f64) {
        self.state().layout.set_viewport(viewport_height, document_height);
    }

    pub fn set_section_bounds(&self, section_id: &str, top: f64, height: f64) {
        if !self.state().layout.set_section_bounds(section_id, SectionBounds { top, height }) {
            debug!(section_id, "bounds reported for unregistered section");
        }
    }

    pub fn current_section(&self) -> String {
        self.state().layout.current_section().to_string()
    }

    /// Feeds a scroll position. Each depth threshold fires once per session.
    pub fn on_scroll(&self, scroll_y: f64) {
        let events = {
            let mut st = self.state();
            st.layout.scroll_y = scroll_y.max(0.0);
            let percent = st.layout.scroll_percent();
            let crossed = st.scroll.observe(percent);

            let mut out = Vec::with_capacity(crossed.len());
            for threshold in crossed {
                let section = st.layout.current_section().to_string();
                let p = props([("percentage", json!(threshold)), ("section", json!(section))]);
                out.push(self.append(&mut st, "scroll_depth", Some(p)));
            }
            out
        };
        self.emit(events);
    }

    pub fn max_scroll_percent(&self) -> u32 {
        self.state().scroll.max_percent()
    }

    pub fn elapsed(&self) -> Duration {
        self.shared.started_at.elapsed()
    }

    /// Samples time on page against the dwell thresholds.
    pub fn poll_dwell(&self) {
        self.record_dwell(self.elapsed());
    }

    pub fn record_dwell(&self, elapsed: Duration) {
        let events = {
            let mut st = self.state();
            if st.exited {
                return;
            }
            let crossed = st.dwell.observe(elapsed.as_secs());

            let mut out = Vec::with_capacity(crossed.len());
            for seconds in crossed {
                let level = EngagementLevel::from_seconds(seconds);
                let p = props([
                    ("seconds", json!(seconds)),
                    ("engagement_level", json!(level.as_str())),
                ]);
                out.push(self.append(&mut st, "time_on_page", Some(p)));
            }
            out
        };
        self.emit(events);
    }

    /// Final event for the page. Stops background sampling; later calls are no-ops.
    pub fn page_exit(&self) {
        let event = {
            let mut st = self.state();
            if st.exited {
                return;
            }
            st.exited = true;
            let p = props([
                ("total_time_seconds", json!(self.elapsed().as_secs())),
                ("max_scroll_percent", json!(st.scroll.max_percent())),
            ]);
            self.append(&mut st, "page_exit", Some(p))
        };
        self.shared.shutdown.cancel();
        self.emit(vec![event]);
    }

    // Experiments and preferences

    /// Stable per-browser arm for `test_name`. New assignments are a fair
    /// coin flip, persisted and reported as `ab_test_assignment`.
    pub fn get_ab_test_variant(&self, test_name: &str) -> Variant {
        if let Some(stored) = self.shared.prefs.ab_variant(test_name) {
            match Variant::parse(&stored) {
                Some(v) => return v,
                None => {
                    warn!(test_name, stored = %stored, "discarding unrecognized stored variant")
                }
            }
        }

        let variant = if rand::random::<bool>() { Variant::A } else { Variant::B };
        self.shared.prefs.set_ab_variant(test_name, variant.as_str());
        self.track(
            "ab_test_assignment",
            Some(props([("test_name", json!(test_name)), ("variant", json!(variant.as_str()))])),
        );
        variant
    }

    /// Variant for `test_name`, recording that the visitor saw it.
    pub fn ab_test_view(&self, test_name: &str) -> Variant {
        let variant = self.get_ab_test_variant(test_name);
        self.track(
            "ab_test_view",
            Some(props([("test_name", json!(test_name)), ("variant", json!(variant.as_str()))])),
        );
        variant
    }

    pub fn preferences(&self) -> &Preferences {
        &self.shared.prefs
    }

    // Inspection

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    pub fn user_id(&self) -> Option<String> {
        self.state().user_id.clone()
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.shared.config
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn funnel_steps(&self) -> Vec<FunnelStep> {
        self.state().funnel.clone()
    }

    pub fn export_data(&self) -> AnalyticsExport {
        let st = self.state();
        AnalyticsExport {
            events: st.events.clone(),
            funnel_steps: st.funnel.clone(),
            session_id: self.shared.session_id.clone(),
            user_id: st.user_id.clone(),
        }
    }

    /// Writes the export as `planety-analytics-YYYY-MM-DD.json` under `dir`.
    pub fn export_to_file(&self, dir: &Path) -> Result<PathBuf, StorageError> {
        let path = dir.join(format!("planety-analytics-{}.json", Utc::now().format("%Y-%m-%d")));
        let json = serde_json::to_string_pretty(&self.export_data())?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "analytics exported");
        Ok(path)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let st = self.state();
        compute_snapshot(&st.events, &st.funnel, &st.scroll, &st.dwell)
    }

    /// Waits for in-flight sink deliveries.
    pub async fn flush(&self) {
        self.shared.dispatcher.flush().await;
    }

    pub fn delivery_failures(&self) -> Vec<DeliveryFailure> {
        self.shared.dispatcher.failures()
    }
}

fn generate_session_id() -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", Utc::now().timestamp_millis(), &entropy[..9])
}
