use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form event payload. Keys are camelCase or snake_case as the caller chose.
pub type Properties = Map<String, Value>;

// Keys the recorder attaches to every event
pub const SESSION_ID_KEY: &str = "sessionId";
pub const USER_ID_KEY: &str = "userId";
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const URL_KEY: &str = "url";
pub const SECTION_KEY: &str = "section";

/// One observed occurrence. Never mutated after the recorder appends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub name: String,
    pub properties: Properties,
    #[serde(rename = "timestamp")]
    pub occurred_at: DateTime<Utc>,
}

impl Event {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.property(SESSION_ID_KEY).and_then(Value::as_str)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.property(TIMESTAMP_KEY).and_then(Value::as_str)
    }
}

/// A waypoint on the conversion path. `step_number` is the 1-based insertion
/// position in the session's funnel log, so repeated stages keep counting up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStep {
    pub step: String,
    pub step_number: u64,
    pub timestamp: DateTime<Utc>,
    pub metadata: Properties,
}

/// The intended journey, in the order the page is designed to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    HeroEngagement,
    ProblemRecognition,
    SolutionInterest,
    FeatureExploration,
    TrustBuilding,
    CtaClick,
    FormStart,
    FormSubmit,
    EmailValidation,
}

impl FunnelStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStage::HeroEngagement => "hero_engagement",
            FunnelStage::ProblemRecognition => "problem_recognition",
            FunnelStage::SolutionInterest => "solution_interest",
            FunnelStage::FeatureExploration => "feature_exploration",
            FunnelStage::TrustBuilding => "trust_building",
            FunnelStage::CtaClick => "cta_click",
            FunnelStage::FormStart => "form_start",
            FunnelStage::FormSubmit => "form_submit",
            FunnelStage::EmailValidation => "email_validation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaqAction {
    Open,
    Close,
}

impl FaqAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaqAction::Open => "open",
            FaqAction::Close => "close",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAction {
    Focus,
    Blur,
    Change,
}

impl FieldAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldAction::Focus => "focus",
            FieldAction::Blur => "blur",
            FieldAction::Change => "change",
        }
    }
}

/// Qualitative dwell-time label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EngagementLevel {
    pub fn from_seconds(seconds: u64) -> Self {
        match seconds {
            s if s >= 300 => EngagementLevel::VeryHigh,
            s if s >= 120 => EngagementLevel::High,
            s if s >= 60 => EngagementLevel::Medium,
            s if s >= 30 => EngagementLevel::Low,
            _ => EngagementLevel::VeryLow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLevel::VeryLow => "very_low",
            EngagementLevel::Low => "low",
            EngagementLevel::Medium => "medium",
            EngagementLevel::High => "high",
            EngagementLevel::VeryHigh => "very_high",
        }
    }
}

/// ISO-8601 with millisecond precision, `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Builds a property map from `(key, value)` pairs.
pub fn props<K, I>(pairs: I) -> Properties
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
