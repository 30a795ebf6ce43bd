//! Session telemetry for the landing page.
//!
//! # INVARIANT
//! Telemetry is a passive, best-effort side channel. Recording never fails,
//! never blocks on delivery, and nothing it does can break the page.
//!
//! The event and funnel logs are append-only and live for one session.

pub mod engagement;
pub mod event;
pub mod metrics;
pub mod observer;
pub mod page;
pub mod recorder;
pub mod sink;
pub mod storage;
pub mod vitals;

pub use event::{Event, FunnelStage, FunnelStep, Properties};
pub use recorder::{AnalyticsExport, TelemetryRecorder, Variant};
