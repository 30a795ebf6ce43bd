use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::engagement::{DwellTracker, ScrollDepthTracker};
use super::event::{Event, FunnelStep};

#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub total_events: u64,
    pub events_by_name: BTreeMap<String, u64>,
    pub funnel_stats: FunnelStats,
    pub engagement_stats: EngagementStats,
    pub interaction_stats: InteractionStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FunnelStats {
    pub steps: u64,
    pub distinct_stages: u64,
    pub last_stage: Option<String>,
    pub reached: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EngagementStats {
    pub max_scroll_percent: u32,
    pub scroll_milestones: Vec<u32>,
    pub dwell_milestones_secs: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InteractionStats {
    pub button_clicks: u64,
    pub link_clicks: u64,
    pub feature_interactions: u64,
    pub faq_interactions: u64,
    pub form_events: u64,
}

pub fn compute_snapshot(
    events: &[Event],
    funnel: &[FunnelStep],
    scroll: &ScrollDepthTracker,
    dwell: &DwellTracker,
) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        snap.total_events += 1;
        *snap.events_by_name.entry(event.name.clone()).or_insert(0) += 1;

        match event.name.as_str() {
            "button_click" => snap.interaction_stats.button_clicks += 1,
            "link_click" => snap.interaction_stats.link_clicks += 1,
            "feature_interaction" => snap.interaction_stats.feature_interactions += 1,
            "faq_interaction" => snap.interaction_stats.faq_interactions += 1,
            "form_start" | "form_submit" | "form_field_interaction" => {
                snap.interaction_stats.form_events += 1
            }
            _ => {}
        }
    }

    let mut distinct = BTreeSet::new();
    for step in funnel {
        snap.funnel_stats.steps += 1;
        *snap.funnel_stats.reached.entry(step.step.clone()).or_insert(0) += 1;
        distinct.insert(step.step.as_str());
    }
    snap.funnel_stats.distinct_stages = distinct.len() as u64;
    snap.funnel_stats.last_stage = funnel.last().map(|s| s.step.clone());

    snap.engagement_stats = EngagementStats {
        max_scroll_percent: scroll.max_percent(),
        scroll_milestones: scroll.milestones(),
        dwell_milestones_secs: dwell.milestones(),
    };

    snap
}
