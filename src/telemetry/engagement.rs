use std::collections::BTreeSet;

/// Fires each threshold at most once, the first time an observed value reaches it.
#[derive(Debug, Clone)]
pub struct MilestoneTracker {
    thresholds: Vec<u64>,
    fired: BTreeSet<u64>,
}

impl MilestoneTracker {
    pub fn new(mut thresholds: Vec<u64>) -> Self {
        thresholds.sort_unstable();
        thresholds.dedup();
        Self { thresholds, fired: BTreeSet::new() }
    }

    /// Returns the thresholds newly crossed by `value`, ascending.
    pub fn observe(&mut self, value: u64) -> Vec<u64> {
        let mut crossed = Vec::new();
        for &t in &self.thresholds {
            if value < t {
                break;
            }
            if self.fired.insert(t) {
                crossed.push(t);
            }
        }
        crossed
    }

    pub fn fired(&self) -> impl Iterator<Item = u64> + '_ {
        self.fired.iter().copied()
    }
}

/// Scroll milestones plus the deepest point reached this session.
#[derive(Debug, Clone)]
pub struct ScrollDepthTracker {
    milestones: MilestoneTracker,
    max_percent: u32,
}

impl ScrollDepthTracker {
    pub fn new(thresholds: &[u32]) -> Self {
        Self {
            milestones: MilestoneTracker::new(thresholds.iter().map(|&t| t as u64).collect()),
            max_percent: 0,
        }
    }

    pub fn observe(&mut self, percent: u32) -> Vec<u32> {
        self.max_percent = self.max_percent.max(percent);
        self.milestones.observe(percent as u64).into_iter().map(|t| t as u32).collect()
    }

    pub fn max_percent(&self) -> u32 {
        self.max_percent
    }

    pub fn milestones(&self) -> Vec<u32> {
        self.milestones.fired().map(|t| t as u32).collect()
    }
}

/// Time-on-page milestones, in whole seconds since load.
#[derive(Debug, Clone)]
pub struct DwellTracker {
    milestones: MilestoneTracker,
}

impl DwellTracker {
    pub fn new(thresholds_secs: &[u64]) -> Self {
        Self { milestones: MilestoneTracker::new(thresholds_secs.to_vec()) }
    }

    pub fn observe(&mut self, elapsed_secs: u64) -> Vec<u64> {
        self.milestones.observe(elapsed_secs)
    }

    pub fn milestones(&self) -> Vec<u64> {
        self.milestones.fired().collect()
    }
}
