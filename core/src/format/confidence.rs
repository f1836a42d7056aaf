use serde::Serialize;

/// Styling band for the confidence bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_percent(percent: f64) -> Self {
        let percent = clamp_confidence(percent);
        if percent > 80.0 {
            ConfidenceBand::High
        } else if percent > 60.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

pub fn clamp_confidence(percent: f64) -> f64 {
    percent.clamp(0.0, 100.0)
}
