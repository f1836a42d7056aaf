use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::event::{string_or_number, RawEvent, RawTimestamp};

/// Body of `/all_detections`. Records stay as raw JSON so one bad entry
/// does not sink the whole response.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionsEnvelope {
    pub detections: Vec<Value>,
}

/// Body of `/detection_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSignal {
    #[serde(default)]
    pub detected: bool,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub image_id: Option<String>,
    #[serde(default)]
    pub location_source: Option<String>,
}

impl DetectionSignal {
    /// Timestamp of the signalled detection, if one was actually signalled.
    pub fn signalled_timestamp(&self) -> Option<&RawTimestamp> {
        if !self.detected {
            return None;
        }
        self.timestamp.as_ref().filter(|timestamp| !timestamp.is_blank())
    }

    /// True when the signal already carries location and region detail.
    pub fn is_complete(&self) -> bool {
        let present = |value: &Option<String>| {
            value.as_deref().is_some_and(|text| !text.trim().is_empty())
        };
        present(&self.location) && present(&self.region)
    }

    pub fn to_raw_event(&self) -> Option<RawEvent> {
        let timestamp = self.signalled_timestamp()?.clone();
        Some(RawEvent {
            id: None,
            timestamp,
            location: self.location.clone(),
            region: self.region.clone(),
            confidence: self.confidence,
            image_id: self.image_id.clone(),
            location_source: self.location_source.clone(),
        })
    }
}
