use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::color::PaletteColor;
use crate::format::{
    absolute_time, clamp_confidence, relative_time, ConfidenceBand, CoordinateStyle, Coordinates,
    LocationSource,
};
use crate::model::DetectionEvent;

/// Presentation record handed to list and map adapters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    pub key: String,
    pub color: PaletteColor,
    pub time: String,
    /// Local date and time, for detail screens.
    pub timestamp: String,
    pub location: String,
    pub region: String,
    pub confidence: Option<f64>,
    pub confidence_band: Option<ConfidenceBand>,
    pub location_source: LocationSource,
    /// Map pin position; `None` means the event is listed but not pinned.
    pub pin: Option<Coordinates>,
    pub image_id: Option<String>,
    pub image_path: Option<String>,
}

impl EventView {
    pub fn render(event: &DetectionEvent, now: DateTime<Utc>, style: CoordinateStyle) -> Self {
        let location = match event.coordinates {
            Some(coordinates) => coordinates.display(style.precision),
            None => style.sentinel.to_string(),
        };
        let confidence = event.confidence.map(clamp_confidence);

        Self {
            key: event.key.clone(),
            color: event.color,
            time: relative_time(event.timestamp, now),
            timestamp: absolute_time(event.timestamp),
            location,
            region: event.region.clone(),
            confidence,
            confidence_band: confidence.map(ConfidenceBand::from_percent),
            location_source: event.location_source,
            pin: event.coordinates,
            image_id: event.image_id.clone(),
            image_path: event
                .image_id
                .as_ref()
                .map(|image_id| format!("/detection_image/{image_id}")),
        }
    }

    /// One-line summary in the style of the activity list.
    pub fn summary(&self) -> String {
        match self.confidence {
            Some(confidence) => format!(
                "{} • {} • {:.0}% confidence",
                self.location, self.time, confidence
            ),
            None => format!("{} • {}", self.location, self.time),
        }
    }
}

pub fn render_all(
    events: &[DetectionEvent],
    now: DateTime<Utc>,
    style: CoordinateStyle,
) -> Vec<EventView> {
    events
        .iter()
        .map(|event| EventView::render(event, now, style))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorRegistry;
    use crate::model::RawEvent;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn renders_a_complete_event() {
        let colors = ColorRegistry::new();
        let raw = RawEvent::new(now() - Duration::minutes(45))
            .with_location("25.7617,-80.1918")
            .with_region("Biscayne Bay")
            .with_confidence(112.0)
            .with_image_id("img-3")
            .with_location_source("gps");
        let event = DetectionEvent::from_raw(raw, &colors).unwrap();
        let view = EventView::render(&event, now(), CoordinateStyle::COMPACT);

        assert_eq!(view.time, "45 min ago");
        assert_eq!(view.timestamp, absolute_time(now() - Duration::minutes(45)));
        assert_eq!(view.location, "25.7617° N, 80.1918° W");
        assert_eq!(view.confidence, Some(100.0));
        assert_eq!(view.confidence_band, Some(ConfidenceBand::High));
        assert_eq!(view.location_source, LocationSource::Gps);
        assert_eq!(view.image_path.as_deref(), Some("/detection_image/img-3"));
        assert_eq!(
            view.summary(),
            "25.7617° N, 80.1918° W • 45 min ago • 100% confidence"
        );
    }

    #[test]
    fn missing_confidence_and_bad_location_degrade_quietly() {
        let colors = ColorRegistry::new();
        let raw = RawEvent::new(now() - Duration::hours(3)).with_location("Main Camera");
        let event = DetectionEvent::from_raw(raw, &colors).unwrap();
        let view = EventView::render(&event, now(), CoordinateStyle::DETAILED);

        assert_eq!(view.location, "Location not available");
        assert!(view.pin.is_none());
        assert!(view.confidence.is_none());
        assert!(view.confidence_band.is_none());
        assert_eq!(view.summary(), "Location not available • 3 hours ago");
    }
}
