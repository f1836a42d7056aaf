use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::color::{ColorRegistry, PaletteColor};
use crate::format::coords::{parse_coordinates, Coordinates};
use crate::format::location::{classify_location_source, LocationSource};
use crate::prelude::{SyncError, SyncResult};

/// Region label used when the service does not send one.
pub const DEFAULT_REGION: &str = "Unknown Area";

const NAIVE_PATTERNS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Timestamp exactly as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    pub fn is_blank(&self) -> bool {
        matches!(self, RawTimestamp::Text(text) if text.trim().is_empty())
    }

    pub fn to_instant(&self) -> SyncResult<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(millis) => DateTime::<Utc>::from_timestamp_millis(*millis)
                .ok_or_else(|| SyncError::MalformedResponse(format!("timestamp {millis} out of range"))),
            RawTimestamp::Text(text) => parse_timestamp(text),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        RawTimestamp::Text(instant.to_rfc3339())
    }
}

impl From<i64> for RawTimestamp {
    fn from(millis: i64) -> Self {
        RawTimestamp::Millis(millis)
    }
}

/// Parses RFC 3339, naive local date-times, or epoch milliseconds in a string.
pub fn parse_timestamp(text: &str) -> SyncResult<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for pattern in NAIVE_PATTERNS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| {
                    SyncError::MalformedResponse(format!("nonexistent local time {trimmed:?}"))
                });
        }
    }

    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(instant) = trimmed
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            return Ok(instant);
        }
    }

    Err(SyncError::MalformedResponse(format!(
        "unrecognised timestamp {trimmed:?}"
    )))
}

/// Accepts identifiers sent either as JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Detection record as served by `/all_detections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub timestamp: RawTimestamp,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub image_id: Option<String>,
    #[serde(default)]
    pub location_source: Option<String>,
}

impl RawEvent {
    pub fn new(timestamp: impl Into<RawTimestamp>) -> Self {
        Self {
            id: None,
            timestamp: timestamp.into(),
            location: None,
            region: None,
            confidence: None,
            image_id: None,
            location_source: None,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_image_id(mut self, image_id: &str) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_location_source(mut self, source: &str) -> Self {
        self.location_source = Some(source.into());
        self
    }
}

/// Canonical, enriched detection held by a `DetectionStore`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    /// Image id, else server id, else the timestamp in epoch millis.
    ///
    /// The poll signal carries the image id but never the server id, so the
    /// image id comes first to keep both arrival paths on one key.
    pub key: String,
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Raw "lat,lng" string, kept even when it does not parse.
    pub location: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub location_source: LocationSource,
    pub region: String,
    pub confidence: Option<f64>,
    pub image_id: Option<String>,
    pub color: PaletteColor,
}

impl DetectionEvent {
    pub fn from_raw(raw: RawEvent, colors: &ColorRegistry) -> SyncResult<Self> {
        let timestamp = raw.timestamp.to_instant()?;
        let key = raw
            .image_id
            .clone()
            .or_else(|| raw.id.clone())
            .unwrap_or_else(|| timestamp.timestamp_millis().to_string());

        let location = raw.location.filter(|value| !value.trim().is_empty());
        let coordinates = location
            .as_deref()
            .and_then(|value| parse_coordinates(value).ok());
        let region = raw.region.filter(|value| !value.trim().is_empty());
        let location_source = classify_location_source(
            raw.location_source.as_deref(),
            location.is_some() || region.is_some(),
        );

        Ok(Self {
            color: colors.color_for(&key),
            key,
            id: raw.id,
            timestamp,
            location,
            coordinates,
            location_source,
            region: region.unwrap_or_else(|| DEFAULT_REGION.into()),
            confidence: raw.confidence.filter(|value| value.is_finite()),
            image_id: raw.image_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_parse_from_every_supported_shape() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        let rfc = RawTimestamp::Text("2025-03-01T12:30:00Z".into());
        let millis = RawTimestamp::Millis(expected.timestamp_millis());
        let digits = RawTimestamp::Text(expected.timestamp_millis().to_string());

        assert_eq!(rfc.to_instant().unwrap(), expected);
        assert_eq!(millis.to_instant().unwrap(), expected);
        assert_eq!(digits.to_instant().unwrap(), expected);
    }

    #[test]
    fn naive_service_timestamps_are_local_time() {
        let parsed = parse_timestamp("2025-03-01 12:30:00").unwrap();
        let naive = NaiveDateTime::parse_from_str("2025-03-01 12:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let local = Local.from_local_datetime(&naive).earliest().unwrap();
        assert_eq!(parsed, local.with_timezone(&Utc));
    }

    #[test]
    fn garbage_timestamp_is_malformed_response() {
        let err = parse_timestamp("yesterday-ish").unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse(_)));
    }

    #[test]
    fn raw_event_decodes_numeric_ids_and_optional_fields() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"id": 42, "timestamp": "2025-03-01T12:30:00Z", "location": "25.7617,-80.1918",
                "confidence": 91.5, "image_id": "img-7"}"#,
        )
        .unwrap();
        assert_eq!(raw.id.as_deref(), Some("42"));
        assert_eq!(raw.image_id.as_deref(), Some("img-7"));
        assert!(raw.region.is_none());
        assert!(raw.location_source.is_none());
    }

    #[test]
    fn conversion_fills_defaults_and_keeps_bad_locations() {
        let colors = ColorRegistry::new();
        let raw = RawEvent::new(1_700_000_000_000).with_location("not-a-location");
        let event = DetectionEvent::from_raw(raw, &colors).unwrap();

        assert_eq!(event.region, DEFAULT_REGION);
        assert_eq!(event.location.as_deref(), Some("not-a-location"));
        assert!(event.coordinates.is_none());
        assert_eq!(event.location_source, LocationSource::Approximate);
        assert!(event.confidence.is_none());
        assert_eq!(event.key, "1700000000000");
    }

    #[test]
    fn canonical_key_prefers_image_id_then_server_id() {
        let colors = ColorRegistry::new();
        let both = RawEvent::new(1_000).with_id("det-1").with_image_id("img-1");
        let id_only = RawEvent::new(2_000).with_id("det-2");
        let from_signal = RawEvent::new(1_000).with_image_id("img-1");

        let full = DetectionEvent::from_raw(both, &colors).unwrap();
        let polled = DetectionEvent::from_raw(from_signal, &colors).unwrap();
        assert_eq!(full.key, "img-1");
        assert_eq!(polled.key, full.key);
        assert_eq!(polled.color, full.color);
        assert_eq!(DetectionEvent::from_raw(id_only, &colors).unwrap().key, "det-2");
        assert_eq!(colors.len(), 2);
    }
}
