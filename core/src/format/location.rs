use serde::{Deserialize, Serialize};

/// Marker the detection service writes when a fix came from GPS.
pub const GPS_MARKER: &str = "gps";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationSource {
    Gps,
    Approximate,
    Unknown,
}

impl LocationSource {
    pub fn label(&self) -> &'static str {
        match self {
            LocationSource::Gps => "GPS",
            LocationSource::Approximate => "Approximate",
            LocationSource::Unknown => "Unknown",
        }
    }
}

pub fn classify_location_source(source: Option<&str>, has_location: bool) -> LocationSource {
    match source {
        Some(marker) if marker.trim().eq_ignore_ascii_case(GPS_MARKER) => LocationSource::Gps,
        _ if has_location => LocationSource::Approximate,
        _ => LocationSource::Unknown,
    }
}
