use serde::Serialize;

use crate::prelude::{SyncError, SyncResult};

/// Parsed latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Call-site choice of precision and of the text shown for unusable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateStyle {
    pub precision: usize,
    pub sentinel: &'static str,
}

impl CoordinateStyle {
    /// List rows and map cards.
    pub const COMPACT: CoordinateStyle = CoordinateStyle {
        precision: 4,
        sentinel: "Unknown Location",
    };

    /// Single-event detail view.
    pub const DETAILED: CoordinateStyle = CoordinateStyle {
        precision: 6,
        sentinel: "Location not available",
    };
}

pub fn parse_coordinates(raw: &str) -> SyncResult<Coordinates> {
    let malformed = || SyncError::MalformedLocation(raw.to_string());
    let (lat, lng) = raw.split_once(',').ok_or_else(malformed)?;
    let latitude: f64 = lat.trim().parse().map_err(|_| malformed())?;
    let longitude: f64 = lng.trim().parse().map_err(|_| malformed())?;

    if !latitude.is_finite()
        || !longitude.is_finite()
        || latitude.abs() > 90.0
        || longitude.abs() > 180.0
    {
        return Err(malformed());
    }

    Ok(Coordinates {
        latitude,
        longitude,
    })
}

/// Formats a raw "lat,lng" string as `25.7617° N, 80.1918° W`, or returns the
/// style's sentinel when the string cannot be parsed.
pub fn format_coordinates(raw: &str, style: CoordinateStyle) -> String {
    match parse_coordinates(raw) {
        Ok(coordinates) => coordinates.display(style.precision),
        Err(_) => style.sentinel.to_string(),
    }
}

impl Coordinates {
    pub fn display(&self, precision: usize) -> String {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        format!(
            "{:.p$}° {}, {:.p$}° {}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew,
            p = precision
        )
    }
}
