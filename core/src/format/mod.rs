//! Stateless presentation helpers shared by every surface.

pub mod confidence;
pub mod coords;
pub mod location;
pub mod relative;

pub use confidence::{clamp_confidence, ConfidenceBand};
pub use coords::{format_coordinates, parse_coordinates, CoordinateStyle, Coordinates};
pub use location::{classify_location_source, LocationSource};
pub use relative::{absolute_time, absolute_time_in, relative_time};
