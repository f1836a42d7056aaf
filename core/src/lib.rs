//! Detection feed synchronization for the SpawnKiller viewer.
//!
//! Polls the detection service, keeps a bounded, deduplicated, time-ordered
//! history per surface, and derives the presentation attributes (color,
//! relative time, coordinates, location source) the list and map views show.

pub mod color;
pub mod format;
pub mod model;
pub mod prelude;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod view;

pub use color::{ColorRegistry, PaletteColor, PALETTE};
pub use prelude::{DetectionSource, PollMode, SurfaceConfig, SyncError, SyncResult};
pub use store::{Capacity, DetectionStore, MergeResult};
pub use sync::{HttpDetectionSource, SurfaceHandle, SyncController};
