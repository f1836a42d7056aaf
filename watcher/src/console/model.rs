use chrono::{DateTime, Utc};
use feedsync::format::CoordinateStyle;
use feedsync::telemetry::SyncMetrics;
use feedsync::view::{render_all, EventView};
use feedsync::{DetectionSource, SyncController};
use serde::Serialize;

/// Rendered state of one surface at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceReport {
    pub surface: String,
    pub status: String,
    pub pinned: usize,
    pub rows: Vec<EventView>,
    pub metrics: SyncMetrics,
}

impl SurfaceReport {
    pub fn capture<S: DetectionSource + 'static>(
        controller: &SyncController<S>,
        now: DateTime<Utc>,
    ) -> Self {
        let rows = render_all(
            &controller.store().snapshot(),
            now,
            CoordinateStyle::COMPACT,
        );
        Self {
            surface: controller.config().name.clone(),
            status: controller.status().label(),
            pinned: rows.iter().filter(|row| row.pin.is_some()).count(),
            rows,
            metrics: controller.metrics(),
        }
    }
}
