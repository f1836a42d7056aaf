use crate::console::model::SurfaceReport;
use crate::console::printer::ConsolePrinter;
use crate::workflow::config::WatcherConfig;
use anyhow::Context;
use chrono::Utc;
use feedsync::sync::{CancellationToken, LoadOutcome};
use feedsync::{ColorRegistry, HttpDetectionSource, SyncController};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Wires one HTTP source and one color registry into the list and map
/// surfaces.
pub struct Runner {
    list: SyncController<HttpDetectionSource>,
    map: SyncController<HttpDetectionSource>,
    printer: ConsolePrinter,
}

impl Runner {
    pub fn new(config: &WatcherConfig) -> anyhow::Result<Self> {
        let source = Arc::new(
            HttpDetectionSource::new(&config.server_url, config.request_timeout())
                .context("creating detection source")?,
        );
        let colors = Arc::new(ColorRegistry::new());

        Ok(Self {
            list: SyncController::new(source.clone(), config.list_surface(), colors.clone()),
            map: SyncController::new(source, config.map_surface(), colors),
            printer: ConsolePrinter::new(10),
        })
    }

    pub fn list(&self) -> &SyncController<HttpDetectionSource> {
        &self.list
    }

    pub fn map(&self) -> &SyncController<HttpDetectionSource> {
        &self.map
    }

    pub fn printer(&self) -> &ConsolePrinter {
        &self.printer
    }

    pub fn reports(&self) -> Vec<SurfaceReport> {
        let now = Utc::now();
        vec![
            SurfaceReport::capture(&self.list, now),
            SurfaceReport::capture(&self.map, now),
        ]
    }

    /// One full load per surface, without starting their timers.
    pub async fn run_once(&self) -> Vec<SurfaceReport> {
        let token = CancellationToken::new();
        for controller in [&self.list, &self.map] {
            if let LoadOutcome::Failed(err) = controller.full_load(&token).await {
                self.printer.publish_status(&format!(
                    "{} full load failed: {}",
                    controller.config().name,
                    err
                ));
            }
        }
        self.reports()
    }

    /// Keeps both surfaces active and prints them every `refresh` until
    /// `shutdown` resolves.
    pub async fn serve<F: Future<Output = ()>>(&self, refresh: Duration, shutdown: F) {
        let list = self.list.activate();
        let map = self.map.activate();
        let mut ticker = tokio::time::interval(refresh.max(Duration::from_millis(100)));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    for report in self.reports() {
                        self.printer.publish(&report);
                    }
                }
            }
        }

        list.deactivate();
        map.deactivate();
        list.join().await;
        map.join().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync::sync::SyncState;
    use serde_json::json;
    use warp::http::StatusCode;
    use warp::Filter;

    macro_rules! serve {
        ($routes:expr) => {{
            let (addr, server) = warp::serve($routes).bind_ephemeral(([127, 0, 0, 1], 0));
            tokio::spawn(server);
            format!("http://{}", addr)
        }};
    }

    fn detections_route() -> impl Filter<Extract = (warp::reply::Json,), Error = warp::Rejection> + Clone {
        warp::path("all_detections").map(|| {
            let now = Utc::now();
            warp::reply::json(&json!({
                "detections": [
                    {"timestamp": (now - chrono::Duration::minutes(61)).to_rfc3339(),
                     "location": "25.7617,-80.1918", "confidence": 55, "image_id": "a"},
                    {"timestamp": now.to_rfc3339(), "location": "Main Camera",
                     "confidence": 93, "image_id": "c"},
                    {"timestamp": (now - chrono::Duration::minutes(12)).to_rfc3339(),
                     "location": "25.7701,-80.1300", "region": "Key Biscayne",
                     "image_id": "b", "location_source": "gps"}
                ]
            }))
        })
    }

    fn runner_for(base: String) -> Runner {
        let config = WatcherConfig {
            server_url: base,
            ..Default::default()
        };
        Runner::new(&config).unwrap()
    }

    #[tokio::test]
    async fn run_once_loads_both_surfaces() {
        let runner = runner_for(serve!(detections_route()));
        let reports = runner.run_once().await;

        let (list, map) = (&reports[0], &reports[1]);
        assert_eq!(list.surface, "list");
        assert_eq!(list.status, "3 detections");
        assert_eq!(map.pinned, 2);
        assert_eq!(list.rows[0].location, "Unknown Location");
        assert_eq!(list.rows[2].time, "1 hour ago");
        for (on_list, on_map) in list.rows.iter().zip(&map.rows) {
            assert_eq!(on_list.key, on_map.key);
            assert_eq!(on_list.color, on_map.color);
        }
    }

    #[tokio::test]
    async fn failing_service_degrades_to_empty_surfaces() {
        let down = warp::any().map(|| warp::reply::with_status("down", StatusCode::BAD_GATEWAY));
        let runner = runner_for(serve!(down));
        let reports = runner.run_once().await;

        for report in &reports {
            assert_eq!(report.status, "No detections yet");
            assert_eq!(report.metrics.failures, 1);
        }
    }

    #[tokio::test]
    async fn serve_returns_after_shutdown_and_leaves_surfaces_idle() {
        let signal = warp::path("detection_data")
            .map(|| warp::reply::json(&json!({"detected": false, "timestamp": ""})));
        let runner = runner_for(serve!(detections_route().or(signal)));

        runner
            .serve(
                Duration::from_millis(100),
                tokio::time::sleep(Duration::from_millis(250)),
            )
            .await;

        assert_eq!(runner.list().state(), SyncState::Idle);
        assert_eq!(runner.map().state(), SyncState::Idle);
        assert_eq!(runner.list().store().len(), 3);
    }
}
