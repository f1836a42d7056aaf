use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{DetectionSignal, RawEvent};
use crate::store::Capacity;

/// How a surface refreshes its store on each tick after the initial full load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    /// Ask the lightweight signal endpoint and merge at most one new event.
    Incremental,
    /// Re-fetch the complete history and replace the store wholesale.
    FullReload,
}

/// Per-surface configuration for a sync controller.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub name: String,
    pub capacity: Capacity,
    pub period: Duration,
    pub mode: PollMode,
}

impl SurfaceConfig {
    /// Reverse-chronological list: 15 most recent events, polled every 8 seconds.
    pub fn list() -> Self {
        Self {
            name: "list".into(),
            capacity: Capacity::Bounded(15),
            period: Duration::from_secs(8),
            mode: PollMode::Incremental,
        }
    }

    /// Map markers: the full remote history, reloaded every 30 seconds.
    pub fn map() -> Self {
        Self {
            name: "map".into(),
            capacity: Capacity::Unbounded,
            period: Duration::from_secs(30),
            mode: PollMode::FullReload,
        }
    }
}

/// Common error type for fetching and interpreting detection data.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("malformed location: {0}")]
    MalformedLocation(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Remote source of detection events.
#[async_trait]
pub trait DetectionSource: Send + Sync {
    /// Complete current history (`GET /all_detections`).
    async fn all_detections(&self) -> SyncResult<Vec<RawEvent>>;
    /// Most recent single record (`GET /all_detections?single=true`).
    async fn latest_detection(&self) -> SyncResult<Option<RawEvent>>;
    /// Lightweight "has something new happened" signal (`GET /detection_data`).
    async fn detection_signal(&self) -> SyncResult<DetectionSignal>;
}
