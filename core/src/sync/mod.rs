pub mod controller;
pub mod http;

pub use controller::{
    LoadOutcome, PollOutcome, SurfaceHandle, SurfaceStatus, SyncController, SyncState,
};
pub use http::HttpDetectionSource;
pub use tokio_util::sync::CancellationToken;
