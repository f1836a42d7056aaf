use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::color::ColorRegistry;
use crate::model::RawEvent;
use crate::prelude::{DetectionSource, PollMode, SurfaceConfig, SyncError};
use crate::store::{DetectionStore, MergeResult};
use crate::telemetry::{LogManager, MetricsRecorder, SyncMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
    Polling,
}

/// What a surface should show while its history is empty or filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Loading,
    Empty,
    Ready(usize),
}

impl SurfaceStatus {
    pub fn label(&self) -> String {
        match self {
            SurfaceStatus::Loading => "Loading detections...".into(),
            SurfaceStatus::Empty => "No detections yet".into(),
            SurfaceStatus::Ready(1) => "1 detection".into(),
            SurfaceStatus::Ready(count) => format!("{} detections", count),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed(SyncError),
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    NoSignal,
    Merged(MergeResult),
    Failed(SyncError),
    Discarded,
}

struct Shared {
    state: SyncState,
    generation: u64,
    load_failed: bool,
    active: Option<CancellationToken>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one surface: a full load on activation, then a fixed-period tick
/// until deactivated.
///
/// Ticks run one after another on a single task, so a surface never has two
/// fetches in flight. Results are applied to the store only while the
/// activation that issued them is still current.
pub struct SyncController<S> {
    source: Arc<S>,
    store: Arc<DetectionStore>,
    config: SurfaceConfig,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    shared: Arc<Mutex<Shared>>,
}

impl<S> Clone for SyncController<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            logger: self.logger.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<S: DetectionSource + 'static> SyncController<S> {
    pub fn new(source: Arc<S>, config: SurfaceConfig, colors: Arc<ColorRegistry>) -> Self {
        let store = Arc::new(DetectionStore::new(config.capacity, colors));
        Self {
            source,
            store,
            logger: LogManager::new(&config.name),
            config,
            metrics: Arc::new(MetricsRecorder::new()),
            shared: Arc::new(Mutex::new(Shared {
                state: SyncState::Idle,
                generation: 0,
                load_failed: false,
                active: None,
            })),
        }
    }

    pub fn store(&self) -> Arc<DetectionStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn metrics(&self) -> SyncMetrics {
        self.metrics.snapshot()
    }

    pub fn state(&self) -> SyncState {
        lock(&self.shared).state
    }

    pub fn status(&self) -> SurfaceStatus {
        let (state, load_failed) = {
            let shared = lock(&self.shared);
            (shared.state, shared.load_failed)
        };
        let count = self.store.len();
        if count > 0 {
            SurfaceStatus::Ready(count)
        } else if state == SyncState::Loading && !load_failed {
            SurfaceStatus::Loading
        } else {
            SurfaceStatus::Empty
        }
    }

    /// Starts the surface. A previous activation, if any, is cancelled first.
    pub fn activate(&self) -> SurfaceHandle {
        let token = CancellationToken::new();
        let generation = {
            let mut shared = lock(&self.shared);
            if let Some(previous) = shared.active.replace(token.clone()) {
                previous.cancel();
            }
            shared.generation += 1;
            shared.state = SyncState::Loading;
            shared.load_failed = false;
            shared.generation
        };

        let controller = self.clone();
        let run_token = token.clone();
        let task = tokio::spawn(async move { controller.run(run_token, generation).await });

        SurfaceHandle {
            token,
            shared: self.shared.clone(),
            task: Some(task),
        }
    }

    async fn run(self, token: CancellationToken, generation: u64) {
        self.logger.record("activated; issuing full load");
        self.full_load(&token).await;

        if !token.is_cancelled() {
            self.set_state(generation, SyncState::Polling);
            let period = self.config.period;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => self.tick(&token).await,
                }
            }
        }

        self.set_state(generation, SyncState::Idle);
        self.logger.record("deactivated");
    }

    async fn tick(&self, token: &CancellationToken) {
        match self.config.mode {
            PollMode::Incremental => {
                self.poll_once(token).await;
            }
            PollMode::FullReload => {
                self.full_load(token).await;
            }
        }
    }

    /// Fetches the complete history and replaces the store with it.
    ///
    /// A failure leaves the store as it was.
    pub async fn full_load(&self, token: &CancellationToken) -> LoadOutcome {
        self.metrics.record_full_load();
        let result = self.source.all_detections().await;

        match result {
            Ok(events) => match self.apply_if_active(token, || self.store.load_all(events)) {
                Some(history) => {
                    lock(&self.shared).load_failed = false;
                    self.logger
                        .record(&format!("full load -> {} detections", history.len()));
                    LoadOutcome::Loaded(history.len())
                }
                None => self.discard("full load"),
            },
            Err(err) => {
                if token.is_cancelled() {
                    return self.discard("full load");
                }
                lock(&self.shared).load_failed = true;
                self.metrics.record_failure();
                self.logger.failure(&format!("full load failed: {}", err));
                LoadOutcome::Failed(err)
            }
        }
    }

    /// One incremental poll: signal, duplicate check, at most one
    /// enrichment fetch, then merge.
    pub async fn poll_once(&self, token: &CancellationToken) -> PollOutcome {
        self.metrics.record_poll();

        let signal = match self.source.detection_signal().await {
            Ok(signal) => signal,
            Err(err) => return self.poll_failed(token, err),
        };
        if token.is_cancelled() {
            return self.discard("poll");
        }

        let Some(mut raw) = signal.to_raw_event() else {
            self.logger.trace_tick("no new detection");
            return PollOutcome::NoSignal;
        };
        let timestamp = match raw.timestamp.to_instant() {
            Ok(timestamp) => timestamp,
            Err(err) => return self.poll_failed(token, err),
        };

        if self.store.contains(timestamp) {
            self.metrics.record_duplicate();
            self.logger.trace_tick("signalled detection already held");
            return PollOutcome::Merged(MergeResult::Duplicate);
        }

        if !signal.is_complete() {
            match self.source.latest_detection().await {
                Ok(Some(latest)) if latest.timestamp.to_instant().ok() == Some(timestamp) => {
                    raw = fill_from(latest, raw);
                }
                Ok(_) => self
                    .logger
                    .trace_tick("latest record does not match the signal; using signal payload"),
                Err(err) => return self.poll_failed(token, err),
            }
        }

        match self.apply_if_active(token, || self.store.merge_one(raw)) {
            Some(Ok(MergeResult::Inserted)) => {
                self.metrics.record_inserted();
                self.logger.record(&format!("merged detection at {}", timestamp));
                PollOutcome::Merged(MergeResult::Inserted)
            }
            Some(Ok(MergeResult::Duplicate)) => {
                self.metrics.record_duplicate();
                PollOutcome::Merged(MergeResult::Duplicate)
            }
            Some(Err(err)) => self.poll_failed(token, err),
            None => self.discard("poll"),
        }
    }

    fn apply_if_active<T>(&self, token: &CancellationToken, apply: impl FnOnce() -> T) -> Option<T> {
        let _shared = lock(&self.shared);
        if token.is_cancelled() {
            None
        } else {
            Some(apply())
        }
    }

    fn poll_failed(&self, token: &CancellationToken, err: SyncError) -> PollOutcome {
        if token.is_cancelled() {
            return self.discard("poll");
        }
        self.metrics.record_failure();
        self.logger.failure(&format!("poll failed: {}", err));
        PollOutcome::Failed(err)
    }

    fn discard<T: Discardable>(&self, what: &str) -> T {
        self.metrics.record_discarded();
        self.logger
            .trace_tick(&format!("discarding {} that finished after deactivation", what));
        T::discarded()
    }

    fn set_state(&self, generation: u64, state: SyncState) {
        let mut shared = lock(&self.shared);
        if shared.generation == generation {
            shared.state = state;
            if state == SyncState::Idle {
                shared.active = None;
            }
        }
    }
}

trait Discardable {
    fn discarded() -> Self;
}

impl Discardable for LoadOutcome {
    fn discarded() -> Self {
        LoadOutcome::Discarded
    }
}

impl Discardable for PollOutcome {
    fn discarded() -> Self {
        PollOutcome::Discarded
    }
}

/// Prefers the richer record, keeping signal fields it lacks.
fn fill_from(mut richer: RawEvent, signal: RawEvent) -> RawEvent {
    richer.location = richer.location.or(signal.location);
    richer.region = richer.region.or(signal.region);
    richer.confidence = richer.confidence.or(signal.confidence);
    richer.image_id = richer.image_id.or(signal.image_id);
    richer.location_source = richer.location_source.or(signal.location_source);
    richer
}

/// Handle to an active surface. Dropping it deactivates the surface.
pub struct SurfaceHandle {
    token: CancellationToken,
    shared: Arc<Mutex<Shared>>,
    task: Option<JoinHandle<()>>,
}

impl SurfaceHandle {
    /// Cancels the timer. Fetches already in flight finish, but their results
    /// are dropped once this returns.
    pub fn deactivate(&self) {
        let _shared = lock(&self.shared);
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Waits for the surface task to wind down after `deactivate`.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                log::warn!("surface task ended abnormally: {}", err);
            }
        }
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
