use chrono::{DateTime, Utc};
use log::warn;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::color::ColorRegistry;
use crate::model::{DetectionEvent, RawEvent};
use crate::prelude::SyncResult;

/// Maximum number of events a store retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Bounded(usize),
    Unbounded,
}

impl Capacity {
    fn truncate<T>(&self, events: &mut Vec<T>) {
        if let Capacity::Bounded(limit) = *self {
            events.truncate(limit);
        }
    }
}

/// Outcome of merging one observed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    Inserted,
    Duplicate,
}

/// Deduplicated detection history, newest first.
///
/// No two entries share a timestamp. Writers are serialized by the lock, so
/// the duplicate check and the insert happen as one step even when merges
/// from different ticks complete out of order.
pub struct DetectionStore {
    capacity: Capacity,
    colors: Arc<ColorRegistry>,
    events: RwLock<Vec<DetectionEvent>>,
}

impl DetectionStore {
    pub fn new(capacity: Capacity, colors: Arc<ColorRegistry>) -> Self {
        Self {
            capacity,
            colors,
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Replaces the contents with `events`, newest first, cut to capacity.
    ///
    /// Records whose timestamp cannot be read are skipped; repeated timestamps
    /// keep the first record seen. Only records that survive the cut are
    /// converted, so discarded ones never take a palette color.
    pub fn load_all(&self, events: Vec<RawEvent>) -> Vec<DetectionEvent> {
        let mut seen = HashSet::new();
        let mut batch = Vec::with_capacity(events.len());

        for raw in events {
            let timestamp = match raw.timestamp.to_instant() {
                Ok(timestamp) => timestamp,
                Err(err) => {
                    warn!("skipping detection record: {}", err);
                    continue;
                }
            };
            if seen.insert(timestamp) {
                batch.push((timestamp, raw));
            }
        }

        batch.sort_by(|(a, _), (b, _)| b.cmp(a));
        self.capacity.truncate(&mut batch);

        let mut history = Vec::with_capacity(batch.len());
        for (_, raw) in batch {
            match DetectionEvent::from_raw(raw, &self.colors) {
                Ok(event) => history.push(event),
                Err(err) => warn!("skipping detection record: {}", err),
            }
        }

        *self.write() = history.clone();
        history
    }

    /// Adds one event unless an event with the same timestamp is already held.
    ///
    /// The event lands at its timestamp position, which is the front for
    /// anything newer than the current head. The oldest entry is evicted when
    /// capacity is exceeded.
    pub fn merge_one(&self, raw: RawEvent) -> SyncResult<MergeResult> {
        let timestamp = raw.timestamp.to_instant()?;
        let mut events = self.write();
        if events.iter().any(|event| event.timestamp == timestamp) {
            return Ok(MergeResult::Duplicate);
        }

        let event = DetectionEvent::from_raw(raw, &self.colors)?;
        let position = events
            .iter()
            .position(|existing| existing.timestamp < timestamp)
            .unwrap_or(events.len());
        events.insert(position, event);
        self.capacity.truncate(&mut events);
        Ok(MergeResult::Inserted)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.read().iter().any(|event| event.timestamp == timestamp)
    }

    pub fn snapshot(&self) -> Vec<DetectionEvent> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<DetectionEvent>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<DetectionEvent>> {
        self.events.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PALETTE;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn store(capacity: Capacity) -> DetectionStore {
        DetectionStore::new(capacity, Arc::new(ColorRegistry::new()))
    }

    fn event_at(instant: DateTime<Utc>) -> RawEvent {
        RawEvent::new(instant).with_location("25.7617,-80.1918")
    }

    #[test]
    fn merging_the_same_timestamp_twice_is_a_duplicate() {
        let store = store(Capacity::Bounded(15));
        assert_eq!(store.merge_one(event_at(base())).unwrap(), MergeResult::Inserted);
        let before = store.snapshot();

        assert_eq!(store.merge_one(event_at(base())).unwrap(), MergeResult::Duplicate);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn bounded_store_keeps_the_fifteen_newest() {
        let store = store(Capacity::Bounded(15));
        for minute in 0..20 {
            let result = store
                .merge_one(event_at(base() + Duration::minutes(minute)))
                .unwrap();
            assert_eq!(result, MergeResult::Inserted);
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 15);
        let expected: Vec<_> = (5..20)
            .rev()
            .map(|minute| base() + Duration::minutes(minute))
            .collect();
        let actual: Vec<_> = snapshot.iter().map(|event| event.timestamp).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn load_all_orders_truncates_and_replaces() {
        let store = store(Capacity::Bounded(2));
        store.merge_one(event_at(base() - Duration::days(1))).unwrap();

        let loaded = store.load_all(vec![
            event_at(base() - Duration::hours(1)),
            event_at(base()),
            event_at(base() - Duration::minutes(10)),
        ]);

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].timestamp, base());
        assert_eq!(loaded[1].timestamp, base() - Duration::minutes(10));
        assert_eq!(store.snapshot(), loaded);
    }

    #[test]
    fn bounded_load_colors_only_what_it_keeps() {
        let colors = Arc::new(ColorRegistry::new());
        let store = DetectionStore::new(Capacity::Bounded(15), colors.clone());
        let events = (0..40)
            .map(|minute| {
                event_at(base() + Duration::minutes(minute)).with_image_id(&format!("img-{minute}"))
            })
            .collect();

        let loaded = store.load_all(events);
        assert_eq!(loaded.len(), 15);
        assert_eq!(colors.len(), 15);
        assert_eq!(loaded[0].key, "img-39");
        assert_eq!(loaded[0].color, PALETTE[0]);
    }

    #[test]
    fn unbounded_store_keeps_everything() {
        let store = store(Capacity::Unbounded);
        let events = (0..40)
            .map(|minute| event_at(base() + Duration::minutes(minute)))
            .collect();
        assert_eq!(store.load_all(events).len(), 40);
    }

    #[test]
    fn load_all_skips_unreadable_and_repeated_timestamps() {
        let store = store(Capacity::Unbounded);
        let loaded = store.load_all(vec![
            event_at(base()),
            RawEvent::new(crate::model::RawTimestamp::Text("soon".into())),
            event_at(base()).with_region("Reef B"),
        ]);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].region, crate::model::DEFAULT_REGION);
    }

    #[test]
    fn full_load_then_polls_scenario() {
        let t = base();
        let store = store(Capacity::Bounded(15));
        store.load_all(vec![
            event_at(t - Duration::hours(1)),
            event_at(t - Duration::minutes(10)),
            event_at(t),
        ]);

        let next = t + Duration::minutes(1);
        assert_eq!(store.merge_one(event_at(next)).unwrap(), MergeResult::Inserted);
        assert_eq!(store.merge_one(event_at(next)).unwrap(), MergeResult::Duplicate);

        let order: Vec<_> = store.snapshot().iter().map(|e| e.timestamp).collect();
        assert_eq!(
            order,
            vec![
                next,
                t,
                t - Duration::minutes(10),
                t - Duration::hours(1)
            ]
        );
    }

    #[test]
    fn late_arriving_older_event_keeps_order() {
        let store = store(Capacity::Unbounded);
        store.merge_one(event_at(base())).unwrap();
        store.merge_one(event_at(base() - Duration::minutes(5))).unwrap();
        let order: Vec<_> = store.snapshot().iter().map(|e| e.timestamp).collect();
        assert_eq!(order, vec![base(), base() - Duration::minutes(5)]);
    }

    #[test]
    fn malformed_location_is_still_stored() {
        let store = store(Capacity::Bounded(15));
        let raw = RawEvent::new(base()).with_location("lat?lng?");
        assert_eq!(store.merge_one(raw).unwrap(), MergeResult::Inserted);
        let held = &store.snapshot()[0];
        assert!(held.coordinates.is_none());
        assert_eq!(held.location.as_deref(), Some("lat?lng?"));
    }

    #[test]
    fn colors_follow_observation_order_across_stores() {
        let colors = Arc::new(ColorRegistry::new());
        let list = DetectionStore::new(Capacity::Bounded(15), colors.clone());
        let map = DetectionStore::new(Capacity::Unbounded, colors.clone());

        list.merge_one(event_at(base()).with_image_id("a")).unwrap();
        list.merge_one(event_at(base() + Duration::minutes(1)).with_image_id("b"))
            .unwrap();
        map.load_all(vec![
            event_at(base() + Duration::minutes(1)).with_image_id("b"),
            event_at(base()).with_image_id("a"),
        ]);

        let on_map = map.snapshot();
        assert_eq!(on_map[0].color, PALETTE[1]);
        assert_eq!(on_map[1].color, PALETTE[0]);
        assert_eq!(list.snapshot()[0].color, on_map[0].color);
    }
}
