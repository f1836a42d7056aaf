pub mod event;
pub mod wire;

pub use event::{parse_timestamp, DetectionEvent, RawEvent, RawTimestamp, DEFAULT_REGION};
pub use wire::{DetectionSignal, DetectionsEnvelope};
