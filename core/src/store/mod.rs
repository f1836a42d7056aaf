pub mod history;

pub use history::{Capacity, DetectionStore, MergeResult};
