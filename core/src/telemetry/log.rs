use log::{debug, info, warn};

/// Surface-tagged wrapper over the `log` facade.
#[derive(Debug, Clone)]
pub struct LogManager {
    surface: String,
}

impl LogManager {
    pub fn new(surface: &str) -> Self {
        Self {
            surface: surface.to_string(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.surface, message);
    }

    pub fn trace_tick(&self, message: &str) {
        debug!("[{}] {}", self.surface, message);
    }

    pub fn failure(&self, message: &str) {
        warn!("[{}] {}", self.surface, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("feed")
    }
}
