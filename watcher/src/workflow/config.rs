use anyhow::Context;
use feedsync::{Capacity, PollMode, SurfaceConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSettings {
    pub interval_secs: u64,
    /// Absent means the surface keeps the full remote history.
    #[serde(default)]
    pub capacity: Option<usize>,
    pub mode: PollMode,
}

impl SurfaceSettings {
    pub fn list() -> Self {
        Self {
            interval_secs: 8,
            capacity: Some(15),
            mode: PollMode::Incremental,
        }
    }

    pub fn map() -> Self {
        Self {
            interval_secs: 30,
            capacity: None,
            mode: PollMode::FullReload,
        }
    }

    fn to_surface_config(&self, name: &str) -> SurfaceConfig {
        SurfaceConfig {
            name: name.into(),
            capacity: match self.capacity {
                Some(limit) => Capacity::Bounded(limit.max(1)),
                None => Capacity::Unbounded,
            },
            period: Duration::from_secs(self.interval_secs.max(1)),
            mode: self.mode,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub list: SurfaceSettings,
    pub map: SurfaceSettings,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            request_timeout_secs: 10,
            list: SurfaceSettings::list(),
            map: SurfaceSettings::map(),
        }
    }
}

impl WatcherConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading watcher config {}", path_ref.display()))?;
        let config: WatcherConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing watcher config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        server_url: &str,
        list_interval_secs: u64,
        map_interval_secs: u64,
        list_capacity: usize,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            list: SurfaceSettings {
                interval_secs: list_interval_secs,
                capacity: Some(list_capacity),
                ..SurfaceSettings::list()
            },
            map: SurfaceSettings {
                interval_secs: map_interval_secs,
                ..SurfaceSettings::map()
            },
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn list_surface(&self) -> SurfaceConfig {
        self.list.to_surface_config("list")
    }

    pub fn map_surface(&self) -> SurfaceConfig {
        self.map.to_surface_config("map")
    }
}
