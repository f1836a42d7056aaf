use async_trait::async_trait;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::model::{DetectionSignal, DetectionsEnvelope, RawEvent};
use crate::prelude::{DetectionSource, SyncError, SyncResult};

/// `DetectionSource` backed by the detection service's HTTP/JSON API.
pub struct HttpDetectionSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDetectionSource {
    pub fn new(base_url: &str, timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("building HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a detection's image, for view adapters.
    pub fn image_url(&self, image_id: &str) -> String {
        format!("{}/detection_image/{}", self.base_url, image_id)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("GET {}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Network(format!(
                "GET {}: HTTP {}",
                path,
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("GET {}: {}", path, e)))?;
        serde_json::from_slice(&body)
            .map_err(|e| SyncError::MalformedResponse(format!("GET {}: {}", path, e)))
    }
}

fn decode_records(records: Vec<Value>) -> Vec<RawEvent> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawEvent>(record) {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!("dropping undecodable detection record: {}", err);
                None
            }
        })
        .collect()
}

#[async_trait]
impl DetectionSource for HttpDetectionSource {
    async fn all_detections(&self) -> SyncResult<Vec<RawEvent>> {
        let envelope: DetectionsEnvelope = self.get_json("/all_detections").await?;
        Ok(decode_records(envelope.detections))
    }

    async fn latest_detection(&self) -> SyncResult<Option<RawEvent>> {
        let envelope: DetectionsEnvelope = self.get_json("/all_detections?single=true").await?;
        Ok(decode_records(envelope.detections).into_iter().next())
    }

    async fn detection_signal(&self) -> SyncResult<DetectionSignal> {
        self.get_json("/detection_data").await
    }
}
