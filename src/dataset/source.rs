//! Dataset retrieval.

use async_trait::async_trait;

use crate::config::DatasetConfig;
use crate::dataset::record::Dataset;
use crate::error::DatasetError;

/// Something that can produce a fresh listing dataset.
///
/// Called once per search cycle; implementations make a single attempt and
/// never retry.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self) -> Result<Dataset, DatasetError>;
}

/// Fetches the dataset as one JSON document over HTTP.
pub struct HttpDatasetSource {
    url: String,
    records_pointer: String,
    client: reqwest::Client,
}

impl HttpDatasetSource {
    pub fn new(config: &DatasetConfig) -> Result<Self, DatasetError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.fetch_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| DatasetError::Transport {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            url: config.url.clone(),
            records_pointer: config.records_pointer.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self) -> Result<Dataset, DatasetError> {
        let transport = |e: reqwest::Error| DatasetError::Transport {
            url: self.url.clone(),
            reason: e.to_string(),
        };

        let resp = self.client.get(&self.url).send().await.map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DatasetError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(transport)?;
        let dataset = Dataset::from_slice(&body, &self.records_pointer)?;

        tracing::info!(
            url = %self.url,
            bytes = body.len(),
            records = dataset.len(),
            "Fetched listing dataset"
        );

        Ok(dataset)
    }
}
