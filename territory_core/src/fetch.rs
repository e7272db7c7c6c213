use std::future::Future;

use reqwest::{Client, Url};
use territory_proto::RawTileMap;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use reqwest::StatusCode;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request failed with status code {}", .0.as_u16())]
    Status(StatusCode),
    #[error("unexpected response body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Source of the raw tile map. One call is one attempt; nothing is retried.
pub trait TileFetcher: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<RawTileMap, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: Client,
    endpoint: Url,
}

impl HttpTileFetcher {
    pub fn new(endpoint: &str) -> Result<Self, FetchError> {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: &str) -> Result<Self, FetchError> {
        let endpoint = Url::parse(endpoint).map_err(|err| FetchError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn fetch_once(&self) -> Result<RawTileMap, FetchError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        debug!(target: "territory::fetch", bytes = body.len(), "tiles.fetch.body");
        let raw: RawTileMap = serde_json::from_str(&body)?;
        Ok(raw)
    }
}

impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self) -> Result<RawTileMap, FetchError> {
        info!(target: "territory::fetch", endpoint = %self.endpoint, "tiles.fetch.started");
        match self.fetch_once().await {
            Ok(raw) => {
                info!(
                    target: "territory::fetch",
                    tiles = raw.len(),
                    "tiles.fetch.completed"
                );
                Ok(raw)
            }
            Err(err) => {
                warn!(target: "territory::fetch", error = %err, "tiles.fetch.failed");
                Err(err)
            }
        }
    }
}
