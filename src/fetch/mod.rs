//! Backend fetches for chart and heat-map data.
//!
//! Every request has a timeout, honours a cancellation token and reports
//! failure through its `Result`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::Config;
use crate::error::{DashError, Result};
use crate::heatmap::{extract, HeatMapDataset, RawHeatMapPayload};
use crate::logging::{log, obj, v_num, v_str, Domain, Level, ProfileScope};

pub mod retry;

use retry::{retry_async, RetryConfig};

/// One flot series: `{ "label": ..., "data": [[x, y], ...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    #[serde(default)]
    pub data: Vec<[f64; 2]>,
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Body of a successful GET of `url` (a path relative to the backend).
    async fn get_text(&self, url: &str, cancel: &CancellationToken) -> Result<String>;

    async fn fetch_series(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<Series>> {
        let body = self.get_text(url, cancel).await?;
        serde_json::from_str(&body).map_err(|e| DashError::MalformedPayload(e.to_string()))
    }

    async fn fetch_heat_map(&self, url: &str, cancel: &CancellationToken) -> Result<HeatMapDataset> {
        let body = self.get_text(url, cancel).await?;
        let payload: RawHeatMapPayload =
            serde_json::from_str(&body).map_err(|e| DashError::MalformedPayload(e.to_string()))?;
        extract(&payload)
    }
}

pub struct DashboardClient {
    client: Client,
    base: Url,
    timeout: Duration,
    retry: RetryConfig,
}

impl DashboardClient {
    /// `base` may carry a path prefix; request paths resolve beneath it.
    pub fn new(mut base: Url, timeout: Duration) -> Result<Self> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(DashError::Client)?;
        Ok(Self {
            client,
            base,
            timeout,
            retry: RetryConfig::default(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base = Url::parse(&cfg.base_url).map_err(|e| DashError::InvalidUrl {
            url: cfg.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(base, cfg.fetch_timeout)?.with_retry(RetryConfig {
            max_retries: cfg.fetch_retries,
            ..Default::default()
        }))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base.join(url.trim_start_matches('/')).map_err(|e| DashError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn attempt(&self, url: &Url, cancel: &CancellationToken) -> Result<String> {
        let request = async {
            let resp = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| DashError::Fetch {
                    url: url.to_string(),
                    source,
                })?;
            let status = resp.status();
            if !status.is_success() {
                return Err(DashError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            resp.text().await.map_err(|source| DashError::Fetch {
                url: url.to_string(),
                source,
            })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DashError::Cancelled { url: url.to_string() }),
            result = tokio::time::timeout(self.timeout, request) => match result {
                Ok(body) => body,
                Err(_) => Err(DashError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            },
        }
    }
}

#[async_trait]
impl DataSource for DashboardClient {
    async fn get_text(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        let resolved = self.resolve(url)?;
        let _profile = ProfileScope::with_context("fetch", "get", &[("url", v_str(resolved.as_str()))]);
        let body = retry_async(&self.retry, resolved.as_str(), cancel, || {
            self.attempt(&resolved, cancel)
        })
        .await?;
        log(
            Level::Debug,
            Domain::Fetch,
            "complete",
            obj(&[
                ("url", v_str(resolved.as_str())),
                ("bytes", v_num(body.len() as f64)),
            ]),
        );
        Ok(body)
    }
}
