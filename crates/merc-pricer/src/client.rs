//! HTTP client for the remote pricing service.
//!
//! Speaks the pricer's JSON REST API. Retries and backoff are the
//! service contract's concern; this client only applies a fixed request
//! timeout and maps transport/status failures into [`PricerError`].

use crate::error::{PricerError, PricerResult};
use crate::source::{BoxFuture, PriceSource};
use crate::types::{CheckAck, ItemPrice, PricerKind};
use chrono::DateTime;
use merc_core::{Currency, Sku};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw price entry from the API.
#[derive(Debug, Deserialize)]
struct RawItemPrice {
    sku: String,
    buy: Currency,
    sell: Currency,
    /// Unix seconds of the source's last refresh.
    time: i64,
}

impl RawItemPrice {
    fn into_domain(self) -> PricerResult<ItemPrice> {
        let sku: Sku = self
            .sku
            .parse()
            .map_err(|e| PricerError::Parse(format!("bad sku in response: {e}")))?;
        let time = DateTime::from_timestamp(self.time, 0)
            .ok_or_else(|| PricerError::Parse(format!("bad timestamp {} for {sku}", self.time)))?;
        Ok(ItemPrice {
            sku,
            buy: self.buy,
            sell: self.sell,
            time,
        })
    }
}

/// Raw full-catalog response.
#[derive(Debug, Deserialize)]
struct RawPricelist {
    items: Vec<RawItemPrice>,
}

/// Raw re-check acknowledgement.
#[derive(Debug, Deserialize)]
struct RawCheckAck {
    #[serde(default)]
    name: Option<String>,
}

/// HTTP client for the pricing service.
pub struct PricesTfClient {
    client: Client,
    base_url: String,
    kind: PricerKind,
}

impl PricesTfClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Root of the pricer API (e.g., "https://api.prices.tf")
    /// * `kind` - Which pricer identity this endpoint speaks for
    pub fn new(base_url: impl Into<String>, kind: PricerKind) -> PricerResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| PricerError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            kind,
        })
    }

    async fn fetch_price(&self, sku: &Sku) -> PricerResult<ItemPrice> {
        let url = format!("{}/prices/{}", self.base_url, sku);
        debug!(%sku, "Fetching price");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PricerError::Http(format!("HTTP request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PricerError::NotFound(sku.clone()));
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PricerError::Http(format!("HTTP {status}: {body}")));
        }

        let raw: RawItemPrice = response
            .json()
            .await
            .map_err(|e| PricerError::Parse(format!("Failed to parse price response: {e}")))?;

        raw.into_domain()
    }

    async fn fetch_pricelist(&self) -> PricerResult<Vec<ItemPrice>> {
        let url = format!("{}/prices", self.base_url);
        info!(url = %url, "Fetching full pricelist");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PricerError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PricerError::Http(format!("HTTP {status}: {body}")));
        }

        let raw: RawPricelist = response
            .json()
            .await
            .map_err(|e| PricerError::Parse(format!("Failed to parse pricelist: {e}")))?;

        // Skip individual malformed entries rather than rejecting the batch.
        let total = raw.items.len();
        let items: Vec<ItemPrice> = raw
            .items
            .into_iter()
            .filter_map(|item| match item.into_domain() {
                Ok(price) => Some(price),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed pricelist entry");
                    None
                }
            })
            .collect();

        info!(
            item_count = items.len(),
            skipped = total - items.len(),
            "Fetched pricelist"
        );

        Ok(items)
    }

    async fn post_check(&self, sku: &Sku) -> PricerResult<CheckAck> {
        let url = format!("{}/prices/{}/check", self.base_url, sku);
        debug!(%sku, "Requesting price check");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| PricerError::Http(format!("HTTP request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PricerError::NotFound(sku.clone()));
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PricerError::Http(format!("HTTP {status}: {body}")));
        }

        let raw: RawCheckAck = response
            .json()
            .await
            .map_err(|e| PricerError::Parse(format!("Failed to parse check response: {e}")))?;

        Ok(CheckAck { name: raw.name })
    }
}

impl PriceSource for PricesTfClient {
    fn get_price(&self, sku: &Sku) -> BoxFuture<'_, PricerResult<ItemPrice>> {
        let sku = sku.clone();
        Box::pin(async move { self.fetch_price(&sku).await })
    }

    fn get_pricelist(&self) -> BoxFuture<'_, PricerResult<Vec<ItemPrice>>> {
        Box::pin(self.fetch_pricelist())
    }

    fn request_check(&self, sku: &Sku) -> BoxFuture<'_, PricerResult<CheckAck>> {
        let sku = sku.clone();
        Box::pin(async move { self.post_check(&sku).await })
    }

    fn kind(&self) -> PricerKind {
        self.kind
    }
}
