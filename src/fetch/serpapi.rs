// src/fetch/serpapi.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::ListingSource;
use crate::config::Config;
use crate::listing::RawListing;

const ENGINE: &str = "google_local";
const RESULTS_KEY: &str = "local_results";

/// SerpApi `google_local` search client.
pub struct SerpApiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    result_count: u32,
}

impl SerpApiClient {
    pub fn new(client: Client, config: &Config) -> Result<Self> {
        let endpoint = Url::parse(&config.search_endpoint)
            .with_context(|| format!("parsing search endpoint {}", config.search_endpoint))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.serpapi_key.clone(),
            result_count: config.result_count,
        })
    }

    /// Full request URL for `query`.
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("engine", ENGINE)
            .append_pair("q", query)
            .append_pair("api_key", &self.api_key)
            .append_pair("num", &self.result_count.to_string());
        url
    }
}

#[async_trait]
impl ListingSource for SerpApiClient {
    async fn fetch_listings(&self, query: &str) -> Result<Vec<RawListing>> {
        info!(%query, "asking search API");
        let url = self.request_url(query);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET search API")?;
        let status = resp.status();
        // error statuses still carry a JSON body with an `error` field
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("decoding search API response ({}) as JSON", status))?;
        if !status.is_success() {
            debug!(%status, "search API returned an error status");
        }

        Ok(extract_local_results(&body))
    }
}

/// Pull listings out of a response body. Any shape mismatch yields an empty list.
pub fn extract_local_results(body: &Value) -> Vec<RawListing> {
    if let Some(err) = body.get("error").and_then(Value::as_str) {
        warn!(error = %err, "search API reported an error");
    }

    let Some(items) = body.get(RESULTS_KEY).and_then(Value::as_array) else {
        debug!("no `{}` array in response", RESULTS_KEY);
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            if !item.is_object() {
                debug!(?item, "skipping non-object result");
                return None;
            }
            serde_json::from_value::<RawListing>(item.clone()).ok()
        })
        .collect()
}
