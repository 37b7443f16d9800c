// src/fetch/mod.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::listing::RawListing;

pub mod serpapi;

pub use serpapi::SerpApiClient;

/// Something that can answer a search query with raw listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Run one search. An empty vec means nothing was found; `Err` is a transport failure.
    async fn fetch_listings(&self, query: &str) -> Result<Vec<RawListing>>;
}
