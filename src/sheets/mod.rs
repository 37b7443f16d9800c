// src/sheets/mod.rs

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::listing::ListingRecord;

pub mod auth;
pub mod client;
pub mod rows;

pub use auth::ServiceAccount;
pub use client::{SheetsClient, SheetsConnector};

/// An opened worksheet holding listing rows under a fixed header.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Whether A1 holds anything. A non-empty sheet is assumed to carry the header.
    async fn has_header(&self) -> StoreResult<bool>;

    /// Append the header row.
    async fn write_header(&self) -> StoreResult<()>;

    /// Write the header as row 1 if the sheet is empty. No-op otherwise.
    async fn ensure_header(&self) -> StoreResult<()> {
        if !self.has_header().await? {
            self.write_header().await?;
        }
        Ok(())
    }

    /// Every data row after the header, in sheet order.
    async fn read_all(&self) -> StoreResult<Vec<ListingRecord>>;

    /// Append `records` as new rows in one write. Empty input makes no call.
    async fn append(&self, records: &[ListingRecord]) -> StoreResult<()>;
}

/// Opens a `TableStore`. Authentication or network failures are `StoreError::Connection`.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Store: TableStore;

    async fn open_store(&self) -> StoreResult<Self::Store>;
}
