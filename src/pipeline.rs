// src/pipeline.rs

use anyhow::{Context, Result};
use tracing::{error, info, instrument, warn};

use crate::error::StoreResult;
use crate::fetch::ListingSource;
use crate::listing::{normalize, ListingRecord};
use crate::sheets::{StoreConnector, TableStore};
use crate::sync::new_records;

/// How a run ended. Every variant is a normal, successful exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The search returned nothing; the sheet was not touched.
    NoListings,
    /// The sheet could not be opened or read; nothing was written.
    StoreUnavailable,
    /// Every fetched listing is already in the sheet.
    UpToDate,
    /// Dry run: this many rows would have been appended.
    DryRun(usize),
    /// This many rows were appended.
    Appended(usize),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

/// One sync pass: fetch, normalize, read the sheet, diff, append.
#[instrument(skip(source, connector, opts))]
pub async fn run<S, C>(
    source: &S,
    connector: &C,
    query: &str,
    opts: RunOptions,
) -> Result<RunOutcome>
where
    S: ListingSource + ?Sized,
    C: StoreConnector,
{
    info!("starting sync");

    let raw = source
        .fetch_listings(query)
        .await
        .with_context(|| format!("fetching listings for `{}`", query))?;
    if raw.is_empty() {
        warn!("the API didn't find any businesses; stopping");
        return Ok(RunOutcome::NoListings);
    }
    info!(count = raw.len(), "found businesses from the API");

    let incoming = normalize(&raw);
    let anonymous = incoming.iter().filter(|r| r.is_anonymous()).count();
    if anonymous > 0 {
        warn!(
            count = anonymous,
            "listings without name or address share one dedup key; only the first is kept"
        );
    }

    let (store, existing) = match open_and_read(connector, opts.dry_run).await {
        Ok(v) => v,
        Err(e) if e.is_connection() => {
            error!(error = %e, "could not connect to Google Sheets");
            return Ok(RunOutcome::StoreUnavailable);
        }
        Err(e) => {
            error!(error = %e, "could not read Google Sheets");
            return Ok(RunOutcome::StoreUnavailable);
        }
    };
    info!(count = existing.len(), "businesses already in the sheet");

    let fresh = new_records(&existing, &incoming);
    if fresh.is_empty() {
        info!("no new businesses to add; everything is up to date");
        return Ok(RunOutcome::UpToDate);
    }

    if opts.dry_run {
        for rec in &fresh {
            info!(name = ?rec.name, address = ?rec.address, "would add");
        }
        info!(count = fresh.len(), "dry run; sheet left unchanged");
        return Ok(RunOutcome::DryRun(fresh.len()));
    }

    info!(count = fresh.len(), "adding new unique businesses to the sheet");
    store
        .append(&fresh)
        .await
        .context("appending new rows to the sheet")?;
    info!("successfully added the new businesses");

    Ok(RunOutcome::Appended(fresh.len()))
}

async fn open_and_read<C: StoreConnector>(
    connector: &C,
    dry_run: bool,
) -> StoreResult<(C::Store, Vec<ListingRecord>)> {
    let store = connector.open_store().await?;
    if !dry_run {
        store.ensure_header().await?;
    } else if !store.has_header().await? {
        info!("dry run; would add headers to the empty sheet");
    }
    let existing = store.read_all().await?;
    Ok((store, existing))
}
