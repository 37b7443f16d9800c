// src/sync.rs

use std::collections::HashSet;

use crate::listing::{ListingKey, ListingRecord};

/// Return the `incoming` records that are not already in `existing`, in incoming order.
///
/// A record is already present when its `(name, address)` key matches a row in
/// `existing` or a record emitted earlier in the same batch; the first occurrence wins.
pub fn new_records(existing: &[ListingRecord], incoming: &[ListingRecord]) -> Vec<ListingRecord> {
    let mut seen: HashSet<ListingKey> = existing.iter().map(ListingRecord::key).collect();

    incoming
        .iter()
        .filter(|rec| seen.insert(rec.key()))
        .cloned()
        .collect()
}
