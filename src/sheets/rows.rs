// src/sheets/rows.rs

use serde_json::Value;

use crate::listing::{value_to_f64, value_to_text, value_to_u64, ListingRecord, HEADER};

/// Column positions of each known header, looked up by name.
#[derive(Debug, Default, PartialEq)]
struct ColumnMap {
    name: Option<usize>,
    category: Option<usize>,
    address: Option<usize>,
    rating: Option<usize>,
    reviews_count: Option<usize>,
    phone: Option<usize>,
    website: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[Value]) -> Self {
        let find = |wanted: &str| {
            header
                .iter()
                .position(|cell| cell.as_str().map(str::trim) == Some(wanted))
        };
        Self {
            name: find(HEADER[0]),
            category: find(HEADER[1]),
            address: find(HEADER[2]),
            rating: find(HEADER[3]),
            reviews_count: find(HEADER[4]),
            phone: find(HEADER[5]),
            website: find(HEADER[6]),
        }
    }
}

/// The header row as cell values.
pub fn header_row() -> Vec<Value> {
    HEADER.iter().map(|h| Value::String(h.to_string())).collect()
}

/// Whether A1 holds nothing (absent or an empty string).
pub fn first_cell_unset(values: &[Vec<Value>]) -> bool {
    match values.first().and_then(|row| row.first()) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Turn a sheet's values (header row first) into records, in sheet order.
///
/// Columns are matched by header name so they may be reordered. Short rows and
/// empty cells read as absent fields. Rows with no content at all are skipped.
pub fn records_from_values(values: &[Vec<Value>]) -> Vec<ListingRecord> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let cols = ColumnMap::from_header(header);

    rows.iter()
        .filter(|row| row.iter().any(|cell| value_to_text(cell).is_some()))
        .map(|row| {
            let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
            ListingRecord {
                name: cell(cols.name).and_then(value_to_text),
                category: cell(cols.category).and_then(value_to_text),
                address: cell(cols.address).and_then(value_to_text),
                rating: cell(cols.rating).and_then(value_to_f64),
                reviews_count: cell(cols.reviews_count).and_then(value_to_u64),
                phone: cell(cols.phone).and_then(value_to_text),
                website: cell(cols.website).and_then(value_to_text),
            }
        })
        .collect()
}
