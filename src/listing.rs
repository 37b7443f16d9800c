// src/listing.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header row written to an empty sheet, in column order.
pub const HEADER: [&str; 7] = [
    "Name",
    "Category",
    "Address",
    "Rating",
    "Reviews Count",
    "Phone",
    "Website",
];

/// One entry of the search API's `local_results` array, exactly as received.
///
/// Fields stay untyped here; `normalize` is the only place that looks inside them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub reviews: Option<Value>,
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default)]
    pub website: Option<Value>,
}

/// A business listing as stored in the sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u64>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Dedup identity of a listing: `(name, address)`.
///
/// Two absent fields compare equal, so listings missing both collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl ListingRecord {
    pub fn key(&self) -> ListingKey {
        ListingKey {
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }

    /// True when neither half of the dedup key is present.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none() && self.address.is_none()
    }

    /// Cell values in `HEADER` order. Absent fields become empty cells.
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            text_cell(&self.name),
            text_cell(&self.category),
            text_cell(&self.address),
            self.rating
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(String::new())),
            self.reviews_count
                .map(|n| Value::Number(n.into()))
                .unwrap_or_else(|| Value::String(String::new())),
            text_cell(&self.phone),
            text_cell(&self.website),
        ]
    }
}

fn text_cell(field: &Option<String>) -> Value {
    Value::String(field.clone().unwrap_or_default())
}

/// Map raw API listings onto records, one for one. Nothing is filtered.
pub fn normalize(raw: &[RawListing]) -> Vec<ListingRecord> {
    raw.iter()
        .map(|item| ListingRecord {
            name: item.title.as_ref().and_then(value_to_text),
            category: item.kind.as_ref().and_then(value_to_text),
            address: item.address.as_ref().and_then(value_to_text),
            rating: item.rating.as_ref().and_then(value_to_f64),
            reviews_count: item.reviews.as_ref().and_then(value_to_u64),
            phone: item.phone.as_ref().and_then(value_to_text),
            website: item.website.as_ref().and_then(value_to_text),
        })
        .collect()
}

/// Strings pass through, numbers and booleans are rendered, anything else is absent.
/// Empty strings are treated as absent so that a blank sheet cell and a missing
/// API field produce the same key.
pub fn value_to_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub fn value_to_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => parse_number(s)
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64),
        _ => None,
    }
}

// "1,234" is how review counts come back from a formatted sheet.
fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}
