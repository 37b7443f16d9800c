// src/query.rs

/// Build the search string sent to the listings API, e.g. `"dentist in Austin, TX"`.
/// Inputs are used verbatim, empty strings included.
pub fn build_query(business_type: &str, location: &str) -> String {
    format!("{} in {}", business_type, location)
}
