use thiserror::Error;

/// Failures talking to the spreadsheet.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not authenticate or open the spreadsheet.
    #[error("could not connect to sheet: {0}")]
    Connection(String),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}
