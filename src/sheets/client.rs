// src/sheets/client.rs

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::auth::ServiceAccount;
use super::rows::{first_cell_unset, header_row, records_from_values};
use super::{StoreConnector, TableStore};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::listing::ListingRecord;

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// `ValueRange` body, used both for reads and appends.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<Vec<Value>>,
}

/// Opens the first worksheet of a spreadsheet with a service account.
pub struct SheetsConnector {
    http: Client,
    account: ServiceAccount,
    endpoint: String,
    sheet_id: String,
}

impl SheetsConnector {
    pub fn new(http: Client, account: ServiceAccount, config: &Config) -> Self {
        Self {
            http,
            account,
            endpoint: config.sheets_endpoint.clone(),
            sheet_id: config.sheet_id.clone(),
        }
    }
}

#[async_trait]
impl StoreConnector for SheetsConnector {
    type Store = SheetsClient;

    async fn open_store(&self) -> StoreResult<SheetsClient> {
        info!("connecting to Google Sheets");
        let token = self.account.access_token(&self.http).await?;

        let mut client = SheetsClient {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            sheet_id: self.sheet_id.clone(),
            token,
            sheet_title: String::new(),
        };

        let mut url = client.spreadsheet_url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let resp = client
            .http
            .get(url)
            .bearer_auth(&client.token)
            .send()
            .await
            .map_err(|e| StoreError::Connection(format!("opening spreadsheet: {}", e)))?;
        let meta: SpreadsheetMeta = check(resp)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .json()
            .await
            .map_err(|e| StoreError::Connection(format!("decoding spreadsheet metadata: {}", e)))?;

        client.sheet_title = meta
            .sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| StoreError::Connection("spreadsheet has no worksheets".into()))?;

        info!(sheet = %client.sheet_title, "connected to Google Sheets");
        Ok(client)
    }
}

/// An authenticated handle on one worksheet.
#[derive(Debug)]
pub struct SheetsClient {
    http: Client,
    endpoint: String,
    sheet_id: String,
    token: String,
    sheet_title: String,
}

impl SheetsClient {
    /// `{endpoint}/spreadsheets/{id}/{segments...}` with each segment percent-encoded.
    fn spreadsheet_url(&self, segments: &[&str]) -> StoreResult<Url> {
        let bad_endpoint =
            || StoreError::Connection(format!("bad Sheets endpoint {}", self.endpoint));
        let mut url = Url::parse(&self.endpoint).map_err(|_| bad_endpoint())?;
        url.path_segments_mut()
            .map_err(|_| bad_endpoint())?
            .pop_if_empty()
            .push("spreadsheets")
            .push(&self.sheet_id)
            .extend(segments);
        Ok(url)
    }

    /// A1 range for the whole worksheet, or a cell range inside it.
    fn range(&self, cells: Option<&str>) -> String {
        let quoted = format!("'{}'", self.sheet_title.replace('\'', "''"));
        match cells {
            Some(c) => format!("{}!{}", quoted, c),
            None => quoted,
        }
    }

    async fn get_values(&self, range: &str) -> StoreResult<Vec<Vec<Value>>> {
        let mut url = self.spreadsheet_url(&["values", range])?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE");
        debug!(%range, "reading values");

        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let body: ValueRange = check(resp)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("values for {}: {}", range, e)))?;
        Ok(body.values)
    }

    async fn append_values(&self, values: Vec<Vec<Value>>) -> StoreResult<()> {
        let append = format!("{}:append", self.range(Some("A1")));
        let mut url = self.spreadsheet_url(&["values", &append])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        debug!(rows = values.len(), "appending values");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&ValueRange { values })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl TableStore for SheetsClient {
    async fn has_header(&self) -> StoreResult<bool> {
        let a1 = self.get_values(&self.range(Some("A1"))).await?;
        Ok(!first_cell_unset(&a1))
    }

    async fn write_header(&self) -> StoreResult<()> {
        self.append_values(vec![header_row()]).await?;
        info!("added headers to the empty sheet");
        Ok(())
    }

    async fn read_all(&self) -> StoreResult<Vec<ListingRecord>> {
        let values = self.get_values(&self.range(None)).await?;
        Ok(records_from_values(&values))
    }

    async fn append(&self, records: &[ListingRecord]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = records.iter().map(ListingRecord::to_row).collect();
        self.append_values(rows).await
    }
}

/// Turn a non-2xx response into `StoreError::Api` carrying the body.
async fn check(resp: Response) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}
