use crate::errors::{JournalError, JournalResult};
use crate::normalize::RawRow;
use crate::trade::{TradeRecord, RAW_HEADER};
use reqwest::Client;
use serde_json::{Map, Value};

/// Envelope returned by every spreadsheet endpoint.
#[derive(Debug, Default, serde::Deserialize)]
struct SheetsResponse {
    #[serde(default)]
    data: Option<Vec<RawRow>>,
    #[serde(default)]
    error: Option<String>,
}

/// Spreadsheet-backed trade API client. All methods return Result, never panic.
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: String,
}

impl SheetsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// All rows, header first. A server-side `error` payload is logged and
    /// read as an empty sheet.
    pub async fn get_data(&self) -> JournalResult<Vec<RawRow>> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("action", "getData")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(JournalError::StoreApi {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = resp
            .json::<SheetsResponse>()
            .await
            .map_err(|e| JournalError::Parse(format!("getData: {e}")))?;

        if let Some(err) = parsed.error {
            tracing::warn!(error = %err, "sheet returned an error for getData, treating as empty");
            return Ok(Vec::new());
        }
        Ok(parsed.data.unwrap_or_default())
    }

    pub async fn add(&self, record: &TradeRecord) -> JournalResult<()> {
        self.post_action("addData", record_fields(record)).await
    }

    pub async fn update(&self, record: &TradeRecord) -> JournalResult<()> {
        self.post_action("updateData", record_fields(record)).await
    }

    pub async fn delete(&self, id: &str) -> JournalResult<()> {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String(id.to_string()));
        self.post_action("deleteData", fields).await
    }

    async fn post_action(&self, action: &str, mut fields: Map<String, Value>) -> JournalResult<()> {
        fields.insert("action".into(), Value::String(action.to_string()));

        let resp = self
            .client
            .post(&self.base_url)
            .json(&Value::Object(fields))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(JournalError::StoreApi {
                status: status.as_u16(),
                body,
            });
        }

        // An empty body counts as success; a body naming an error does not.
        let parsed: SheetsResponse = if body.trim().is_empty() {
            SheetsResponse::default()
        } else {
            serde_json::from_str(&body).map_err(|e| JournalError::Parse(format!("{action}: {e}")))?
        };
        match parsed.error {
            Some(err) => Err(JournalError::StoreApi {
                status: status.as_u16(),
                body: err,
            }),
            None => Ok(()),
        }
    }
}

/// Record as a JSON object keyed by the sheet's column names.
fn record_fields(record: &TradeRecord) -> Map<String, Value> {
    RAW_HEADER
        .iter()
        .map(|k| k.to_string())
        .zip(record.to_raw_row())
        .collect()
}
