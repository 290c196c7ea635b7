//! Google Sheets v4 values API.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use serde_json::json;

use crate::backend::SheetStore;
use crate::backend::error::BackendError;
use crate::google::GoogleClient;
use crate::model::CellValue;
use crate::model::Row;

/// Sheet access for a single spreadsheet.
pub struct SheetsClient {
    base: Arc<GoogleClient>,
    pub api_url: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(base: Arc<GoogleClient>, api_url: &str, spreadsheet_id: &str) -> Self {
        Self {
            base,
            api_url: api_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>, BackendError> {
        let range = quote_sheet(sheet);
        let request = self.base.http().get(self.values_url(&range));
        let resp = self.base.send_json(request, None).await?;

        // An empty sheet has no "values" key at all.
        let rows = match resp.get("values").and_then(|v| v.as_array()) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        let rows: Vec<Row> = rows
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|cells| cells.iter().map(cell_to_string).collect())
                    .unwrap_or_default()
            })
            .collect();
        debug!("Read {} rows from sheet {sheet}", rows.len());
        Ok(rows)
    }

    async fn write_cell(
        &self,
        sheet: &str,
        row: u32,
        column: u32,
        value: CellValue,
    ) -> Result<(), BackendError> {
        let range = format!("{}!{}", quote_sheet(sheet), a1_cell(row, column));
        let request = self
            .base
            .http()
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "USER_ENTERED")]);
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value]],
        });
        self.base.send_json(request, Some(&body)).await?;
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Vec<CellValue>) -> Result<u32, BackendError> {
        let url = format!("{}:append", self.values_url(&quote_sheet(sheet)));
        let request = self.base.http().post(url).query(&[
            ("valueInputOption", "USER_ENTERED"),
            ("insertDataOption", "INSERT_ROWS"),
        ]);
        let body = json!({
            "majorDimension": "ROWS",
            "values": [values],
        });
        let resp = self.base.send_json(request, Some(&body)).await?;

        let updated_range = resp
            .get("updates")
            .and_then(|u| u.get("updatedRange"))
            .and_then(|r| r.as_str())
            .ok_or_else(|| BackendError::MissingField {
                field: "updates.updatedRange".to_string(),
            })?;
        parse_updated_row(updated_range).ok_or_else(|| BackendError::UnexpectedResult {
            message: format!("cannot find a row number in range `{updated_range}`"),
        })
    }
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Quotes a sheet name for A1 notation when it holds anything but letters, digits or `_`.
fn quote_sheet(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// A1 address of a one-based (row, column) cell, e.g. (3, 28) -> "AB3".
fn a1_cell(row: u32, column: u32) -> String {
    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &row.to_string()
}

/// First row number of an updated range such as `Database!A5:E5`.
fn parse_updated_row(range: &str) -> Option<u32> {
    let cells = range.rsplit('!').next()?;
    let start = cells.split(':').next()?;
    start
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$')
        .parse()
        .ok()
}
