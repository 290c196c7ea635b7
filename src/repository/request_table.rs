//! The Requests sheet, filled by the sign-up form.

use std::sync::Arc;

use crate::backend::SheetStore;
use crate::model::PROCESSED_VALUE;
use crate::model::REQUEST_PROCESSED_COLUMN;
use crate::model::RequestRecord;
use crate::model::RowIndex;
use crate::repository::error::RepositoryError;

pub struct RequestTable {
    sheets: Arc<dyn SheetStore>,
    sheet_name: String,
}

impl RequestTable {
    pub fn new(sheets: Arc<dyn SheetStore>, sheet_name: &str) -> Self {
        Self {
            sheets,
            sheet_name: sheet_name.to_string(),
        }
    }

    /// Every request row in sheet order, header skipped.
    pub async fn select_all(&self) -> Result<Vec<RequestRecord>, RepositoryError> {
        let rows = self.sheets.read_all_rows(&self.sheet_name).await?;
        Ok(rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, row)| RequestRecord::from_row(RowIndex(i as u32), row))
            .collect())
    }

    /// Sets the processed flag of the row at `index` to "Yes".
    pub async fn mark_processed(&self, index: RowIndex) -> Result<(), RepositoryError> {
        self.sheets
            .write_cell(
                &self.sheet_name,
                index.row_number(),
                REQUEST_PROCESSED_COLUMN,
                PROCESSED_VALUE.into(),
            )
            .await?;
        Ok(())
    }
}
