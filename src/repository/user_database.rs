//! The Database sheet: one row per registered user.

use std::sync::Arc;

use log::debug;
use log::error;
use log::info;

use crate::backend::FileStore;
use crate::backend::SheetStore;
use crate::model::Row;
use crate::model::RowIndex;
use crate::model::Subscribed;
use crate::model::USER_EMAIL_COLUMN;
use crate::model::USER_SUBSCRIBED_COLUMN;
use crate::model::UserEntry;
use crate::model::UserRecord;
use crate::model::resource_name;
use crate::repository::error::RepositoryError;

pub struct UserDatabase {
    sheets: Arc<dyn SheetStore>,
    files: Arc<dyn FileStore>,
    sheet_name: String,
    template_id: String,
    /// Always an editor of each personal spreadsheet, next to its owner.
    service_principal: String,
}

impl UserDatabase {
    pub fn new(
        sheets: Arc<dyn SheetStore>,
        files: Arc<dyn FileStore>,
        sheet_name: &str,
        template_id: &str,
        service_principal: &str,
    ) -> Self {
        Self {
            sheets,
            files,
            sheet_name: sheet_name.to_string(),
            template_id: template_id.to_string(),
            service_principal: service_principal.to_string(),
        }
    }

    /// Index of the first row whose email equals `email` exactly.
    ///
    /// # Performance
    /// * Sheet reads: 1
    pub async fn find(&self, email: &str) -> Result<Option<RowIndex>, RepositoryError> {
        let rows = self.sheets.read_all_rows(&self.sheet_name).await?;
        Ok(position(&rows, email))
    }

    /// Like [`UserDatabase::find`], also parsing the matching record.
    ///
    /// # Performance
    /// * Sheet reads: 1
    pub async fn find_user(&self, email: &str) -> Result<Option<UserEntry>, RepositoryError> {
        let rows = self.sheets.read_all_rows(&self.sheet_name).await?;
        let Some(index) = position(&rows, email) else {
            return Ok(None);
        };

        let record = UserRecord::from_row(&rows[index.0 as usize]);
        Ok(Some(UserEntry { index, record }))
    }

    /// Provisions a personal spreadsheet for `email` and appends a subscribed record.
    ///
    /// The record is only appended once the spreadsheet is copied and shared,
    /// so a failure never leaves a half-written row. A failed append does
    /// leave the copied spreadsheet behind without a record pointing at it.
    ///
    /// # Performance
    /// * File calls: 2
    /// * Sheet writes: 1
    pub async fn create(&self, email: &str) -> Result<UserEntry, RepositoryError> {
        let name = resource_name(email);
        let resource_id = self.files.copy_template(&self.template_id, &name).await?;

        let editors = [email.to_string(), self.service_principal.clone()];
        if let Err(e) = self.files.set_permissions(&resource_id, &editors).await {
            error!("Sharing {resource_id} for {email} failed, spreadsheet is left orphaned: {e}");
            return Err(e.into());
        }

        let record = UserRecord::new(email, resource_id);
        let row_number = match self
            .sheets
            .append_row(&self.sheet_name, record.to_row())
            .await
        {
            Ok(row_number) => row_number,
            Err(e) => {
                error!(
                    "Appending user {email} failed, spreadsheet {} is left orphaned: {e}",
                    record.resource_id
                );
                return Err(e.into());
            }
        };

        let index = RowIndex::from_row_number(row_number);
        info!("Created user {email} at row {index} with spreadsheet {}", record.resource_id);
        Ok(UserEntry { index, record })
    }

    /// Writes the subscription column of the row at `index`; nothing else changes.
    pub async fn set_subscribed(
        &self,
        index: RowIndex,
        value: Subscribed,
    ) -> Result<(), RepositoryError> {
        debug!("Setting subscribed={value} on row {index}");
        self.sheets
            .write_cell(
                &self.sheet_name,
                index.row_number(),
                USER_SUBSCRIBED_COLUMN,
                value.into(),
            )
            .await?;
        Ok(())
    }

    /// Link to the user's personal spreadsheet.
    pub async fn resource_url(&self, record: &UserRecord) -> Result<String, RepositoryError> {
        Ok(self.files.file_url(&record.resource_id).await?)
    }
}

fn position(rows: &[Row], email: &str) -> Option<RowIndex> {
    let column = USER_EMAIL_COLUMN as usize - 1;
    rows.iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.get(column).is_some_and(|cell| cell == email))
        .map(|(i, _)| RowIndex(i as u32))
}
