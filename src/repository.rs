//! Typed access to the Requests and Database sheets.

use std::sync::Arc;

use crate::backend::FileStore;
use crate::backend::SheetStore;
use crate::config::Config;
use crate::repository::request_table::RequestTable;
use crate::repository::user_database::UserDatabase;

pub mod error;
pub mod request_table;
pub mod user_database;

/// Both tables of the requests spreadsheet.
pub struct Repository {
    pub users: UserDatabase,
    pub requests: RequestTable,
}

impl Repository {
    pub fn new(sheets: Arc<dyn SheetStore>, files: Arc<dyn FileStore>, config: &Config) -> Self {
        Self {
            users: UserDatabase::new(
                sheets.clone(),
                files,
                &config.database_sheet_name,
                &config.template_spreadsheet_id,
                &config.service_account_email,
            ),
            requests: RequestTable::new(sheets, &config.requests_sheet_name),
        }
    }
}
