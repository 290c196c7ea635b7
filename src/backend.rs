//! Contracts for the hosted services this crate drives.
//!
//! Every external effect goes through one of these traits so the request
//! processor can run against Google in production and in-memory fakes in tests.

use async_trait::async_trait;

use crate::backend::error::BackendError;
use crate::model::CellValue;
use crate::model::EmailMessage;
use crate::model::Row;

pub mod error;

/// Row/cell access to the sheets of a single spreadsheet.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Reads every row of `sheet`, header included.
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>, BackendError>;

    /// Writes one cell. `row` and `column` are one-based.
    async fn write_cell(
        &self,
        sheet: &str,
        row: u32,
        column: u32,
        value: CellValue,
    ) -> Result<(), BackendError>;

    /// Appends `values` after the last non-empty row and returns its one-based row number.
    async fn append_row(&self, sheet: &str, values: Vec<CellValue>) -> Result<u32, BackendError>;
}

/// File copying and sharing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Copies `template_id` into a new file called `name` and returns the new id.
    async fn copy_template(&self, template_id: &str, name: &str) -> Result<String, BackendError>;

    /// Stops editors from resharing `file_id` and grants edit access to each of `editors`.
    async fn set_permissions(&self, file_id: &str, editors: &[String]) -> Result<(), BackendError>;

    /// Link a user can open the file with.
    async fn file_url(&self, file_id: &str) -> Result<String, BackendError>;
}

/// Outbound email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), BackendError>;
}
