//! Typed views over the rows of the Requests and Database sheets.

use std::fmt;

use derive_builder::Builder;
use serde::Serialize;

/// One row as returned by the sheet backend. Trailing empty cells may be missing.
pub type Row = Vec<String>;

pub const DEFAULT_LAST_SUCCESS_DATE: &str = "2020-01-01";
pub const DEFAULT_FAILURE_COUNT: i64 = 0;

pub const USER_EMAIL_COLUMN: u32 = 1;
pub const USER_RESOURCE_COLUMN: u32 = 2;
pub const USER_SUBSCRIBED_COLUMN: u32 = 3;
pub const USER_LAST_SUCCESS_COLUMN: u32 = 4;
pub const USER_FAILURE_COUNT_COLUMN: u32 = 5;

pub const REQUEST_TIMESTAMP_COLUMN: u32 = 1;
pub const REQUEST_EMAIL_COLUMN: u32 = 2;
pub const REQUEST_ACTION_COLUMN: u32 = 3;
pub const REQUEST_PROCESSED_COLUMN: u32 = 4;

pub const PROCESSED_VALUE: &str = "Yes";

/// Zero-based index of a row within a sheet, header included.
///
/// Index 0 is the header row, so data rows start at 1. The sheet itself
/// addresses rows from 1, see [`RowIndex::row_number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowIndex(pub u32);

impl RowIndex {
    /// One-based row number used for cell addressing.
    pub fn row_number(self) -> u32 {
        self.0 + 1
    }

    pub fn from_row_number(row_number: u32) -> Self {
        Self(row_number.saturating_sub(1))
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value written into a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<Subscribed> for CellValue {
    fn from(value: Subscribed) -> Self {
        CellValue::Text(value.as_str().to_string())
    }
}

/// Value of the "Subscribed?" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subscribed {
    #[default]
    Yes,
    No,
}

impl Subscribed {
    pub fn as_str(self) -> &'static str {
        match self {
            Subscribed::Yes => "Yes",
            Subscribed::No => "No",
        }
    }

    /// Anything other than an exact "Yes" counts as unsubscribed.
    pub fn from_cell(cell: &str) -> Self {
        if cell == "Yes" {
            Subscribed::Yes
        } else {
            Subscribed::No
        }
    }
}

impl fmt::Display for Subscribed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action submitted through the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAction {
    SignUp,
    Unsubscribe,
    Unrecognized(String),
}

impl RequestAction {
    pub const SIGN_UP: &'static str = "Sign Up";
    pub const UNSUBSCRIBE: &'static str = "Unsubscribe";

    pub fn from_cell(cell: &str) -> Self {
        match cell {
            Self::SIGN_UP => RequestAction::SignUp,
            Self::UNSUBSCRIBE => RequestAction::Unsubscribe,
            other => RequestAction::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestAction::SignUp => f.write_str(Self::SIGN_UP),
            RequestAction::Unsubscribe => f.write_str(Self::UNSUBSCRIBE),
            RequestAction::Unrecognized(other) => write!(f, "{other:?}"),
        }
    }
}

/// A registered account, one per row of the Database sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub email: String,
    /// Id of the user's personal spreadsheet. Never changes after creation.
    pub resource_id: String,
    pub subscribed: Subscribed,
    /// Maintained by the daily notifier, not by request processing.
    pub last_success_date: String,
    /// Maintained by the daily notifier, not by request processing. `None`
    /// when the cell holds something other than an integer.
    pub failure_count: Option<i64>,
}

impl UserRecord {
    /// Record for a freshly provisioned user.
    pub fn new(email: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            resource_id: resource_id.into(),
            subscribed: Subscribed::Yes,
            last_success_date: DEFAULT_LAST_SUCCESS_DATE.to_string(),
            failure_count: Some(DEFAULT_FAILURE_COUNT),
        }
    }

    /// Parses a Database row. Columns request processing never reads are
    /// taken as they are, so a stray value there does not block the user.
    pub fn from_row(row: &[String]) -> Self {
        let failure_count = match cell(row, USER_FAILURE_COUNT_COLUMN).trim() {
            "" => Some(DEFAULT_FAILURE_COUNT),
            raw => raw.parse::<i64>().ok(),
        };

        Self {
            email: cell(row, USER_EMAIL_COLUMN).to_string(),
            resource_id: cell(row, USER_RESOURCE_COLUMN).to_string(),
            subscribed: Subscribed::from_cell(cell(row, USER_SUBSCRIBED_COLUMN)),
            last_success_date: cell(row, USER_LAST_SUCCESS_COLUMN).to_string(),
            failure_count,
        }
    }

    pub fn to_row(&self) -> Vec<CellValue> {
        vec![
            self.email.as_str().into(),
            self.resource_id.as_str().into(),
            self.subscribed.into(),
            self.last_success_date.as_str().into(),
            self.failure_count.unwrap_or(DEFAULT_FAILURE_COUNT).into(),
        ]
    }
}

/// A located user: where the record lives and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub index: RowIndex,
    pub record: UserRecord,
}

/// One submission, one per row of the Requests sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub index: RowIndex,
    pub timestamp: String,
    pub email: String,
    pub action: RequestAction,
    pub processed: bool,
}

impl RequestRecord {
    pub fn from_row(index: RowIndex, row: &[String]) -> Self {
        Self {
            index,
            timestamp: cell(row, REQUEST_TIMESTAMP_COLUMN).to_string(),
            email: cell(row, REQUEST_EMAIL_COLUMN).to_string(),
            action: RequestAction::from_cell(cell(row, REQUEST_ACTION_COLUMN)),
            processed: !cell(row, REQUEST_PROCESSED_COLUMN).is_empty(),
        }
    }

    /// A real submission that no earlier run has handled.
    pub fn is_pending(&self) -> bool {
        !self.timestamp.is_empty() && !self.processed
    }
}

/// An outbound notification.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn resource_name(email: &str) -> String {
    format!("{email} Stocks")
}

/// Cell at a one-based column, empty when the row is shorter.
fn cell(row: &[String], column: u32) -> &str {
    row.get(column as usize - 1).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_row_index_addressing() {
        assert_eq!(RowIndex(0).row_number(), 1);
        assert_eq!(RowIndex(4).row_number(), 5);
        assert_eq!(RowIndex::from_row_number(5), RowIndex(4));
    }

    #[test]
    fn test_request_from_row() {
        let req = RequestRecord::from_row(
            RowIndex(1),
            &row(&["2024-01-01T00:00Z", "a@x.com", "Sign Up", ""]),
        );
        assert_eq!(req.email, "a@x.com");
        assert_eq!(req.action, RequestAction::SignUp);
        assert!(req.is_pending());

        let done = RequestRecord::from_row(
            RowIndex(2),
            &row(&["2024-01-01T00:00Z", "a@x.com", "Unsubscribe", "Yes"]),
        );
        assert_eq!(done.action, RequestAction::Unsubscribe);
        assert!(!done.is_pending());
    }

    #[test]
    fn test_request_short_and_empty_rows() {
        // Sheets drops trailing empty cells.
        let short = RequestRecord::from_row(RowIndex(3), &row(&["ts", "b@x.com", "Sign Up"]));
        assert!(short.is_pending());

        let empty = RequestRecord::from_row(RowIndex(4), &row(&[]));
        assert!(!empty.is_pending());

        let blank_timestamp = RequestRecord::from_row(RowIndex(5), &row(&["", "c@x.com", "Sign Up", ""]));
        assert!(!blank_timestamp.is_pending());
    }

    #[test]
    fn test_unrecognized_action_is_kept() {
        assert_eq!(
            RequestAction::from_cell("sign up"),
            RequestAction::Unrecognized("sign up".to_string())
        );
    }

    #[test]
    fn test_user_record_row() {
        let record = UserRecord::new("a@x.com", "file-1");
        assert_eq!(
            record.to_row(),
            vec![
                CellValue::Text("a@x.com".to_string()),
                CellValue::Text("file-1".to_string()),
                CellValue::Text("Yes".to_string()),
                CellValue::Text("2020-01-01".to_string()),
                CellValue::Integer(0),
            ]
        );

        let parsed = UserRecord::from_row(&row(&["a@x.com", "file-1", "No", "2024-03-01", "2"]));
        assert_eq!(parsed.subscribed, Subscribed::No);
        assert_eq!(parsed.failure_count, Some(2));
        assert_eq!(resource_name(&parsed.email), "a@x.com Stocks");
    }

    #[test]
    fn test_user_record_tolerates_bad_count() {
        let parsed = UserRecord::from_row(&row(&["a@x.com", "file-1", "Yes", "2020-01-01", "1.0"]));
        assert_eq!(parsed.resource_id, "file-1");
        assert_eq!(parsed.subscribed, Subscribed::Yes);
        assert_eq!(parsed.failure_count, None);

        let short = UserRecord::from_row(&row(&["a@x.com", "file-1", "Yes"]));
        assert_eq!(short.failure_count, Some(0));
        assert_eq!(short.last_success_date, "");
    }

    #[test]
    fn test_cell_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![CellValue::from("Yes"), CellValue::from(0_i64)])
            .expect("Failed to serialize");
        assert_eq!(json, r#"["Yes",0]"#);
    }

    #[test]
    fn test_email_builder() {
        let message = EmailMessageBuilder::default()
            .to("a@x.com")
            .subject("Message from Finz")
            .body("hi")
            .build()
            .expect("Failed to build message");
        assert_eq!(message.to, "a@x.com");
    }
}
