//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com";
pub const DEFAULT_GMAIL_API_URL: &str = "https://gmail.googleapis.com";

/// How the Google clients authenticate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GoogleCredentials {
    /// Path to a service account JSON key.
    ServiceAccountKey(PathBuf),
    /// A pre-issued OAuth access token.
    AccessToken(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub requests_spreadsheet_id: String,
    pub requests_sheet_name: String,
    pub database_sheet_name: String,
    pub template_spreadsheet_id: String,
    /// Principal granted edit access to every provisioned spreadsheet next to the user.
    pub service_account_email: String,
    pub credentials: Option<GoogleCredentials>,
    /// Mailbox the service account impersonates when sending mail.
    pub gmail_delegated_user: Option<String>,
    pub email_subject: String,
    pub operator_email: Option<String>,
    /// `None` runs a single batch and exits.
    pub poll_interval: Option<Duration>,
    pub requests_per_second: u32,
    pub logs_path: PathBuf,
    pub sheets_api_url: String,
    pub drive_api_url: String,
    pub gmail_api_url: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            requests_spreadsheet_id: String::new(),
            requests_sheet_name: "Requests".to_string(),
            database_sheet_name: "Database".to_string(),
            template_spreadsheet_id: String::new(),
            service_account_email: String::new(),
            credentials: None,
            gmail_delegated_user: None,
            email_subject: "Message from Finz".to_string(),
            operator_email: None,
            poll_interval: None,
            requests_per_second: 5,
            logs_path: PathBuf::from("logs"),
            sheets_api_url: DEFAULT_SHEETS_API_URL.to_string(),
            drive_api_url: DEFAULT_DRIVE_API_URL.to_string(),
            gmail_api_url: DEFAULT_GMAIL_API_URL.to_string(),
        }
    }

    /// Populates the config from environment variables.
    pub fn load(&mut self) -> Result<(), AppError> {
        self.requests_spreadsheet_id = required("REQUESTS_SPREADSHEET_ID")?;
        self.template_spreadsheet_id = required("TEMPLATE_SPREADSHEET_ID")?;
        self.service_account_email = required("SERVICE_ACCOUNT_EMAIL")?;

        self.credentials = match (
            optional("GOOGLE_APPLICATION_CREDENTIALS"),
            optional("GOOGLE_ACCESS_TOKEN"),
        ) {
            (Some(path), _) => Some(GoogleCredentials::ServiceAccountKey(PathBuf::from(path))),
            (None, Some(token)) => Some(GoogleCredentials::AccessToken(token)),
            (None, None) => {
                return Err(AppError::MissingConfig {
                    key: "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
                });
            }
        };

        if let Some(v) = optional("REQUESTS_SHEET_NAME") {
            self.requests_sheet_name = v;
        }
        if let Some(v) = optional("DATABASE_SHEET_NAME") {
            self.database_sheet_name = v;
        }
        if let Some(v) = optional("EMAIL_SUBJECT") {
            self.email_subject = v;
        }
        self.gmail_delegated_user = optional("GMAIL_DELEGATED_USER");
        self.operator_email = optional("OPERATOR_EMAIL");

        self.poll_interval = match optional("POLL_INTERVAL") {
            Some(v) => Some(Duration::from_secs(parse_positive("POLL_INTERVAL", &v)?)),
            None => None,
        };
        if let Some(v) = optional("GOOGLE_REQUESTS_PER_SECOND") {
            self.requests_per_second = parse_positive("GOOGLE_REQUESTS_PER_SECOND", &v)?;
        }
        if let Some(v) = optional("LOGS_PATH") {
            self.logs_path = PathBuf::from(v);
        }

        if let Some(v) = optional("SHEETS_API_URL") {
            self.sheets_api_url = v;
        }
        if let Some(v) = optional("DRIVE_API_URL") {
            self.drive_api_url = v;
        }
        if let Some(v) = optional("GMAIL_API_URL") {
            self.gmail_api_url = v;
        }

        Ok(())
    }

    /// Address in the `From` header of outgoing mail.
    pub fn sender_email(&self) -> &str {
        self.gmail_delegated_user
            .as_deref()
            .unwrap_or(&self.service_account_email)
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> Result<String, AppError> {
    optional(key).ok_or_else(|| AppError::MissingConfig {
        key: key.to_string(),
    })
}

/// Parses a non-zero integer. Zero and values out of range for `T` are rejected.
fn parse_positive<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr + Default + PartialEq,
{
    match value.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(AppError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
