//! In-memory backends for driving the request processor without Google.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;
use finz_requests::backend::FileStore;
use finz_requests::backend::Mailer;
use finz_requests::backend::SheetStore;
use finz_requests::backend::error::BackendError;
use finz_requests::config::Config;
use finz_requests::model::CellValue;
use finz_requests::model::EmailMessage;
use finz_requests::model::Row;
use finz_requests::repository::Repository;
use finz_requests::service::Services;

pub const SERVICE_PRINCIPAL: &str = "spreadsheets@finz.iam.gserviceaccount.com";
pub const TEMPLATE_ID: &str = "template-1";

fn injected(message: &str) -> BackendError {
    BackendError::ApiError {
        status: 500,
        message: message.to_string(),
    }
}

// MOCK SHEETS

#[derive(Default)]
#[allow(dead_code)]
pub struct MemorySheets {
    pub state: RwLock<HashMap<String, Vec<Row>>>,
    /// Sheet whose cell writes fail.
    pub fail_writes_to: RwLock<Option<String>>,
    pub fail_appends: RwLock<bool>,
}

#[allow(dead_code)]
impl MemorySheets {
    pub fn set_rows(&self, sheet: &str, rows: &[&[&str]]) {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        self.state.write().unwrap().insert(sheet.to_string(), rows);
    }

    pub fn rows(&self, sheet: &str) -> Vec<Row> {
        self.state
            .read()
            .unwrap()
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }

    pub fn row(&self, sheet: &str, index: usize) -> Row {
        self.rows(sheet)[index].clone()
    }
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.clone(),
        CellValue::Integer(i) => i.to_string(),
    }
}

#[async_trait]
impl SheetStore for MemorySheets {
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>, BackendError> {
        Ok(self.rows(sheet))
    }

    async fn write_cell(
        &self,
        sheet: &str,
        row: u32,
        column: u32,
        value: CellValue,
    ) -> Result<(), BackendError> {
        if self.fail_writes_to.read().unwrap().as_deref() == Some(sheet) {
            return Err(injected("write failed"));
        }
        let mut state = self.state.write().unwrap();
        let rows = state.entry(sheet.to_string()).or_default();
        let (r, c) = (row as usize - 1, column as usize - 1);
        if rows.len() <= r {
            rows.resize(r + 1, Vec::new());
        }
        if rows[r].len() <= c {
            rows[r].resize(c + 1, String::new());
        }
        rows[r][c] = cell_text(&value);
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Vec<CellValue>) -> Result<u32, BackendError> {
        if *self.fail_appends.read().unwrap() {
            return Err(injected("append failed"));
        }
        let mut state = self.state.write().unwrap();
        let rows = state.entry(sheet.to_string()).or_default();
        rows.push(values.iter().map(cell_text).collect());
        Ok(rows.len() as u32)
    }
}

// MOCK FILES

#[derive(Clone, Debug, Default)]
#[allow(dead_code)]
pub struct FileCopy {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub editors: Vec<String>,
    pub writers_can_share: bool,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct MemoryFiles {
    pub files: RwLock<Vec<FileCopy>>,
    /// Copies whose name contains this text fail.
    pub fail_copy_containing: RwLock<Option<String>>,
}

#[allow(dead_code)]
impl MemoryFiles {
    pub fn files(&self) -> Vec<FileCopy> {
        self.files.read().unwrap().clone()
    }
}

pub fn file_url(id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{id}/edit")
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn copy_template(&self, template_id: &str, name: &str) -> Result<String, BackendError> {
        if let Some(needle) = self.fail_copy_containing.read().unwrap().as_deref()
            && name.contains(needle)
        {
            return Err(injected(&format!("copy of {name} failed")));
        }
        let mut files = self.files.write().unwrap();
        let id = format!("file-{}", files.len() + 1);
        files.push(FileCopy {
            id: id.clone(),
            template_id: template_id.to_string(),
            name: name.to_string(),
            editors: Vec::new(),
            writers_can_share: true,
        });
        Ok(id)
    }

    async fn set_permissions(&self, file_id: &str, editors: &[String]) -> Result<(), BackendError> {
        let mut files = self.files.write().unwrap();
        let file = files
            .iter_mut()
            .find(|f| f.id == file_id)
            .ok_or_else(|| injected("file not found"))?;
        file.writers_can_share = false;
        file.editors.extend(editors.iter().cloned());
        Ok(())
    }

    async fn file_url(&self, file_id: &str) -> Result<String, BackendError> {
        Ok(file_url(file_id))
    }
}

// MOCK MAILER

#[derive(Default)]
#[allow(dead_code)]
pub struct MemoryMailer {
    pub sent: RwLock<Vec<EmailMessage>>,
    /// Messages to these recipients fail.
    pub fail_for: RwLock<Vec<String>>,
}

#[allow(dead_code)]
impl MemoryMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_email(&self, message: EmailMessage) -> Result<(), BackendError> {
        if self.fail_for.read().unwrap().contains(&message.to) {
            return Err(injected(&format!("mail to {} bounced", message.to)));
        }
        self.sent.write().unwrap().push(message);
        Ok(())
    }
}

// HARNESS

pub const REQUESTS_HEADER: &[&str] = &["Timestamp", "Email", "Action", "Processed?"];
pub const DATABASE_HEADER: &[&str] = &[
    "Email",
    "Spreadsheet ID",
    "Subscribed?",
    "Last Date Success",
    "Num Current Day Failures",
];

#[allow(dead_code)]
pub struct Harness {
    pub sheets: Arc<MemorySheets>,
    pub files: Arc<MemoryFiles>,
    pub mailer: Arc<MemoryMailer>,
    pub services: Arc<Services>,
}

pub fn test_config() -> Config {
    let mut config = Config::new();
    config.requests_spreadsheet_id = "requests-1".to_string();
    config.template_spreadsheet_id = TEMPLATE_ID.to_string();
    config.service_account_email = SERVICE_PRINCIPAL.to_string();
    config
}

#[allow(dead_code)]
pub fn setup() -> Harness {
    setup_with(test_config())
}

pub fn setup_with(config: Config) -> Harness {
    let sheets = Arc::new(MemorySheets::default());
    sheets.set_rows(&config.requests_sheet_name, &[REQUESTS_HEADER]);
    sheets.set_rows(&config.database_sheet_name, &[DATABASE_HEADER]);
    let files = Arc::new(MemoryFiles::default());
    let mailer = Arc::new(MemoryMailer::default());

    let repository = Arc::new(Repository::new(sheets.clone(), files.clone(), &config));
    let services = Arc::new(
        Services::new(repository, mailer.clone(), &config).expect("Failed to create services"),
    );

    Harness {
        sheets,
        files,
        mailer,
        services,
    }
}
