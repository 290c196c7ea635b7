//! Application entry point for finz-requests.
//!
//! Runs a single batch over the Requests sheet, or keeps polling when
//! `POLL_INTERVAL` is set.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use finz_requests::backend::FileStore;
use finz_requests::backend::Mailer;
use finz_requests::backend::SheetStore;
use finz_requests::config::Config;
use finz_requests::config::GoogleCredentials;
use finz_requests::error::AppError;
use finz_requests::google::GoogleClient;
use finz_requests::google::auth::ServiceAccountKey;
use finz_requests::google::auth::ServiceAccountTokenSource;
use finz_requests::google::auth::StaticToken;
use finz_requests::google::auth::TokenSource;
use finz_requests::google::drive::DriveClient;
use finz_requests::google::gmail::GmailClient;
use finz_requests::google::sheets::SheetsClient;
use finz_requests::logging::setup_logging;
use finz_requests::repository::Repository;
use finz_requests::service::Services;
use finz_requests::task::request_poller::RequestPoller;
use log::debug;
use log::info;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let (config, _log_guard) = load_config()?;
    let services = setup_services(&config)?;
    info!(
        "Setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );

    match config.poll_interval {
        Some(poll_interval) => run_poller(services, poll_interval).await,
        None => run_once(&services).await,
    }
}

fn load_config() -> Result<(Config, WorkerGuard)> {
    let mut config = Config::new();
    config.load()?;
    let guard = setup_logging(&config)?;
    info!("Starting finz-requests...");
    Ok((config, guard))
}

fn setup_token_source(config: &Config) -> Result<Arc<dyn TokenSource>> {
    match &config.credentials {
        Some(GoogleCredentials::ServiceAccountKey(path)) => {
            let key = ServiceAccountKey::from_file(path)?;
            Ok(Arc::new(ServiceAccountTokenSource::new(
                key,
                config.gmail_delegated_user.clone(),
            )?))
        }
        Some(GoogleCredentials::AccessToken(token)) => Ok(Arc::new(StaticToken::new(token))),
        None => Err(AppError::MissingConfig {
            key: "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
        }
        .into()),
    }
}

fn setup_services(config: &Config) -> Result<Arc<Services>> {
    debug!("Setting up Google clients...");
    let google = Arc::new(GoogleClient::new(
        setup_token_source(config)?,
        config.requests_per_second,
    )?);

    let sheets: Arc<dyn SheetStore> = Arc::new(SheetsClient::new(
        google.clone(),
        &config.sheets_api_url,
        &config.requests_spreadsheet_id,
    ));
    let files: Arc<dyn FileStore> = Arc::new(DriveClient::new(google.clone(), &config.drive_api_url));
    let mailer: Arc<dyn Mailer> = Arc::new(GmailClient::new(
        google,
        &config.gmail_api_url,
        config.sender_email(),
    )?);

    debug!("Setting up Services...");
    let repository = Arc::new(Repository::new(sheets, files, config));
    Ok(Arc::new(Services::new(repository, mailer, config)?))
}

async fn run_once(services: &Services) -> Result<()> {
    let report = services.run_batch().await?;
    info!(
        "Run complete: {} processed, {} skipped.",
        report.processed(),
        report.skipped
    );
    Ok(())
}

async fn run_poller(services: Arc<Services>, poll_interval: std::time::Duration) -> Result<()> {
    let poller = RequestPoller::new(services, poll_interval);
    poller.clone().start()?;
    info!("finz-requests is polling. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");
    poller.shutdown().await?;

    Ok(())
}
