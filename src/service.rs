//! Request handling and notifications.

use std::sync::Arc;

use log::error;
use log::warn;

use crate::backend::Mailer;
use crate::config::Config;
use crate::repository::Repository;
use crate::service::error::ServiceError;
use crate::service::notifier::Notifier;
use crate::service::request_processor::BatchReport;
use crate::service::request_processor::RequestProcessor;

pub mod error;
pub mod notifier;
pub mod request_processor;

/// Container for all application services.
pub struct Services {
    pub notifier: Arc<Notifier>,
    pub request_processor: Arc<RequestProcessor>,
}

impl Services {
    pub fn new(
        repository: Arc<Repository>,
        mailer: Arc<dyn Mailer>,
        config: &Config,
    ) -> Result<Self, ServiceError> {
        let notifier = Arc::new(Notifier::new(
            mailer,
            &config.email_subject,
            config.operator_email.clone(),
        )?);
        let request_processor = Arc::new(RequestProcessor::new(repository, notifier.clone()));
        Ok(Self {
            notifier,
            request_processor,
        })
    }

    /// Runs one batch and alerts the operator when it ends failed.
    pub async fn run_batch(&self) -> Result<BatchReport, ServiceError> {
        let result = self.request_processor.process_requests().await;
        if let Err(ServiceError::BatchFailed { failed, last, .. }) = &result {
            match self.notifier.alert_operator(*failed, &last.to_string()).await {
                Ok(true) => {}
                Ok(false) => warn!("No operator email configured, failure alert not sent."),
                Err(e) => error!("Failed to alert operator: {e}"),
            }
        }
        result
    }
}
