use crate::backend::error::BackendError;
use crate::repository::error::RepositoryError;
use crate::service::request_processor::BatchReport;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("RepositoryError: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("BackendError: {0}")]
    BackendError(#[from] BackendError),

    #[error("Failed to render email: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Failed to build email: {message}")]
    InvalidMessage { message: String },

    #[error("{failed} request(s) failed, last error: {last}")]
    BatchFailed {
        failed: usize,
        report: BatchReport,
        #[source]
        last: Box<ServiceError>,
    },
}
