use crate::backend::error::BackendError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("Backend error: {0}")]
    BackendError(#[from] BackendError),
}
