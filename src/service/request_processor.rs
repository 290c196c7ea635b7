//! Drives pending sign-up and unsubscribe requests to their processed state.

use std::sync::Arc;

use log::debug;
use log::error;
use log::info;
use tracing::Instrument;
use uuid::Uuid;

use crate::model::RequestAction;
use crate::model::RequestRecord;
use crate::model::RowIndex;
use crate::model::Subscribed;
use crate::model::UserEntry;
use crate::repository::Repository;
use crate::service::error::ServiceError;
use crate::service::notifier::Notice;
use crate::service::notifier::Notifier;

/// What a request does to the user database, decided by whether the
/// requester already has a record and which action they submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Unknown email signing up.
    CreateUser,
    /// Known email unsubscribing.
    Unsubscribe(UserEntry),
    /// Known email signing up again.
    Resubscribe(UserEntry),
    /// Unknown email unsubscribing. Nothing changes and no email is sent.
    UnsubscribeUnknownUser,
    /// The action cell held neither "Sign Up" nor "Unsubscribe".
    UnrecognizedAction(String),
}

impl Transition {
    pub fn resolve(existing: Option<UserEntry>, action: &RequestAction) -> Self {
        match (existing, action) {
            (None, RequestAction::SignUp) => Transition::CreateUser,
            (Some(user), RequestAction::Unsubscribe) => Transition::Unsubscribe(user),
            (Some(user), RequestAction::SignUp) => Transition::Resubscribe(user),
            (None, RequestAction::Unsubscribe) => Transition::UnsubscribeUnknownUser,
            (_, RequestAction::Unrecognized(other)) => {
                Transition::UnrecognizedAction(other.clone())
            }
        }
    }
}

/// Result of one successfully handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Created(UserEntry),
    Unsubscribed(UserEntry),
    Resubscribed(UserEntry),
    /// No database change and no email.
    Ignored,
}

/// Summary of one pass over the Requests sheet.
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    /// Handled rows in sheet order.
    pub outcomes: Vec<(RowIndex, RequestOutcome)>,
    /// Rows whose transition failed. They are marked processed all the same.
    pub failed: Vec<RowIndex>,
    /// Rows skipped because they were empty or already processed.
    pub skipped: usize,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.outcomes.len() + self.failed.len()
    }
}

pub struct RequestProcessor {
    pub repository: Arc<Repository>,
    pub notifier: Arc<Notifier>,
}

impl RequestProcessor {
    pub fn new(repository: Arc<Repository>, notifier: Arc<Notifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Applies the transition for a single request and sends its confirmation.
    ///
    /// # Performance
    /// * Sheet reads: 1
    /// * Sheet writes: 0..1
    /// * File calls: 0..3
    /// * Emails: 0..1
    pub async fn process_request(
        &self,
        request: &RequestRecord,
    ) -> Result<RequestOutcome, ServiceError> {
        let users = &self.repository.users;
        let existing = users.find_user(&request.email).await?;

        match Transition::resolve(existing, &request.action) {
            Transition::CreateUser => {
                let user = users.create(&request.email).await?;
                let url = users.resource_url(&user.record).await?;
                self.notifier
                    .notify(Notice::Added, &request.email, &url)
                    .await?;
                Ok(RequestOutcome::Created(user))
            }
            Transition::Unsubscribe(mut user) => {
                users.set_subscribed(user.index, Subscribed::No).await?;
                user.record.subscribed = Subscribed::No;
                self.notifier
                    .notify(Notice::Unsubscribed, &request.email, "")
                    .await?;
                Ok(RequestOutcome::Unsubscribed(user))
            }
            Transition::Resubscribe(mut user) => {
                users.set_subscribed(user.index, Subscribed::Yes).await?;
                user.record.subscribed = Subscribed::Yes;
                let url = users.resource_url(&user.record).await?;
                self.notifier
                    .notify(Notice::Resubscribed, &request.email, &url)
                    .await?;
                Ok(RequestOutcome::Resubscribed(user))
            }
            Transition::UnsubscribeUnknownUser => {
                debug!(
                    "Ignoring unsubscribe from unregistered {} (row {})",
                    request.email, request.index
                );
                Ok(RequestOutcome::Ignored)
            }
            Transition::UnrecognizedAction(action) => {
                debug!(
                    "Ignoring unrecognized action {action:?} from {} (row {})",
                    request.email, request.index
                );
                Ok(RequestOutcome::Ignored)
            }
        }
    }

    /// Handles every pending request row, top to bottom.
    ///
    /// Each pending row is marked processed right after its attempt, whether
    /// or not the attempt succeeded, so a failing request is never retried.
    /// Failures do not stop the pass; if any occurred the batch returns
    /// [`ServiceError::BatchFailed`] carrying the last one. Failing to mark a
    /// row aborts the batch at once.
    pub async fn process_requests(&self) -> Result<BatchReport, ServiceError> {
        let span = tracing::info_span!("batch", run_id = %Uuid::new_v4());
        self.run_pass().instrument(span).await
    }

    async fn run_pass(&self) -> Result<BatchReport, ServiceError> {
        let requests = self.repository.requests.select_all().await?;
        let mut report = BatchReport::default();
        let mut last_error = None;

        for request in &requests {
            if !request.is_pending() {
                report.skipped += 1;
                continue;
            }

            let result = self.process_request(request).await;
            self.repository.requests.mark_processed(request.index).await?;

            match result {
                Ok(outcome) => {
                    info!(
                        "Processed {} from {} (row {}): {}",
                        request.action,
                        request.email,
                        request.index,
                        outcome_name(&outcome)
                    );
                    report.outcomes.push((request.index, outcome));
                }
                Err(e) => {
                    error!(
                        "Failed to process {} from {} (row {}): {e}",
                        request.action, request.email, request.index
                    );
                    report.failed.push(request.index);
                    last_error = Some(e);
                }
            }
        }

        info!(
            "Batch done: {} processed, {} failed, {} skipped.",
            report.processed(),
            report.failed.len(),
            report.skipped
        );

        match last_error {
            Some(last) => Err(ServiceError::BatchFailed {
                failed: report.failed.len(),
                report,
                last: Box::new(last),
            }),
            None => Ok(report),
        }
    }
}

fn outcome_name(outcome: &RequestOutcome) -> &'static str {
    match outcome {
        RequestOutcome::Created(_) => "created",
        RequestOutcome::Unsubscribed(_) => "unsubscribed",
        RequestOutcome::Resubscribed(_) => "resubscribed",
        RequestOutcome::Ignored => "ignored",
    }
}
