//! Confirmation emails and operator alerts.

use std::sync::Arc;

use minijinja::Environment;
use minijinja::context;

use crate::backend::Mailer;
use crate::model::EmailMessageBuilder;
use crate::model::resource_name;
use crate::service::error::ServiceError;

const ADDED: &str = "You have been successfully added to Finz - use your shared spreadsheet \
(named \"{{ name }}\" at link {{ url }}) to choose your stocks and preferences.";

const UNSUBSCRIBED: &str = "You have been successfully unsubscribed from Finz.";

const RESUBSCRIBED: &str = "You have been successfully resubscribed from Finz. You can use the \
spreadsheet you were using before (named \"{{ name }}\" at link {{ url }}).";

const OPERATOR_ALERT: &str = "Please check the Finz request processor: {{ failed }} request(s) \
failed in the last run. Those rows are already marked processed and will not be retried.\n\n\
Last error: {{ error }}";

const OPERATOR_ALERT_SUBJECT: &str = "Finz Request Processor Failed";

/// Which confirmation a request produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Added,
    Unsubscribed,
    Resubscribed,
}

impl Notice {
    fn template_name(self) -> &'static str {
        match self {
            Notice::Added => "added.txt",
            Notice::Unsubscribed => "unsubscribed.txt",
            Notice::Resubscribed => "resubscribed.txt",
        }
    }
}

pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    env: Environment<'static>,
    subject: String,
    operator_email: Option<String>,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        subject: &str,
        operator_email: Option<String>,
    ) -> Result<Self, ServiceError> {
        let mut env = Environment::new();
        env.add_template("added.txt", ADDED)?;
        env.add_template("unsubscribed.txt", UNSUBSCRIBED)?;
        env.add_template("resubscribed.txt", RESUBSCRIBED)?;
        env.add_template("operator_alert.txt", OPERATOR_ALERT)?;

        Ok(Self {
            mailer,
            env,
            subject: subject.to_string(),
            operator_email,
        })
    }

    /// Renders the body of `notice` for `email`. `url` is ignored by notices without a link.
    pub fn render(&self, notice: Notice, email: &str, url: &str) -> Result<String, ServiceError> {
        let template = self.env.get_template(notice.template_name())?;
        Ok(template.render(context! {
            name => resource_name(email),
            url => url,
        })?)
    }

    pub async fn notify(&self, notice: Notice, email: &str, url: &str) -> Result<(), ServiceError> {
        let body = self.render(notice, email, url)?;
        self.send(email, &self.subject, body).await
    }

    /// Emails the operator about a failed batch. Returns `false` when no operator is configured.
    pub async fn alert_operator(&self, failed: usize, error: &str) -> Result<bool, ServiceError> {
        let Some(operator) = &self.operator_email else {
            return Ok(false);
        };
        let body = self
            .env
            .get_template("operator_alert.txt")?
            .render(context! { failed => failed, error => error })?;
        self.send(operator, OPERATOR_ALERT_SUBJECT, body).await?;
        Ok(true)
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), ServiceError> {
        let message = EmailMessageBuilder::default()
            .to(to)
            .subject(subject)
            .body(body)
            .build()
            .map_err(|e| ServiceError::InvalidMessage {
                message: e.to_string(),
            })?;
        self.mailer.send_email(message).await?;
        Ok(())
    }
}
