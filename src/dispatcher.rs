use crate::domain::{ContactEmail, ContactSubmission, MailMessage};
use crate::email_client::{DispatchError, EmailClient};

/// Turns contact submissions into notification emails for the site owner.
///
/// Sends are never retried here: a second attempt after an ambiguous
/// failure can deliver the same notification twice.
pub struct MailDispatcher {
    email_client: EmailClient,
    recipient: ContactEmail,
}

impl MailDispatcher {
    pub fn new(email_client: EmailClient, recipient: ContactEmail) -> Self {
        Self {
            email_client,
            recipient,
        }
    }

    #[tracing::instrument(
        name = "Dispatching a contact notification",
        skip(self, submission),
        fields(inquiry_type = %submission.kind)
    )]
    pub async fn dispatch(&self, submission: &ContactSubmission) -> Result<String, DispatchError> {
        let message = MailMessage::notification(submission, &self.recipient);
        self.send(&message).await
    }

    pub async fn send(&self, message: &MailMessage) -> Result<String, DispatchError> {
        self.email_client.send_email(message).await
    }
}
