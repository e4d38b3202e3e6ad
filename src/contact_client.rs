use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::domain::{ContactForm, ContactSubmission};
use crate::routes::contact::ContactResponse;

#[derive(Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub success: bool,
    pub message_id: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("Failed to reach the contact endpoint")]
    Transport(#[source] reqwest::Error),
    #[error("The contact endpoint answered {status}: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("The contact endpoint returned a malformed response")]
    MalformedResponse(#[source] reqwest::Error),
}

/// Sends validated submissions to the contact endpoint. One request per
/// call; retrying is left to the caller.
pub struct ContactClient {
    http_client: Client,
    endpoint: Url,
}

impl ContactClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }

    #[tracing::instrument(
        name = "Submitting the contact form",
        skip(self, submission),
        fields(endpoint = %self.endpoint)
    )]
    pub async fn submit(
        &self,
        submission: &ContactSubmission,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&ContactForm::from(submission))
            .send()
            .await
            .map_err(SubmitError::Transport)?;

        let status = response.status();
        let body = response.json::<ContactResponse>().await;

        match body {
            Ok(body) if status.is_success() => Ok(SubmissionReceipt {
                success: body.success,
                message_id: body.message_id,
            }),
            Ok(body) => Err(SubmitError::Rejected {
                status,
                message: body.message,
            }),
            Err(_) if !status.is_success() => Err(SubmitError::Rejected {
                status,
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string(),
            }),
            Err(e) => Err(SubmitError::MalformedResponse(e)),
        }
    }
}
