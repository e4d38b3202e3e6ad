use std::sync::Arc;
use std::time::Duration;

use lettre::address::AddressError;
use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::Message;
use reqwest::Client;
use secrecy::ExposeSecret;

use crate::domain::{ContactEmail, MailMessage};
use crate::token_manager::{TokenError, TokenManager};

const SEND_PATH: &str = "/gmail/v1/users/me/messages/send";

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("Failed to obtain an access token for the mail provider")]
    Token(#[source] TokenError),
    #[error("Failed to parse a mail address")]
    Address(#[source] AddressError),
    #[error("Failed to build the mail message")]
    Message(#[source] lettre::error::Error),
    #[error("The mail provider failed to send the message")]
    Provider(#[source] reqwest::Error),
    #[error("The mail provider returned a malformed response")]
    MalformedResponse(#[source] reqwest::Error),
}

/// Client for the Gmail API, authenticated through the [`TokenManager`].
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    token_manager: Arc<TokenManager>,
}

#[derive(serde::Serialize)]
struct SendMessageRequest<'a> {
    raw: &'a str,
}

#[derive(serde::Deserialize)]
struct SendMessageResponse {
    id: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        token_manager: Arc<TokenManager>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            token_manager,
        })
    }

    /// Sends `message` and returns the identifier the provider assigned to it.
    #[tracing::instrument(
        name = "Sending an email through the mail provider",
        skip(self, message),
        fields(message_id = tracing::field::Empty)
    )]
    pub async fn send_email(&self, message: &MailMessage) -> Result<String, DispatchError> {
        let raw = base64::encode_config(build_message(message)?.formatted(), base64::URL_SAFE);

        let access_token = self
            .token_manager
            .access_token()
            .await
            .map_err(DispatchError::Token)?;
        let url = format!("{}{}", self.base_url, SEND_PATH);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token.expose_secret())
            .json(&SendMessageRequest { raw: &raw })
            .send()
            .await
            .map_err(DispatchError::Provider)?
            .error_for_status()
            .map_err(DispatchError::Provider)?;

        let body = response
            .json::<SendMessageResponse>()
            .await
            .map_err(DispatchError::MalformedResponse)?;

        tracing::Span::current().record("message_id", &tracing::field::display(&body.id));
        Ok(body.id)
    }
}

fn mailbox(email: &ContactEmail) -> Result<Mailbox, DispatchError> {
    email.as_ref().parse().map_err(DispatchError::Address)
}

fn part(content_type: ContentType, body: &str) -> SinglePart {
    SinglePart::builder()
        .header(content_type)
        .header(ContentTransferEncoding::Base64)
        .body(body.to_string())
}

/// Builds the RFC 5322 message the provider expects in `raw`.
fn build_message(message: &MailMessage) -> Result<Message, DispatchError> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .to(mailbox(&message.to)?)
        .subject(message.subject.as_str());
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }

    let text = part(ContentType::TEXT_PLAIN, &message.body_text);
    let built = match &message.body_html {
        Some(body_html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(text)
                .singlepart(part(ContentType::TEXT_HTML, body_html)),
        ),
        None => builder.singlepart(text),
    };
    built.map_err(DispatchError::Message)
}
