use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::header::ALLOW;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use std::fmt::Formatter;

use crate::dispatcher::MailDispatcher;
use crate::domain::{ContactForm, ContactSubmission, FieldErrors};
use crate::email_client::DispatchError;

/// Body of every response served under `/api/contact`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ContactResponse {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            message_id: None,
            errors: None,
        }
    }
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("Invalid submission")]
    ValidationError(FieldErrors),
    #[error("Error sending email")]
    DispatchError(#[source] DispatchError),
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ContactError::DispatchError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Only our own messages go out, never the provider's.
        let body = match self {
            ContactError::ValidationError(errors) => ContactResponse {
                errors: Some(errors.clone()),
                ..ContactResponse::failure(&self.to_string())
            },
            ContactError::DispatchError(_) => ContactResponse::failure(&self.to_string()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Answers bodies that are not a well-formed contact form.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(ContactResponse::failure("Malformed submission"));
    InternalError::from_response(err, response).into()
}

#[tracing::instrument(
    name = "Handling a contact form submission",
    skip(form, dispatcher),
    fields(
        contact_email = %form.email,
        contact_name = %form.name,
        contact_phone = tracing::field::Empty
    )
)]
pub async fn contact(
    form: web::Json<ContactForm>,
    dispatcher: web::Data<MailDispatcher>,
) -> Result<HttpResponse, ContactError> {
    // The endpoint is reachable directly, so client-side checks are not enough.
    let submission = ContactSubmission::parse(form.0).map_err(ContactError::ValidationError)?;
    tracing::Span::current().record("contact_phone", &submission.phone.as_number());

    let message_id = dispatcher.dispatch(&submission).await.map_err(|e| {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "Failed to send the contact notification"
        );
        ContactError::DispatchError(e)
    })?;

    Ok(HttpResponse::Ok().json(ContactResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        message_id: Some(message_id),
        errors: None,
    }))
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((ALLOW, "POST"))
        .json(ContactResponse::failure("Method not allowed"))
}
