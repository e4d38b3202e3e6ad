use std::collections::BTreeMap;

use serde_aux::field_attributes::deserialize_string_from_number;

use crate::domain::{ContactEmail, ContactMessage, ContactName, ContactPhone, InquiryType};

/// The contact form exactly as a client sends it. Every key is required;
/// field contents are only checked by [`ContactSubmission::parse`].
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub phone: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub consent: serde_json::Value,
}

#[derive(Debug, Clone, Copy)]
pub struct Consent;

impl Consent {
    pub fn parse(value: &serde_json::Value) -> Result<Consent, String> {
        match value {
            serde_json::Value::Bool(true) => Ok(Consent),
            _ => Err("You must agree to the processing of your personal data".into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: ContactName,
    pub email: ContactEmail,
    pub phone: ContactPhone,
    pub message: ContactMessage,
    pub kind: InquiryType,
    pub consent: Consent,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Phone,
    Message,
    Type,
    Consent,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn check<T>(&mut self, field: Field, outcome: Result<T, String>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(message) => {
                self.0.insert(field, message);
                None
            }
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{:?}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("The submission is not a well-formed contact form")]
    Structural(#[source] serde_json::Error),
    #[error("The submission failed validation: {0}")]
    Invalid(FieldErrors),
}

impl ContactSubmission {
    /// Checks every field and reports all failures at once.
    pub fn parse(form: ContactForm) -> Result<ContactSubmission, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = errors.check(Field::Name, ContactName::parse(form.name));
        let email = errors.check(Field::Email, ContactEmail::parse(form.email));
        let phone = errors.check(Field::Phone, ContactPhone::parse(form.phone));
        let message = errors.check(Field::Message, ContactMessage::parse(form.message));
        let kind = errors.check(Field::Type, form.kind.parse::<InquiryType>());
        let consent = errors.check(Field::Consent, Consent::parse(&form.consent));

        match (name, email, phone, message, kind, consent) {
            (Some(name), Some(email), Some(phone), Some(message), Some(kind), Some(consent)) => {
                Ok(ContactSubmission {
                    name,
                    email,
                    phone,
                    message,
                    kind,
                    consent,
                })
            }
            _ => Err(errors),
        }
    }
}

impl TryFrom<ContactForm> for ContactSubmission {
    type Error = FieldErrors;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        ContactSubmission::parse(form)
    }
}

impl From<&ContactSubmission> for ContactForm {
    fn from(submission: &ContactSubmission) -> Self {
        ContactForm {
            name: submission.name.as_ref().to_string(),
            email: submission.email.as_ref().to_string(),
            phone: submission.phone.as_ref().to_string(),
            message: submission.message.as_ref().to_string(),
            kind: submission.kind.as_str().to_string(),
            consent: serde_json::Value::Bool(true),
        }
    }
}

pub fn validate(candidate: serde_json::Value) -> Result<ContactSubmission, FormError> {
    let form: ContactForm = serde_json::from_value(candidate).map_err(FormError::Structural)?;
    ContactSubmission::parse(form).map_err(FormError::Invalid)
}
