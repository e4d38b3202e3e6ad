mod contact_email;
mod contact_message;
mod contact_name;
mod contact_phone;
mod contact_submission;
mod inquiry_type;
mod mail_message;

pub use contact_email::ContactEmail;
pub use contact_message::ContactMessage;
pub use contact_name::ContactName;
pub use contact_phone::ContactPhone;
pub use contact_submission::{
    validate, Consent, ContactForm, ContactSubmission, Field, FieldErrors, FormError,
};
pub use inquiry_type::InquiryType;
pub use mail_message::MailMessage;
