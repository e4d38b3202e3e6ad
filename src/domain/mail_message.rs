use crate::domain::{ContactEmail, ContactSubmission};
use crate::utils::capitalize;

#[derive(Debug, Clone)]
pub struct MailMessage {
    pub from: ContactEmail,
    pub to: ContactEmail,
    pub reply_to: Option<ContactEmail>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

impl MailMessage {
    /// The notification sent to the site owner for one contact submission.
    /// The owner's mailbox both sends and receives it; replies go to the
    /// person who filled in the form.
    pub fn notification(submission: &ContactSubmission, recipient: &ContactEmail) -> Self {
        let kind = capitalize(submission.kind.as_str());
        let subject = format!("[Contact] {} from {}", kind, submission.name);

        let body_text = format!(
            "Name: {name}\nEmail: {email}\nPhone: {phone}\nType: {kind}\n\n{message}\n",
            name = submission.name.as_ref(),
            email = submission.email.as_ref(),
            phone = submission.phone.as_ref(),
            kind = kind,
            message = submission.message.as_ref(),
        );

        let message_html = htmlescape::encode_minimal(submission.message.as_ref())
            .replace("\r\n", "\n")
            .replace('\n', "<br>");
        let body_html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>{subject}</title>
</head>
<body>
    <p><b>Name:</b> {name}</p>
    <p><b>Email:</b> {email}</p>
    <p><b>Phone:</b> {phone}</p>
    <p><b>Type:</b> {kind}</p>
    <p>{message}</p>
</body>
</html>
"#,
            subject = htmlescape::encode_minimal(&subject),
            name = htmlescape::encode_minimal(submission.name.as_ref()),
            email = htmlescape::encode_minimal(submission.email.as_ref()),
            phone = htmlescape::encode_minimal(submission.phone.as_ref()),
            kind = kind,
            message = message_html,
        );

        MailMessage {
            from: recipient.clone(),
            to: recipient.clone(),
            reply_to: Some(submission.email.clone()),
            subject,
            body_text,
            body_html: Some(body_html),
        }
    }
}
