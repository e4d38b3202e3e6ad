use unicode_segmentation::UnicodeSegmentation;

const MIN_LENGTH: usize = 10;
const MAX_LENGTH: usize = 500;

#[derive(Debug, Clone)]
pub struct ContactMessage(String);

impl ContactMessage {
    pub fn parse(s: String) -> Result<ContactMessage, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Message is required".into());
        }

        let length = trimmed.graphemes(true).count();
        if length < MIN_LENGTH || length > MAX_LENGTH {
            return Err(format!(
                "Message must be between {} and {} characters long",
                MIN_LENGTH, MAX_LENGTH
            ));
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for ContactMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
