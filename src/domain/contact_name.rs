use unicode_segmentation::UnicodeSegmentation;

const MIN_LENGTH: usize = 2;
const MAX_LENGTH: usize = 50;

#[derive(Debug, Clone)]
pub struct ContactName(String);

impl ContactName {
    pub fn parse(s: String) -> Result<ContactName, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Name is required".into());
        }

        let length = trimmed.graphemes(true).count();
        if length < MIN_LENGTH || length > MAX_LENGTH {
            return Err(format!(
                "Name must be between {} and {} characters long",
                MIN_LENGTH, MAX_LENGTH
            ));
        }

        // Names end up in mail headers.
        if trimmed.chars().any(char::is_control) {
            return Err("Name contains forbidden characters".into());
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for ContactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
