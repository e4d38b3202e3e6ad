const MIN_LENGTH: usize = 10;
const MAX_LENGTH: usize = 15;

/// A phone number as entered on the form: an optional leading `+`
/// followed by digits only, so it can always be read back as a number.
#[derive(Debug, Clone)]
pub struct ContactPhone(String);

impl ContactPhone {
    pub fn parse(s: String) -> Result<ContactPhone, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Phone number is required".into());
        }

        let length = trimmed.chars().count();
        if length < MIN_LENGTH || length > MAX_LENGTH {
            return Err(format!(
                "Phone number must be between {} and {} characters long",
                MIN_LENGTH, MAX_LENGTH
            ));
        }

        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err("Phone number may only contain digits".into());
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_number(&self) -> u64 {
        // At most 15 ASCII digits, always fits.
        self.0
            .trim_start_matches('+')
            .bytes()
            .fold(0u64, |number, digit| number * 10 + u64::from(digit - b'0'))
    }
}

impl AsRef<str> for ContactPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
