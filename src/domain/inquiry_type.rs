use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryType {
    Offer,
    Collaboration,
    Question,
    Other,
}

impl InquiryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryType::Offer => "offer",
            InquiryType::Collaboration => "collaboration",
            InquiryType::Question => "question",
            InquiryType::Other => "other",
        }
    }
}

impl FromStr for InquiryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "offer" => Ok(Self::Offer),
            "collaboration" => Ok(Self::Collaboration),
            "question" => Ok(Self::Question),
            "other" => Ok(Self::Other),
            other => Err(format!(
                "{} is not a supported inquiry type. Use one of: offer, collaboration, question, other",
                other
            )),
        }
    }
}

impl std::fmt::Display for InquiryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
