use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::ContactEmail;

/// Environment variables that carry the mail credentials, and the
/// setting each one fills in.
pub const GMAIL_ENVIRONMENT_VARIABLES: [(&str, &str); 5] = [
    ("GMAIL_CLIENT_ID", "gmail.client_id"),
    ("GMAIL_CLIENT_SECRET", "gmail.client_secret"),
    ("GMAIL_REDIRECT_URI", "gmail.redirect_uri"),
    ("GMAIL_REFRESH_TOKEN", "gmail.refresh_token"),
    ("SMTP_SERVER_USERNAME", "gmail.recipient"),
];

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required configuration value `{0}`")]
    Missing(&'static str),
    #[error("Invalid configuration value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub gmail: GmailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct GmailSettings {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub refresh_token: Secret<String>,
    pub recipient: String,
    pub api_base_url: String,
    pub token_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub refresh_interval_seconds: u64,
}

impl GmailSettings {
    pub fn recipient(&self) -> Result<ContactEmail, ConfigurationError> {
        ContactEmail::parse(self.recipient.clone()).map_err(|reason| {
            ConfigurationError::Invalid {
                key: "gmail.recipient",
                reason,
            }
        })
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Rejects durations the HTTP clients and the refresh timer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.timeout_milliseconds == 0 {
            return Err(ConfigurationError::Invalid {
                key: "gmail.timeout_milliseconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.refresh_interval_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                key: "gmail.refresh_interval_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigurationError> {
    let mut settings = config::Config::default();

    // Shared defaults, then the per-environment file
    settings.merge(config::File::with_name("configuration/base").required(true))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|reason| ConfigurationError::Invalid {
            key: "APP_ENVIRONMENT",
            reason,
        })?;
    settings.merge(
        config::File::with_name(&format!("configuration/{}", environment.as_str()))
            .required(true),
    )?;

    // e.g. `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;

    apply_gmail_environment(&mut settings, |name| std::env::var(name).ok())?;

    into_settings(settings)
}

/// Copies the mail credential variables into `settings`, reading them
/// through `lookup`.
pub fn apply_gmail_environment<F>(
    settings: &mut config::Config,
    lookup: F,
) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    for (variable, key) in GMAIL_ENVIRONMENT_VARIABLES {
        if let Some(value) = lookup(variable) {
            settings.set(key, value)?;
        }
    }
    Ok(())
}

/// Deserializes the merged sources, turning an absent or blank
/// credential into [`ConfigurationError::Missing`] and a zero timeout or
/// refresh interval into [`ConfigurationError::Invalid`].
pub fn into_settings(settings: config::Config) -> Result<Settings, ConfigurationError> {
    for (variable, key) in GMAIL_ENVIRONMENT_VARIABLES {
        match settings.get_str(key) {
            Ok(value) if !value.trim().is_empty() => {}
            _ => return Err(ConfigurationError::Missing(variable)),
        }
    }
    let settings: Settings = settings.try_into()?;
    settings.gmail.validate()?;
    Ok(settings)
}


#[cfg(test)]
impl GmailSettings {
    /// Settings pointing both the token endpoint and the mail API at a
    /// local mock server.
    pub(crate) fn for_mock_server(uri: &str) -> Self {
        GmailSettings {
            client_id: "test-client-id".into(),
            client_secret: Secret::new("test-client-secret".into()),
            redirect_uri: "https://developers.google.com/oauthplayground".into(),
            refresh_token: Secret::new("test-refresh-token".into()),
            recipient: "owner@portfolio.dev".into(),
            api_base_url: uri.into(),
            token_url: format!("{}/token", uri),
            timeout_milliseconds: 200,
            refresh_interval_seconds: 3480,
        }
    }
}
