use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, RedirectUrl, RefreshToken, RequestTokenError,
    TokenResponse, TokenUrl,
};
use reqwest::{redirect, Client};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::configuration::{ConfigurationError, GmailSettings};

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_MARGIN_SECONDS: i64 = 60;
const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(3599);
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

pub struct OAuth2Credential {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub refresh_token: Secret<String>,
}

impl OAuth2Credential {
    pub fn from_settings(settings: &GmailSettings) -> Result<Self, ConfigurationError> {
        let required = [
            ("GMAIL_CLIENT_ID", settings.client_id.as_str()),
            ("GMAIL_CLIENT_SECRET", settings.client_secret.expose_secret().as_str()),
            ("GMAIL_REDIRECT_URI", settings.redirect_uri.as_str()),
            ("GMAIL_REFRESH_TOKEN", settings.refresh_token.expose_secret().as_str()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigurationError::Missing(*name));
        }

        Ok(Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            refresh_token: settings.refresh_token.clone(),
        })
    }

    fn oauth2_client(&self, token_url: &str) -> Result<BasicClient, ConfigurationError> {
        let auth_url =
            AuthUrl::new(GOOGLE_AUTH_URL.to_string()).map_err(|e| ConfigurationError::Invalid {
                key: "gmail.auth_url",
                reason: e.to_string(),
            })?;
        let token_url =
            TokenUrl::new(token_url.to_string()).map_err(|e| ConfigurationError::Invalid {
                key: "gmail.token_url",
                reason: e.to_string(),
            })?;
        let redirect_url = RedirectUrl::new(self.redirect_uri.clone()).map_err(|e| {
            ConfigurationError::Invalid {
                key: "gmail.redirect_uri",
                reason: e.to_string(),
            }
        })?;

        Ok(BasicClient::new(
            ClientId::new(self.client_id.clone()),
            Some(ClientSecret::new(self.client_secret.expose_secret().clone())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(redirect_url))
    }
}

#[derive(Clone, Debug)]
pub struct AccessToken {
    secret: Secret<String>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn secret(&self) -> &Secret<String> {
        &self.secret
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(EXPIRY_MARGIN_SECONDS) < self.expires_at
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("Failed to reach the token endpoint")]
    Request(#[source] reqwest::Error),
    #[error("The token endpoint refused the refresh token: {error}")]
    Rejected { error: String },
    #[error("The token endpoint returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl From<RequestTokenError<reqwest::Error, BasicErrorResponse>> for TokenError {
    fn from(e: RequestTokenError<reqwest::Error, BasicErrorResponse>) -> Self {
        match e {
            RequestTokenError::ServerResponse(response) => {
                let error = match response.error_description() {
                    Some(description) => format!("{}: {}", response.error(), description),
                    None => response.error().to_string(),
                };
                TokenError::Rejected { error }
            }
            RequestTokenError::Request(e) => TokenError::Request(e),
            RequestTokenError::Parse(e, _) => TokenError::MalformedResponse(e.to_string()),
            RequestTokenError::Other(error) => TokenError::Rejected { error },
        }
    }
}

/// Owns the mail credential and the access token minted from it.
///
/// Every refresh holds the write lock for the whole exchange, so at most one
/// refresh is in flight and readers never see a partially updated token.
pub struct TokenManager {
    http_client: Client,
    oauth2_client: BasicClient,
    refresh_token: RefreshToken,
    access_token: RwLock<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(settings: &GmailSettings) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        let credential = OAuth2Credential::from_settings(settings)?;
        let oauth2_client = credential.oauth2_client(&settings.token_url)?;
        // The token endpoint must answer directly, never through a redirect.
        let http_client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                key: "gmail.timeout_milliseconds",
                reason: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            oauth2_client,
            refresh_token: RefreshToken::new(credential.refresh_token.expose_secret().clone()),
            access_token: RwLock::new(None),
        })
    }

    /// Exchanges the refresh token for a new access token, replacing the
    /// cached one. On failure the previous token is left untouched.
    #[tracing::instrument(name = "Refreshing the mail access token", skip(self))]
    pub async fn refresh(&self) -> Result<AccessToken, TokenError> {
        let mut state = self.access_token.write().await;
        let token = self.exchange_refresh_token().await?;
        *state = Some(token.clone());
        Ok(token)
    }

    /// Returns a usable access token, refreshing first when there is none
    /// or the cached one is about to expire.
    pub async fn access_token(&self) -> Result<Secret<String>, TokenError> {
        {
            let state = self.access_token.read().await;
            if let Some(token) = state.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.secret.clone());
            }
        }

        let mut state = self.access_token.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = state.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.secret.clone());
        }
        let token = self.exchange_refresh_token().await?;
        let secret = token.secret.clone();
        *state = Some(token);
        Ok(secret)
    }

    /// Spawns the periodic refresh. The first refresh runs one `period`
    /// after this call. `period` must be non-zero.
    pub fn start(self: Arc<Self>, period: Duration) -> RefreshHandle {
        let task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh().await {
                    tracing::error!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "Scheduled access token refresh failed, keeping the previous token"
                    );
                }
            }
        });
        RefreshHandle { task }
    }

    async fn exchange_refresh_token(&self) -> Result<AccessToken, TokenError> {
        let response = self
            .oauth2_client
            .exchange_refresh_token(&self.refresh_token)
            .request_async(|request| self.send_token_request(request))
            .await?;

        let expires_in = response.expires_in().unwrap_or(DEFAULT_EXPIRES_IN);
        let expires_at = chrono::Duration::from_std(expires_in)
            .ok()
            .filter(|lifetime| *lifetime > chrono::Duration::zero())
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                TokenError::MalformedResponse(format!(
                    "`expires_in` of {} seconds is out of range",
                    expires_in.as_secs()
                ))
            })?;

        Ok(AccessToken {
            secret: Secret::new(response.access_token().secret().clone()),
            expires_at,
        })
    }

    async fn send_token_request(
        &self,
        request: oauth2::HttpRequest,
    ) -> Result<oauth2::HttpResponse, reqwest::Error> {
        let response = self
            .http_client
            .request(request.method, request.url.as_str())
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status_code = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(oauth2::HttpResponse {
            status_code,
            headers,
            body,
        })
    }
}

/// Keeps the scheduled refresh alive. Stopping or dropping it ends the task.
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
