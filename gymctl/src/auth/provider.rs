//! Identity provider integration for the login flow.
//!
//! [`IdentityProvider`] abstracts the OAuth2 authorization-code dance so
//! handlers and tests never depend on Google being reachable. The production
//! implementation is [`GoogleProvider`]; tests substitute their own.
//!
//! Provider requests are never retried. A slow or failing provider surfaces
//! as a failed login within one `http_timeout`, and the user simply tries
//! again.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::api::models::principals::Principal;
use crate::config::OAuthConfig;
use crate::errors::{Error, Result};

/// Scopes requested at consent. Profile and email are everything this
/// service needs to build a principal.
const OAUTH_SCOPES: &str = "profile email";

/// Profile document returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    /// Provider-assigned stable subject identifier
    pub sub: String,
    /// Display name; absent on some accounts
    #[serde(default)]
    pub name: String,
    /// Email address; requires the email scope
    #[serde(default)]
    pub email: String,
}

/// Response body of the code-for-token exchange. Google also sends
/// `expires_in`, `scope` and `token_type`, none of which we keep.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A provider that can turn an authorization code into a principal.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Name recorded on principals this provider authenticates.
    fn name(&self) -> &'static str;

    /// Consent page URL the login initiation redirects the browser to.
    fn authorization_url(&self, state: &str) -> Url;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String>;

    /// Fetch the profile document for an access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile>;

    /// Run the full code-to-principal flow.
    async fn authenticate(&self, code: &str) -> Result<Principal> {
        let access_token = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&access_token).await?;

        Ok(Principal {
            id: profile.sub,
            display_name: profile.name,
            email: profile.email,
            provider: self.name().to_string(),
            kind: "user".to_string(),
            access_token,
        })
    }
}

/// Google OAuth2 implementation of [`IdentityProvider`].
///
/// Endpoint URLs come from [`OAuthConfig`], so tests can point this at a
/// local stand-in server without touching the flow itself.
pub struct GoogleProvider {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl GoogleProvider {
    pub fn new(config: &OAuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::Internal {
                operation: format!("build OAuth HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.callback_url.as_str())
            .append_pair("scope", OAUTH_SCOPES)
            .append_pair("state", state);
        url
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.callback_url.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Provider {
                operation: format!("token exchange request failed: {e}"),
            })?;

        if !response.status().is_success() {
            // The body may describe our client credentials, keep it out of
            // the error
            return Err(Error::Provider {
                operation: format!("token exchange returned {}", response.status()),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| Error::Provider {
            operation: format!("token exchange returned an unreadable body: {e}"),
        })?;

        Ok(token.access_token)
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Provider {
                operation: format!("profile fetch request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Provider {
                operation: format!("profile fetch returned {}", response.status()),
            });
        }

        response.json().await.map_err(|e| Error::Provider {
            operation: format!("profile fetch returned an unreadable body: {e}"),
        })
    }
}
