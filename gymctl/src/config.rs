//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `GYMCTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `GYMCTL_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `GYMCTL_OAUTH__CLIENT_ID=abc` sets the `oauth.client_id` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use gymctl::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Parse CLI arguments
//! let args = Args::parse();
//!
//! // Load configuration from file and environment
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! The configuration file is structured in YAML format. See the repository's `config.yaml` for a
//! complete example with all available options. Key sections include:
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **OAuth**: `oauth.client_id`, `oauth.client_secret`, `oauth.callback_url` - Google OAuth2 client
//! - **Session**: `session.secret_key`, `session.timeout`, `session.cookie_name` - Session cookies
//! - **Redirects**: `redirects.success_url`, `redirects.failure_url` - Browser destinations after login
//! - **Security**: `cors.allowed_origins` - CORS settings for the frontend
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! GYMCTL_PORT=8080
//!
//! # Set the OAuth client credentials
//! GYMCTL_OAUTH__CLIENT_ID="1234.apps.googleusercontent.com"
//! GYMCTL_OAUTH__CLIENT_SECRET="shhh"
//!
//! # Override nested values
//! GYMCTL_SESSION__SECRET_KEY="a-long-random-string"
//! GYMCTL_SESSION__COOKIE_SECURE=false
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "GYMCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Google OAuth2 client configuration
    pub oauth: OAuthConfig,
    /// Session cookie and server-side session configuration
    pub session: SessionConfig,
    /// Browser destinations for login outcomes
    pub redirects: RedirectConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// Google OAuth2 client configuration.
///
/// The endpoint URLs default to Google's public OAuth2 endpoints and only
/// need overriding when pointing the service at a stand-in provider in tests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    /// OAuth2 client ID issued by the Google Cloud console
    pub client_id: String,
    /// OAuth2 client secret issued by the Google Cloud console
    pub client_secret: String,
    /// Redirect URI registered for this client. Google sends the
    /// authorization code here, so it must resolve to this service's
    /// `/auth/google/callback` route.
    pub callback_url: Url,
    /// Consent page endpoint the login initiation redirects to
    pub authorize_url: Url,
    /// Code-for-token exchange endpoint
    pub token_url: Url,
    /// Profile document endpoint
    pub userinfo_url: Url,
    /// Deadline applied to every outbound provider request
    #[serde(with = "humantime_serde")]
    pub http_timeout: Duration,
}

/// Session cookie and server-side session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Secret key for signing session cookies (required)
    pub secret_key: Option<String>,
    /// Session timeout duration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

/// Browser destinations for login outcomes.
///
/// These point at the frontend application, not at this service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedirectConfig {
    /// Where the callback sends the browser after a completed login
    pub success_url: Url,
    /// Where the callback sends the browser when login fails
    pub failure_url: Url,
    /// Where logout sends the browser
    pub logout_url: Url,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
    /// Custom headers to expose to the browser (in addition to CORS-safelisted headers)
    pub exposed_headers: Vec<String>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            oauth: OAuthConfig::default(),
            session: SessionConfig::default(),
            redirects: RedirectConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: Url::parse("http://localhost:3001/auth/google/callback").unwrap(),
            authorize_url: Url::parse("https://accounts.google.com/o/oauth2/v2/auth").unwrap(),
            token_url: Url::parse("https://oauth2.googleapis.com/token").unwrap(),
            userinfo_url: Url::parse("https://www.googleapis.com/oauth2/v3/userinfo").unwrap(),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            timeout: Duration::from_secs(24 * 60 * 60), // 24 hours
            cookie_name: "gymctl_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "strict".to_string(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            success_url: Url::parse("http://localhost:3030/auth/google/callback").unwrap(),
            failure_url: Url::parse("http://localhost:3030/login").unwrap(),
            logout_url: Url::parse("http://localhost:3030/login").unwrap(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                CorsOrigin::Url(Url::parse("http://localhost:3030").unwrap()), // Development frontend
            ],
            allow_credentials: true,
            max_age: Some(3600), // Cache preflight for 1 hour
            exposed_headers: vec!["location".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables, then validate it.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;

        config
            .validate()
            .map_err(|e| figment::Error::from(e.to_string()))?;

        Ok(config)
    }

    /// The figment used by [`Config::load`], exposed for tests that want to
    /// extract without validating.
    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("GYMCTL_").split("__"))
    }

    /// Check invariants that serde cannot express. Called at startup so a
    /// misconfigured service refuses to boot instead of failing mid-login.
    pub fn validate(&self) -> Result<(), Error> {
        if self.oauth.client_id.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: Google login requires oauth.client_id. \
                     Please set the GYMCTL_OAUTH__CLIENT_ID environment variable or add oauth.client_id to the config file."
                    .to_string(),
            });
        }

        if self.oauth.client_secret.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: Google login requires oauth.client_secret. \
                     Please set the GYMCTL_OAUTH__CLIENT_SECRET environment variable or add oauth.client_secret to the config file."
                    .to_string(),
            });
        }

        if self.oauth.http_timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: oauth.http_timeout cannot be zero.".to_string(),
            });
        }

        match &self.session.secret_key {
            None => {
                return Err(Error::Internal {
                    operation: "Config validation: session.secret_key is not configured. \
                     Please set the GYMCTL_SESSION__SECRET_KEY environment variable or add session.secret_key to the config file."
                        .to_string(),
                });
            }
            Some(key) if key.is_empty() => {
                return Err(Error::Internal {
                    operation: "Config validation: session.secret_key cannot be empty.".to_string(),
                });
            }
            Some(_) => {}
        }

        // Validate session timeout duration is reasonable
        if self.session.timeout.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "Config validation: Session timeout is too short (minimum 5 minutes)"
                    .to_string(),
            });
        }

        if self.session.timeout.as_secs() > 86400 * 30 {
            // More than 30 days
            return Err(Error::Internal {
                operation: "Config validation: Session timeout is too long (maximum 30 days)"
                    .to_string(),
            });
        }

        let same_site = self.session.cookie_same_site.as_str();
        if !matches!(same_site, "strict" | "lax" | "none") {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: session.cookie_same_site must be 'strict', 'lax', or 'none', got '{same_site}'"
                ),
            });
        }

        // Validate CORS configuration
        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation:
                    "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin."
                        .to_string(),
            });
        }

        // Validate that wildcard is not used with credentials
        let has_wildcard = self
            .cors
            .allowed_origins
            .iter()
            .any(|origin| matches!(origin, CorsOrigin::Wildcard));

        if has_wildcard && self.cors.allow_credentials {
            return Err(Error::Internal {
                operation:
                    "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                        .to_string(),
            });
        }

        Ok(())
    }

    /// The address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
