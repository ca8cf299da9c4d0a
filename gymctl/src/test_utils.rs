//! Test utilities shared across unit and handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;
use uuid::Uuid;

use crate::AppState;
use crate::api::models::principals::Principal;
use crate::auth::provider::{IdentityProvider, Profile};
use crate::auth::serializer::SessionSerializer;
use crate::auth::store::{MemorySessionStore, SessionRecord, SessionStore};
use crate::auth::token;
use crate::config::Config;
use crate::errors::{Error, Result};

/// Install the process-global rustls crypto provider, mirroring what `main`
/// does before anything builds a TLS client. reqwest is compiled with
/// `rustls-no-provider`, so building a client without this panics. Safe to
/// call from every test; only the first call in the process takes effect.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// A config that passes validation, with cookies usable in plain-HTTP tests.
pub fn create_test_config() -> Config {
    install_crypto_provider();
    let mut config = Config::default();
    config.oauth.client_id = "test-client-id".to_string();
    config.oauth.client_secret = "test-client-secret".to_string();
    config.session.secret_key = Some("test-secret-key-for-testing-only".to_string());
    config.session.cookie_secure = false;
    config
}

/// The principal [`StubProvider`] resolves for its known code.
pub fn create_test_principal() -> Principal {
    Principal {
        id: "42".to_string(),
        display_name: "Jane Lifter".to_string(),
        email: "a@b.com".to_string(),
        provider: "google".to_string(),
        kind: "user".to_string(),
        access_token: "test-access-token".to_string(),
    }
}

/// Provider double that recognizes exactly one authorization code.
///
/// `abc123` exchanges into `test-access-token` and resolves to subject `42`.
/// Every other code fails the way a revoked Google code would.
pub struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> Url {
        let mut url = Url::parse("https://accounts.example.com/consent").unwrap();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", "test-client-id")
            .append_pair("state", state);
        url
    }

    async fn exchange_code(&self, code: &str) -> Result<String> {
        match code {
            "abc123" => Ok("test-access-token".to_string()),
            _ => Err(Error::Provider {
                operation: "token exchange returned 400 Bad Request".to_string(),
            }),
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile> {
        match access_token {
            "test-access-token" => Ok(Profile {
                sub: "42".to_string(),
                name: "Jane Lifter".to_string(),
                email: "a@b.com".to_string(),
            }),
            _ => Err(Error::Provider {
                operation: "profile fetch returned 401 Unauthorized".to_string(),
            }),
        }
    }
}

/// Store double whose every operation fails, for outage behavior tests.
pub struct UnavailableSessionStore;

fn store_down() -> Error {
    Error::SessionStore {
        operation: "is unavailable in this test".to_string(),
    }
}

#[async_trait]
impl SessionStore for UnavailableSessionStore {
    async fn insert(&self, _record: SessionRecord) -> Result<()> {
        Err(store_down())
    }

    async fn get(&self, _id: Uuid) -> Result<Option<SessionRecord>> {
        Err(store_down())
    }

    async fn delete(&self, _id: Uuid) -> Result<()> {
        Err(store_down())
    }

    async fn put_login_state(&self, _state: String) -> Result<()> {
        Err(store_down())
    }

    async fn consume_login_state(&self, _state: &str) -> Result<bool> {
        Err(store_down())
    }
}

/// App state wired with in-memory storage and [`StubProvider`].
pub fn create_test_state() -> AppState {
    create_test_state_with(create_test_config(), Arc::new(StubProvider))
}

pub fn create_test_state_with(
    config: Config,
    identity_provider: Arc<dyn IdentityProvider>,
) -> AppState {
    let session_timeout = config.session.timeout;

    AppState::builder()
        .config(config)
        .session_store(Arc::new(MemorySessionStore::new(session_timeout)))
        .serializer(SessionSerializer::new(session_timeout))
        .identity_provider(identity_provider)
        .build()
}

/// Same wiring as [`create_test_state`] but with a store that always fails.
pub fn create_test_state_with_broken_store() -> AppState {
    let config = create_test_config();
    let session_timeout = config.session.timeout;

    AppState::builder()
        .config(config)
        .session_store(Arc::new(UnavailableSessionStore))
        .serializer(SessionSerializer::new(session_timeout))
        .identity_provider(Arc::new(StubProvider))
        .build()
}

/// Establish a session for the test principal directly against the state and
/// return the `Cookie` header value that references it.
pub async fn establish_test_session(state: &AppState) -> String {
    let principal = create_test_principal();
    let record = state
        .serializer
        .serialize(&principal, state.config.session.timeout)
        .await;
    state
        .session_store
        .insert(record.clone())
        .await
        .expect("test store insert should not fail");
    let cookie_token = token::create_cookie_token(record.id, &state.config.session)
        .expect("test cookie signing should not fail");

    format!("{}={}", state.config.session.cookie_name, cookie_token)
}
