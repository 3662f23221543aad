//! Common test utilities for E2E tests

use std::path::PathBuf;
use std::sync::Arc;

use axum::async_trait;
use chrono::{Duration, Utc};
use gatehouse::auth::provider::{IdentityClaim, IdentityProvider};
use gatehouse::auth::session::{Session, create_session_token};
use gatehouse::error::AppError;
use gatehouse::{AppState, build_router, config};
use tokio::net::TcpListener;

pub const PRIMARY_KEY: &str = "primary-test-cookie-key-32-bytes";
pub const SECONDARY_KEY: &str = "secondary-test-cookie-key-32-by!";

/// Authorization code the fake provider accepts
pub const GOOD_CODE: &str = "good-code";

/// Fake identity provider
///
/// Accepts exactly one authorization code and fails every other
/// exchange, without any network traffic.
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "https://accounts.google.com/o/oauth2/v2/auth?client_id=test-client-id&scope=email&state={state}"
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<IdentityClaim, AppError> {
        if code == GOOD_CODE {
            Ok(IdentityClaim {
                subject: "test-subject-1234".to_string(),
                email: Some("testuser@example.com".to_string()),
            })
        } else {
            Err(AppError::Provider("exchange rejected".to_string()))
        }
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance with the fake provider
    pub async fn new() -> Self {
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "https".to_string(),
            },
            tls: config::TlsConfig {
                cert_path: PathBuf::from("cert.pem"),
                key_path: PathBuf::from("key.pem"),
            },
            auth: config::AuthConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                cookie_key_primary: PRIMARY_KEY.to_string(),
                cookie_key_secondary: SECONDARY_KEY.to_string(),
                session_max_age: 86_400,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::with_provider(config, Arc::new(FakeProvider));

        // No redirects: the assertions inspect Location headers
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port; tests run plain HTTP, TLS terminates
        // only in the binary
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a valid session token signed with the given key
    pub fn session_token(&self, key: &str) -> String {
        let session = Session::for_claim(
            IdentityClaim {
                subject: "test-subject-1234".to_string(),
                email: Some("testuser@example.com".to_string()),
            },
            self.state.config.auth.session_max_age,
        );

        create_session_token(&session, key).expect("failed to create test token")
    }

    /// Create a session token that expired an hour ago
    pub fn expired_session_token(&self) -> String {
        let now = Utc::now();
        let session = Session {
            subject: "test-subject-1234".to_string(),
            email: Some("testuser@example.com".to_string()),
            created_at: now - Duration::hours(25),
            expires_at: now - Duration::hours(1),
        };

        create_session_token(&session, PRIMARY_KEY).expect("failed to create test token")
    }
}

/// Pull a cookie value out of a response's Set-Cookie headers
pub fn set_cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| {
            let (cookie, _) = header.split_once(';').unwrap_or((header, ""));
            let (cookie_name, value) = cookie.split_once('=')?;
            (cookie_name == name).then(|| value.to_string())
        })
}
