//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub tls: TlsConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public domain, including port if non-standard
    /// (e.g., "localhost:3000")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL the provider redirects back to
    ///
    /// # Returns
    /// Full URL like "https://localhost:3000"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// TLS listener configuration
///
/// Both files must exist at startup; the server refuses to
/// start without them.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to PEM-encoded certificate
    pub cert_path: PathBuf,
    /// Path to PEM-encoded private key
    pub key_path: PathBuf,
}

/// Authentication configuration (Google OAuth + session cookies)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// OAuth client ID issued by the provider
    pub client_id: String,
    /// OAuth client secret issued by the provider
    pub client_secret: String,
    /// Primary cookie signing key; all new sessions sign with this
    pub cookie_key_primary: String,
    /// Secondary cookie signing key, accepted during verification
    /// only. Rotation: move the old primary here, sign with the new.
    pub cookie_key_secondary: String,
    /// Session max age in seconds (default: 86400 = 24h)
    pub session_max_age: i64,
}

impl AuthConfig {
    /// Signing keys in verification order, primary first
    pub fn cookie_keys(&self) -> [&str; 2] {
        [&self.cookie_key_primary, &self.cookie_key_secondary]
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (GATEHOUSE_*)
    /// 5. Bare provider/cookie variables (CLIENT_ID, CLIENT_SECRET,
    ///    COOKIE_KEY_1, COOKIE_KEY_2)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.domain", "localhost:3000")?
            .set_default("server.protocol", "https")?
            .set_default("tls.cert_path", "cert.pem")?
            .set_default("tls.key_path", "key.pem")?
            .set_default("auth.client_id", "")?
            .set_default("auth.client_secret", "")?
            .set_default("auth.cookie_key_primary", "")?
            .set_default("auth.cookie_key_secondary", "")?
            .set_default("auth.session_max_age", 86400)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (GATEHOUSE_*)
            .add_source(
                Environment::with_prefix("GATEHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let mut app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.apply_bare_env_overrides();
        app_config.validate()?;
        Ok(app_config)
    }

    /// Apply the conventional unprefixed environment variables
    ///
    /// These take precedence over everything else so that deploy
    /// environments carrying only the four standard variables work
    /// without a config file.
    fn apply_bare_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("CLIENT_ID") {
            self.auth.client_id = value;
        }
        if let Ok(value) = std::env::var("CLIENT_SECRET") {
            self.auth.client_secret = value;
        }
        if let Ok(value) = std::env::var("COOKIE_KEY_1") {
            self.auth.cookie_key_primary = value;
        }
        if let Ok(value) = std::env::var("COOKIE_KEY_2") {
            self.auth.cookie_key_secondary = value;
        }
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
    }

    /// Validate loaded configuration
    ///
    /// Only structural problems are fatal; missing credentials are
    /// reported by [`AppConfig::log_startup_warnings`] instead.
    fn validate(&self) -> Result<(), crate::error::AppError> {
        // One year: chrono duration arithmetic overflows long before
        // this, and nothing legitimate keeps a session that long.
        const MAX_SESSION_MAX_AGE_SECONDS: i64 = 31_536_000;

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.auth.session_max_age > MAX_SESSION_MAX_AGE_SECONDS {
            return Err(crate::error::AppError::Config(format!(
                "auth.session_max_age must be at most {} seconds",
                MAX_SESSION_MAX_AGE_SECONDS
            )));
        }

        Ok(())
    }

    /// Log warnings for a misconfigured-but-running server
    ///
    /// Missing provider credentials or cookie keys are not fatal:
    /// the server starts and every sign-in attempt lands on the
    /// failure route. Called after the tracing subscriber is up.
    pub fn log_startup_warnings(&self) {
        const MIN_COOKIE_KEY_BYTES: usize = 32;

        if self.auth.client_id.is_empty() || self.auth.client_secret.is_empty() {
            tracing::warn!(
                "CLIENT_ID/CLIENT_SECRET not set; provider sign-in will fail"
            );
        }

        for (name, key) in [
            ("COOKIE_KEY_1", &self.auth.cookie_key_primary),
            ("COOKIE_KEY_2", &self.auth.cookie_key_secondary),
        ] {
            if key.is_empty() {
                tracing::warn!(key = name, "cookie signing key not set");
            } else if key.as_bytes().len() < MIN_COOKIE_KEY_BYTES {
                tracing::warn!(
                    key = name,
                    "cookie signing key is shorter than {} bytes",
                    MIN_COOKIE_KEY_BYTES
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                domain: "localhost:3000".to_string(),
                protocol: "https".to_string(),
            },
            tls: TlsConfig {
                cert_path: PathBuf::from("cert.pem"),
                key_path: PathBuf::from("key.pem"),
            },
            auth: AuthConfig {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                cookie_key_primary: "k".repeat(32),
                cookie_key_secondary: "j".repeat(32),
                session_max_age: 86_400,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_complete_config() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert!(config.should_use_secure_cookies());
    }

    #[test]
    fn validate_rejects_non_positive_session_max_age() {
        let mut config = valid_config();
        config.auth.session_max_age = 0;

        let error = config
            .validate()
            .expect_err("zero session max age must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.session_max_age")
        ));
    }

    #[test]
    fn validate_rejects_oversized_session_max_age() {
        let mut config = valid_config();
        config.auth.session_max_age = i64::MAX;

        let error = config
            .validate()
            .expect_err("absurd session max age must fail before it can overflow");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("at most")
        ));
    }

    #[test]
    fn validate_tolerates_missing_credentials() {
        let mut config = valid_config();
        config.auth.client_id.clear();
        config.auth.client_secret.clear();

        // Misconfigured but running: sign-in fails later, startup does not.
        assert!(config.validate().is_ok());
        config.log_startup_warnings();
    }

    #[test]
    fn base_url_includes_domain_port() {
        let config = valid_config();
        assert_eq!(config.server.base_url(), "https://localhost:3000");
    }

    #[test]
    fn cookie_keys_lists_primary_first() {
        let config = valid_config();
        let keys = config.auth.cookie_keys();
        assert_eq!(keys[0], config.auth.cookie_key_primary);
        assert_eq!(keys[1], config.auth.cookie_key_secondary);
    }
}
