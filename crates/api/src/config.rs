//! Application configuration

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Binding store
    pub store_retry_attempts: usize,
    pub store_timeout_ms: u64,

    // Administrative area
    pub backend_uri: String, // e.g., "/backend", matched as a literal substring of the URL
    pub operator_jwt_secret: String,

    // Multisite
    pub operator_themes: bool,
    pub partials_path: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Binding store
            store_retry_attempts: env::var("STORE_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),

            // Administrative area
            backend_uri: {
                let uri = env::var("BACKEND_URI").unwrap_or_else(|_| "/backend".to_string());
                if !uri.starts_with('/') || uri.len() < 2 {
                    return Err(ConfigError::InvalidBackendUri(uri));
                }
                uri
            },
            operator_jwt_secret: {
                let secret = env::var("OPERATOR_JWT_SECRET")
                    .map_err(|_| ConfigError::Missing("OPERATOR_JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "OPERATOR_JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },

            // Multisite
            operator_themes: env::var("MULTISITE_OPERATOR_THEMES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            partials_path: env::var("MULTISITE_PARTIALS_PATH")
                .unwrap_or_else(|_| "$/keios/multisite/partials/".to_string()),
        })
    }

    /// Timeout applied to a single binding store fetch
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("BACKEND_URI must be an absolute path prefix, got {0:?}")]
    InvalidBackendUri(String),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to set required env vars for testing
    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var(
            "OPERATOR_JWT_SECRET",
            "test-operator-secret-must-be-32-characters",
        );
        env::remove_var("BACKEND_URI");
        env::remove_var("MULTISITE_OPERATOR_THEMES");
    }

    /// Helper to clear env vars after tests
    fn cleanup_config() {
        env::remove_var("DATABASE_URL");
        env::remove_var("OPERATOR_JWT_SECRET");
        env::remove_var("BACKEND_URI");
        env::remove_var("MULTISITE_OPERATOR_THEMES");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.backend_uri, "/backend");
        assert!(!config.operator_themes);
        assert_eq!(config.partials_path, "$/keios/multisite/partials/");
        assert_eq!(config.store_timeout(), Duration::from_millis(2000));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_missing_database_url() {
        setup_minimal_config();
        env::remove_var("DATABASE_URL");

        match Config::from_env() {
            Err(ConfigError::Missing("DATABASE_URL")) => {}
            other => panic!("Expected Missing error for DATABASE_URL, got: {:?}", other),
        }

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_weak_operator_secret_rejected() {
        setup_minimal_config();
        env::set_var("OPERATOR_JWT_SECRET", "short");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::WeakSecret(_))
        ));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_backend_uri_validation() {
        setup_minimal_config();

        env::set_var("BACKEND_URI", "admin");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidBackendUri(_))
        ));

        env::set_var("BACKEND_URI", "/admin");
        let config = Config::from_env().unwrap();
        assert_eq!(config.backend_uri, "/admin");

        cleanup_config();
    }
}
