//! Server configuration from environment variables.

use std::env;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_allowed_origins: String,
    /// PEM-encoded Ed25519 public key for validating session tokens.
    pub jwt_public_key: String,
    /// Accept the `X-User-Id` header instead of a token (dev only).
    pub allow_dev_identity: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `PORT`: Server port (default: 3000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    /// - `CORS_ALLOWED_ORIGINS`: Allowed CORS origins (default: "*")
    /// - `JWT_PUBLIC_KEY`: PEM public key for token validation
    /// - `ALLOW_DEV_IDENTITY`: Accept `X-User-Id` header (default: false)
    ///
    /// `JWT_PUBLIC_KEY` may be empty only when `ALLOW_DEV_IDENTITY` is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let cors_allowed_origins =
            env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());

        let jwt_public_key = env::var("JWT_PUBLIC_KEY").unwrap_or_default();

        let allow_dev_identity = env::var("ALLOW_DEV_IDENTITY")
            .ok()
            .map(|s| s == "1" || s.to_lowercase() == "true")
            .unwrap_or(false);

        if jwt_public_key.is_empty() && !allow_dev_identity {
            return Err(ConfigError::MissingEnvVar("JWT_PUBLIC_KEY".to_string()));
        }

        Ok(Self {
            port,
            log_level,
            cors_allowed_origins,
            jwt_public_key,
            allow_dev_identity,
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_addr_uses_port() {
        let config = ServerConfig {
            port: 8080,
            log_level: "info".into(),
            cors_allowed_origins: "*".into(),
            jwt_public_key: String::new(),
            allow_dev_identity: true,
        };
        assert_eq!(config.socket_addr().port(), 8080);
    }
}
