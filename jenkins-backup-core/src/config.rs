//! Server connection settings and environment loading.
//!
//! Mirrors the environment variables the tool has always honored:
//! `JENKINS_SERVER`, `JENKINS_PORT`, `JENKINS_USERNAME`, `JENKINS_PASSWORD`
//! and `JENKINS_PASSWORD_BASE64` (for callers that keep the credential
//! encoded at rest).

use std::env;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::{BackupError, Result};

/// Default Jenkins HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Connection settings for one Jenkins server instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or address, without scheme
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// User name for basic auth; empty for anonymous access
    pub username: String,
    /// Password or API token for basic auth
    pub password: String,
}

impl ServerConfig {
    pub fn new<H, U, P>(host: H, username: U, password: P) -> Self
    where
        H: Into<String>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Load the full configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let host = env::var("JENKINS_SERVER")
            .map_err(|_| BackupError::config("JENKINS_SERVER is not set"))?;
        let port = match env::var("JENKINS_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| BackupError::config(format!("JENKINS_PORT is not a port: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };
        let username = env::var("JENKINS_USERNAME").unwrap_or_default();
        let password = env::var("JENKINS_PASSWORD").unwrap_or_default();

        let config = Self {
            host,
            port,
            username,
            password,
        }
        .resolve_password()?;
        config.validate()?;
        Ok(config)
    }

    /// Fall back to `JENKINS_PASSWORD_BASE64` when no plain password was
    /// given.
    pub fn resolve_password(mut self) -> Result<Self> {
        if self.password.is_empty() {
            if let Ok(encoded) = env::var("JENKINS_PASSWORD_BASE64") {
                self.password = decode_password(&encoded)?;
            }
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(BackupError::config("server host cannot be empty"));
        }
        if self.port == 0 {
            return Err(BackupError::config("server port cannot be zero"));
        }
        Ok(())
    }

    /// Base URL of the server's HTTP API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn decode_password(encoded: &str) -> Result<String> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| BackupError::config(format!("JENKINS_PASSWORD_BASE64 is not base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| BackupError::config(format!("decoded password is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new("jenkins.example.com", "admin", "secret");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url() {
        let config = ServerConfig::new("jenkins.example.com", "", "").with_port(9090);
        assert_eq!(config.base_url(), "http://jenkins.example.com:9090");
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let config = ServerConfig::new("", "admin", "secret");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let config = ServerConfig::new("jenkins.example.com", "admin", "secret").with_port(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decode_password() {
        assert_eq!(decode_password("c2VjcmV0").unwrap(), "secret");
        assert!(decode_password("not base64!!!").is_err());
    }
}
