//! Ambient credential acquisition for the firewall API.
//!
//! Tokens come from the environment when present, otherwise from the GCE
//! metadata server, which is the normal path when running inside the
//! provider's network.

use async_trait::async_trait;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(test)]
use mockall::automock;

use crate::error::{Error, Result};

/// Environment variable checked before falling back to the metadata server.
pub const TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR_VALUE: &str = "Google";
const METADATA_TIMEOUT_SECS: u64 = 3;

/// Bearer token for the firewall API.
///
/// Securely wipes its memory when dropped and never appears in debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(\"[REDACTED]\")")
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// Source of bearer tokens for the firewall API.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken>;
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// Default chain: `$GOOGLE_OAUTH_ACCESS_TOKEN`, then the metadata server.
pub struct DefaultTokenProvider {
    client: reqwest::Client,
}

impl DefaultTokenProvider {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(METADATA_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    async fn metadata_token(&self) -> Result<AccessToken> {
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Credentials(format!(
                "metadata server answered HTTP {}",
                response.status()
            )));
        }
        let token: MetadataTokenResponse = response.json().await?;
        Ok(AccessToken::new(token.access_token))
    }
}

#[async_trait]
impl TokenProvider for DefaultTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        if let Ok(token) = env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                debug!("using access token from ${}", TOKEN_ENV_VAR);
                return Ok(AccessToken::new(token));
            }
        }

        debug!("requesting access token from the metadata server");
        self.metadata_token().await.map_err(|e| {
            Error::Credentials(format!(
                "no token in ${} and the metadata server is unreachable: {}",
                TOKEN_ENV_VAR, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_is_redacted() {
        let token = AccessToken::from("ya29.super-secret");
        let debugged = format!("{:?}", token);
        assert!(!debugged.contains("super-secret"));
        assert!(debugged.contains("REDACTED"));
    }

    #[test]
    fn test_as_str_round_trip() {
        let token = AccessToken::new("abc123".to_string());
        assert_eq!(token.as_str(), "abc123");
        assert!(!token.is_empty());
        assert!(AccessToken::new(String::new()).is_empty());
    }

    #[test]
    fn test_clone_keeps_value() {
        let token = AccessToken::from("tok");
        let cloned = token.clone();
        drop(token);
        assert_eq!(cloned.as_str(), "tok");
    }

    #[tokio::test]
    async fn test_env_var_takes_precedence() {
        env::set_var(TOKEN_ENV_VAR, "env-token");
        let provider = DefaultTokenProvider::new().unwrap();
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.as_str(), "env-token");
        env::remove_var(TOKEN_ENV_VAR);
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let mut provider = MockTokenProvider::new();
        provider
            .expect_access_token()
            .times(1)
            .returning(|| Ok(AccessToken::from("mock-token")));

        let token = provider.access_token().await.unwrap();
        assert_eq!(token.as_str(), "mock-token");
    }
}
