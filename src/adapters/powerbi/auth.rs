//! Azure AD client-credentials authentication
//!
//! One token provider serves both resource scopes this crate talks to:
//! the Power BI REST API for exports and Microsoft Graph for the
//! notification mail. Tokens are fetched per run; no refresh logic is
//! needed for a batch job that finishes well inside a token's lifetime.

use crate::adapters::powerbi::models::TokenResponse;
use crate::config::{PowerBiConfig, SecretString};
use crate::domain::{PowerBiError, Result};
use secrecy::ExposeSecret;

/// Scope for the Power BI REST API
pub const POWERBI_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";

/// Scope for Microsoft Graph (mail notification)
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// A bearer token for one resource scope
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    /// Returns the raw token for use in an Authorization header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of Debug output.
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[cfg(test)]
impl AccessToken {
    /// Construct a token directly, bypassing the endpoint (tests only)
    pub(crate) fn for_tests(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// OAuth2 client-credentials token provider
pub struct TokenProvider {
    http: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
}

impl TokenProvider {
    /// Create a token provider from the service configuration, sharing the
    /// caller's HTTP client (and thereby its connection pool).
    pub fn new(config: &PowerBiConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            authority_host: config.authority_host.clone(),
            tenant_id: config.tenant_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Fetch an access token for the given scope
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the token endpoint rejects the
    /// credentials, and a connection error when it cannot be reached.
    pub async fn fetch(&self, scope: &str) -> Result<AccessToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        );

        tracing::debug!(scope = %scope, "Requesting access token");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret().as_ref()),
                ("scope", scope),
            ])
            .send()
            .await
            .map_err(|e| PowerBiError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PowerBiError::AuthenticationFailed(format!(
                "token endpoint returned {status}: {body}"
            ))
            .into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PowerBiError::InvalidResponse(format!("token response: {e}")))?;

        tracing::info!(scope = %scope, "Access token acquired");

        Ok(AccessToken(token.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::EaselError;

    fn config_for(server_url: &str) -> PowerBiConfig {
        PowerBiConfig {
            tenant_id: "tenant-1".to_string(),
            client_id: "client-1".to_string(),
            client_secret: secret_string("secret-1".to_string()),
            workspace_id: "ws-1".to_string(),
            report_id: "rpt-1".to_string(),
            api_base_url: server_url.to_string(),
            authority_host: server_url.to_string(),
            timeout_seconds: 5,
            poll_interval_seconds: 1,
            max_poll_attempts: 3,
            filter_table: "scd_Measure".to_string(),
            filter_column: "Measure_ID".to_string(),
        }
    }

    #[test]
    fn test_access_token_debug_redacted() {
        let token = AccessToken("very-secret".to_string());
        assert!(!format!("{token:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn test_fetch_token_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok-123","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;

        let provider = TokenProvider::new(&config_for(&server.url()), reqwest::Client::new());
        let token = provider.fetch(POWERBI_SCOPE).await.unwrap();

        assert_eq!(token.as_str(), "tok-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_token_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock1 = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;

        let provider = TokenProvider::new(&config_for(&server.url()), reqwest::Client::new());
        let result = provider.fetch(POWERBI_SCOPE).await;

        match result {
            Err(EaselError::PowerBi(PowerBiError::AuthenticationFailed(msg))) => {
                assert!(msg.contains("invalid_client"));
            }
            other => panic!("expected authentication failure, got {other:?}"),
        }
    }
}
