//! Credential resolution
//!
//! Turns a static access token or a GitHub App identity into the bearer
//! token used for status calls. App identities sign a short-lived JWT with
//! the app's private key and exchange it for an installation token.
//! See: https://docs.github.com/en/apps/creating-github-apps/authenticating-with-a-github-app

use chrono::Utc;
use ghstatus_core::dto::token::{AppClaims, InstallationToken};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};

use crate::endpoints::ApiEndpoints;
use crate::error::{ClientError, Result};
use crate::{GITHUB_ACCEPT, GITHUB_API_VERSION};

/// GitHub allows app JWTs to live at most ten minutes.
const JWT_LIFETIME_SECS: i64 = 600;
const JWT_BACKDATE_SECS: i64 = 60;

/// Identity of a GitHub App installation
pub struct AppIdentity {
    pub app_id: u64,
    pub installation_id: u64,
    /// PEM encoded RSA private key of the app
    pub private_key: SecretString,
}

/// Credentials for the GitHub API
pub enum Credentials {
    /// Personal access token or any other ready-to-use bearer token
    Token(SecretString),
    /// GitHub App installation, exchanged for a token on every resolve
    App(AppIdentity),
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token(SecretString::from(token.into()))
    }

    pub fn app(app_id: u64, installation_id: u64, private_key: impl Into<String>) -> Self {
        Credentials::App(AppIdentity {
            app_id,
            installation_id,
            private_key: SecretString::from(private_key.into()),
        })
    }

    /// Produce a bearer token
    ///
    /// Plain tokens are returned as-is without a network call. App identities
    /// call the token endpoint of `endpoints` through `client`.
    pub async fn resolve(&self, endpoints: &ApiEndpoints, client: &Client) -> Result<SecretString> {
        match self {
            Credentials::Token(token) => Ok(SecretString::from(token.expose_secret())),
            Credentials::App(identity) => identity.installation_token(endpoints, client).await,
        }
    }
}

impl AppIdentity {
    /// Sign the app JWT
    fn sign_jwt(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AppClaims {
            iat: now - JWT_BACKDATE_SECS,
            exp: now + JWT_LIFETIME_SECS,
            iss: self.app_id.to_string(),
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
            .map_err(|e| ClientError::AuthFailed(format!("Invalid app private key: {}", e)))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| ClientError::AuthFailed(format!("Failed to sign app JWT: {}", e)))
    }

    /// Exchange the app identity for an installation access token
    async fn installation_token(
        &self,
        endpoints: &ApiEndpoints,
        client: &Client,
    ) -> Result<SecretString> {
        let jwt = self.sign_jwt()?;
        let installation_id = self.installation_id.to_string();
        let url = endpoints.rest_url(&["app", "installations", &installation_id, "access_tokens"])?;

        tracing::debug!(
            "Requesting installation token for app {} (installation {})",
            self.app_id,
            self.installation_id
        );

        let exchange = async {
            let response = client
                .post(url)
                .header(ACCEPT, GITHUB_ACCEPT)
                .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
                .bearer_auth(jwt)
                .send()
                .await?;
            crate::handle_response::<InstallationToken>(response).await
        };

        let token = exchange.await.map_err(|e| {
            ClientError::AuthFailed(format!(
                "Installation token exchange failed for installation {}: {}",
                self.installation_id, e
            ))
        })?;

        if token.token.is_empty() {
            return Err(ClientError::AuthFailed(format!(
                "GitHub returned no token for installation {}",
                self.installation_id
            )));
        }

        Ok(SecretString::from(token.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_APP_KEY: &str = include_str!("../tests/fixtures/test-app-key.pem");

    fn endpoints_for(server: &MockServer) -> ApiEndpoints {
        ApiEndpoints::from_base_url(&server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_token_passes_through_without_network() {
        let endpoints = ApiEndpoints::from_base_url("https://github.com").unwrap();
        let token = Credentials::token("ghp_plain")
            .resolve(&endpoints, &Client::new())
            .await
            .unwrap();

        assert_eq!(token.expose_secret(), "ghp_plain");
    }

    #[tokio::test]
    async fn test_app_exchanges_installation_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/app/installations/99/access_tokens"))
            .and(header_exists("authorization"))
            .and(header("accept", GITHUB_ACCEPT))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": "ghs_installation",
                "expires_at": "2030-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = Credentials::app(42, 99, TEST_APP_KEY)
            .resolve(&endpoints_for(&server), &Client::new())
            .await
            .unwrap();

        assert_eq!(token.expose_secret(), "ghs_installation");
    }

    #[test]
    fn test_app_jwt_is_rs256_with_app_issuer() {
        let identity = AppIdentity {
            app_id: 42,
            installation_id: 99,
            private_key: SecretString::from(TEST_APP_KEY),
        };
        let jwt = identity.sign_jwt().unwrap();

        let header = jsonwebtoken::decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);

        let mut validation = jsonwebtoken::Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        let claims = jsonwebtoken::decode::<AppClaims>(
            &jwt,
            &jsonwebtoken::DecodingKey::from_secret(&[]),
            &validation,
        )
        .unwrap()
        .claims;
        assert_eq!(claims.iss, "42");
        assert_eq!(claims.exp - claims.iat, JWT_LIFETIME_SECS + JWT_BACKDATE_SECS);
    }

    #[tokio::test]
    async fn test_invalid_private_key_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let result = Credentials::app(42, 99, "not a pem")
            .resolve(&endpoints_for(&server), &Client::new())
            .await;

        assert!(matches!(result, Err(ClientError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn test_rejected_exchange_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/app/installations/99/access_tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let result = Credentials::app(42, 99, TEST_APP_KEY)
            .resolve(&endpoints_for(&server), &Client::new())
            .await;

        match result {
            Err(ClientError::AuthFailed(message)) => assert!(message.contains("Bad credentials")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("exchange should fail"),
        }
    }

    #[tokio::test]
    async fn test_empty_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/app/installations/99/access_tokens"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "" })))
            .mount(&server)
            .await;

        let result = Credentials::app(42, 99, TEST_APP_KEY)
            .resolve(&endpoints_for(&server), &Client::new())
            .await;

        assert!(matches!(result, Err(ClientError::AuthFailed(_))));
    }
}
