//! HTTP implementation of [`PassboltClient`] over the Passbolt REST API.
//!
//! Sessions are cookie based: the GPGAuth handshake leaves a session cookie
//! in the client's cookie store, which every later request carries.
//!
//! ## GPGAuth login
//! 1. `POST /auth/login.json` with the key fingerprint; the server answers
//!    with a challenge encrypted for that key in `X-GPGAuth-User-Auth-Token`
//! 2. `POST /auth/login.json` again with the decrypted challenge; the server
//!    confirms with `X-GPGAuth-Authenticated: true` and sets the cookie

use crate::api::{ApiResponse, Resource, ResourceType, Secret};
use crate::client::{PassboltClient, PassboltError};
use crate::gpg::Decryptor;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const HEADER_USER_AUTH_TOKEN: &str = "X-GPGAuth-User-Auth-Token";
const HEADER_AUTHENTICATED: &str = "X-GPGAuth-Authenticated";
const AUTH_TOKEN_PREFIX: &str = "gpgauthv1.3.0|";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct GpgAuthRequest<'a> {
    data: GpgAuthData<'a>,
}

#[derive(Debug, Serialize)]
struct GpgAuthData<'a> {
    gpg_auth: GpgAuthFields<'a>,
}

#[derive(Debug, Serialize)]
struct GpgAuthFields<'a> {
    keyid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_token_result: Option<&'a str>,
}

impl<'a> GpgAuthRequest<'a> {
    const fn new(keyid: &'a str, user_token_result: Option<&'a str>) -> Self {
        Self {
            data: GpgAuthData {
                gpg_auth: GpgAuthFields {
                    keyid,
                    user_token_result,
                },
            },
        }
    }
}

/// Passbolt REST client.
pub struct HttpPassboltClient {
    client: Client,
    base_url: String,
    decryptor: Arc<dyn Decryptor>,
}

impl std::fmt::Debug for HttpPassboltClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPassboltClient")
            .field("base_url", &self.base_url)
            .field("fingerprint", &self.decryptor.fingerprint())
            .finish_non_exhaustive()
    }
}

impl HttpPassboltClient {
    /// Create a client for the server at `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PassboltError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: &Url, decryptor: Arc<dyn Decryptor>) -> Result<Self, PassboltError> {
        Self::with_timeout(base_url, decryptor, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PassboltError::Network`] if the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: &Url,
        decryptor: Arc<dyn Decryptor>,
        timeout: Duration,
    ) -> Result<Self, PassboltError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("boltsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PassboltError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            decryptor,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_body<T: DeserializeOwned>(&self, path: &str) -> Result<T, PassboltError> {
        tracing::debug!(path, "Passbolt API request");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| PassboltError::Network(e.to_string()))?;

        let envelope: ApiResponse<T> = decode(response, path).await?;
        Ok(envelope.body)
    }

    async fn post_auth(&self, payload: &GpgAuthRequest<'_>) -> Result<Response, PassboltError> {
        let response = self
            .client
            .post(self.url("/auth/login.json"))
            .json(payload)
            .send()
            .await
            .map_err(|e| PassboltError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PassboltError::Auth(format!(
                "login request returned {}: {}",
                status.as_u16(),
                body.trim()
            )))
        }
    }
}

#[async_trait]
impl PassboltClient for HttpPassboltClient {
    async fn check_session(&self) -> bool {
        match self
            .get_body::<serde_json::Value>("/auth/is-authenticated.json")
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "No live Passbolt session");
                false
            }
        }
    }

    async fn login(&self) -> Result<(), PassboltError> {
        let fingerprint = self.decryptor.fingerprint();

        let challenge = self
            .post_auth(&GpgAuthRequest::new(fingerprint, None))
            .await?;
        let encrypted = header_value(challenge.headers(), HEADER_USER_AUTH_TOKEN).ok_or_else(
            || PassboltError::Auth(format!("server sent no {HEADER_USER_AUTH_TOKEN} header")),
        )?;

        let token = self
            .decryptor
            .decrypt(&unescape_auth_token(&encrypted))
            .await?;
        if !token.starts_with(AUTH_TOKEN_PREFIX) {
            return Err(PassboltError::Auth(
                "decrypted challenge is not a GPGAuth token".to_string(),
            ));
        }

        let confirmation = self
            .post_auth(&GpgAuthRequest::new(fingerprint, Some(token.as_str())))
            .await?;
        match header_value(confirmation.headers(), HEADER_AUTHENTICATED).as_deref() {
            Some("true") => {
                tracing::info!(server = %self.base_url, "Logged in to Passbolt");
                Ok(())
            }
            other => Err(PassboltError::Auth(format!(
                "server did not confirm authentication ({HEADER_AUTHENTICATED}: {})",
                other.unwrap_or("missing")
            ))),
        }
    }

    async fn logout(&self) -> Result<(), PassboltError> {
        let response = self
            .client
            .get(self.url("/auth/logout.json"))
            .send()
            .await
            .map_err(|e| PassboltError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            tracing::info!(server = %self.base_url, "Logged out of Passbolt");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, "/auth/logout.json", body))
        }
    }

    async fn get_resource(&self, resource_id: &str) -> Result<Resource, PassboltError> {
        let id = entity_id(resource_id)?;
        self.get_body(&format!("/resources/{id}.json")).await
    }

    async fn get_resources(&self) -> Result<Vec<Resource>, PassboltError> {
        self.get_body("/resources.json").await
    }

    async fn get_resource_type(&self, type_id: &str) -> Result<ResourceType, PassboltError> {
        let id = entity_id(type_id)?;
        self.get_body(&format!("/resource-types/{id}.json")).await
    }

    async fn decrypt_message(&self, message: &str) -> Result<String, PassboltError> {
        self.decryptor.decrypt(message).await
    }

    async fn get_secret(&self, resource_id: &str) -> Result<Secret, PassboltError> {
        let id = entity_id(resource_id)?;
        self.get_body(&format!("/secrets/resource/{id}.json")).await
    }
}

/// Passbolt entity IDs are UUIDs. Anything else cannot name an entity, so it
/// never reaches a request path.
fn entity_id(id: &str) -> Result<String, PassboltError> {
    Uuid::try_parse(id)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| PassboltError::NotFound(format!("'{id}' is not a Passbolt ID")))
}

/// Decode a response envelope, mapping failure statuses to errors.
async fn decode<T: DeserializeOwned>(
    response: Response,
    path: &str,
) -> Result<ApiResponse<T>, PassboltError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| PassboltError::Network(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        return Err(status_error(status, path, text));
    }

    serde_json::from_str(&text).map_err(|e| PassboltError::Parse(format!("{path}: {e}")))
}

fn status_error(status: StatusCode, path: &str, body: String) -> PassboltError {
    match status {
        StatusCode::UNAUTHORIZED => PassboltError::SessionExpired,
        StatusCode::FORBIDDEN => PassboltError::Forbidden(path.to_string()),
        StatusCode::NOT_FOUND => PassboltError::NotFound(path.to_string()),
        _ => PassboltError::Api {
            status: status.as_u16(),
            message: server_message(&body).unwrap_or(body),
        },
    }
}

/// Prefer the envelope's header message over the raw body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["header"]["message"]
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The server query-escapes the armored challenge and escapes spaces.
fn unescape_auth_token(raw: &str) -> String {
    let unescaped = url::form_urlencoded::parse(format!("t={raw}").as_bytes())
        .next()
        .map_or_else(|| raw.to_string(), |(_, v)| v.into_owned());
    unescaped.replace("\\ ", " ")
}
