use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use crate::config::SpeechConfig;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

static STAGED: OnceCell<StagedCredentials> = OnceCell::const_new();

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credentials are not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Credentials file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Credentials are not a service account key: {0}")]
    InvalidKey(#[from] serde_json::Error),
    #[error("Could not sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token endpoint returned {status}: {body}")]
    TokenExchange { status: u16, body: String },
}

/// Fields of a Google service account key that the token exchange needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_json(json: &[u8]) -> Result<Self, CredentialError> {
        Ok(serde_json::from_slice(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }
}

/// Service account JSON decoded from the environment and written to disk.
///
/// The temporary file lives as long as this value.
#[derive(Debug)]
pub struct StagedCredentials {
    path: TempPath,
}

impl StagedCredentials {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decode base64 service account JSON and write it to a private temp file.
pub fn stage_base64(encoded: &str) -> Result<StagedCredentials, CredentialError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let json = general_purpose::STANDARD.decode(compact)?;
    ServiceAccountKey::from_json(&json)?;

    let mut file = tempfile::Builder::new()
        .prefix("lingolens-gcp-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(&json)?;
    file.flush()?;

    Ok(StagedCredentials {
        path: file.into_temp_path(),
    })
}

/// Process-wide staging. The first caller decodes and writes the file;
/// everyone after gets the same path.
pub async fn staged_once(encoded: &str) -> Result<&'static StagedCredentials, CredentialError> {
    STAGED
        .get_or_try_init(|| async {
            let staged = stage_base64(encoded)?;
            info!("Staged service account credentials at {}", staged.path().display());
            Ok(staged)
        })
        .await
}

/// Delete the staged key file, if any.
///
/// The staged value lives in a static and is never dropped, so the server
/// calls this once it stops serving.
pub fn remove_staged() -> Result<(), CredentialError> {
    let Some(staged) = STAGED.get() else {
        return Ok(());
    };
    match std::fs::remove_file(staged.path()) {
        Ok(()) => {
            info!("Removed staged credentials at {}", staged.path().display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Where the service account key should be read from, staging it first when
/// it was injected as base64.
pub async fn resolve_credentials_path(
    config: &SpeechConfig,
) -> Result<Option<PathBuf>, CredentialError> {
    if let Some(encoded) = config.credentials_base64.as_deref().filter(|v| !v.trim().is_empty()) {
        let staged = staged_once(encoded).await?;
        return Ok(Some(staged.path().to_path_buf()));
    }
    Ok(config
        .credentials_path
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from))
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// OAuth2 bearer tokens minted from a service account key (JWT bearer grant).
pub struct ServiceAccountTokenSource {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token_uri: String,
    current: Mutex<Option<AccessToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(
        client: Client,
        key: ServiceAccountKey,
        default_token_uri: &str,
    ) -> Result<Self, CredentialError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let token_uri = key
            .token_uri
            .clone()
            .unwrap_or_else(|| default_token_uri.to_string());
        Ok(Self {
            client,
            key,
            encoding_key,
            token_uri,
            current: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn access_token(&self) -> Result<String, CredentialError> {
        let mut current = self.current.lock().await;
        let now = Utc::now();
        if let Some(token) = current.as_ref() {
            if token.expires_at - ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now {
                return Ok(token.token.clone());
            }
        }

        let token = self.exchange(now).await?;
        let value = token.token.clone();
        *current = Some(token);
        Ok(value)
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, CredentialError> {
        let iat = now.timestamp();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<AccessToken, CredentialError> {
        let assertion = self.signed_assertion(now)?;
        debug!("Requesting access token for {}", self.key.client_email);

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        Ok(AccessToken {
            token: token.access_token,
            expires_at: now + ChronoDuration::seconds(lifetime),
        })
    }
}
