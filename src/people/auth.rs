use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CleanupError, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth credentials as persisted in the token file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl StoredToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|exp| exp - Duration::seconds(EXPIRY_SKEW_SECS) <= now)
    }
}

/// Reads, refreshes and rewrites the token file.
pub struct TokenStore {
    path: PathBuf,
    http: reqwest::Client,
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            http: reqwest::Client::new(),
        }
    }

    pub fn load(&self) -> Result<StoredToken> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            CleanupError::Auth(format!(
                "cannot read token file {}: {} (authorize the application first)",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            CleanupError::Auth(format!("invalid token file {}: {}", self.path.display(), e))
        })
    }

    pub fn save(&self, token: &StoredToken) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }

    /// Return a usable access token, refreshing and persisting it when expired.
    pub async fn access_token(&self) -> Result<String> {
        let mut token = self.load()?;
        if !token.is_expired(Utc::now()) {
            return Ok(token.access_token);
        }

        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            CleanupError::Auth("access token expired and no refresh token is stored".to_string())
        })?;

        info!("Access token expired, refreshing");
        let response = self
            .http
            .post(&token.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CleanupError::Auth(format!("token refresh returned {}: {}", status, body)));
        }

        let refreshed: RefreshResponse = response.json().await?;
        token.access_token = refreshed.access_token;
        token.expires_at = refreshed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        self.save(&token)?;

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_at: Option<DateTime<Utc>>, refresh: Option<&str>) -> StoredToken {
        StoredToken {
            access_token: "ya29.current".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at,
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }

    #[test]
    fn test_expiry_uses_skew() {
        let now = Utc::now();
        assert!(!token(None, None).is_expired(now));
        assert!(!token(Some(now + Duration::hours(1)), None).is_expired(now));
        assert!(token(Some(now + Duration::seconds(30)), None).is_expired(now));
        assert!(token(Some(now - Duration::hours(1)), None).is_expired(now));
    }

    #[tokio::test]
    async fn test_valid_token_is_returned_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&token(Some(Utc::now() + Duration::hours(1)), None))
            .unwrap();

        assert_eq!(store.access_token().await.unwrap(), "ya29.current");
    }

    #[tokio::test]
    async fn test_expired_token_without_refresh_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&token(Some(Utc::now() - Duration::hours(1)), None))
            .unwrap();

        assert!(matches!(store.access_token().await, Err(CleanupError::Auth(_))));
    }

    #[tokio::test]
    async fn test_missing_token_file_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.access_token().await, Err(CleanupError::Auth(_))));
    }
}
