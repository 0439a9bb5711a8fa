//! Application configuration settings.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Main configuration for mdeoff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Sign-in settings.
    pub auth: AuthConfig,
    /// Defender API client settings.
    pub api: ApiConfig,
}

/// Placeholder application (client) id.
/// Replace with the id of your Entra app registration, or set `MDE_CLIENT_ID`.
const DEFAULT_CLIENT_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Microsoft identity platform sign-in settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity provider base URL.
    #[serde(with = "url_serde")]
    pub authority: Url,
    /// Directory (tenant) id or one of `organizations` / `common`.
    pub tenant_id: String,
    /// Public client application id.
    pub client_id: String,
    /// Redirect URI registered for the application.
    #[serde(with = "url_serde")]
    pub redirect_uri: Url,
    /// Scopes requested on every sign-in.
    pub scopes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authority: Url::parse("https://login.microsoftonline.com")
                .expect("valid default URL"),
            tenant_id: "organizations".to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            redirect_uri: Url::parse("http://localhost:8400/callback").expect("valid default URL"),
            scopes: vec![
                "https://api.securitycenter.microsoft.com/Machine.Read.All".to_string(),
                "https://api.securitycenter.microsoft.com/Machine.ReadWrite.All".to_string(),
                "https://api.securitycenter.microsoft.com/Machine.Offboard".to_string(),
                "User.Read".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    /// `{authority}/{tenant}/oauth2/v2.0/authorize`
    pub fn authorize_endpoint(&self) -> Result<Url> {
        self.tenant_endpoint("authorize")
    }

    /// `{authority}/{tenant}/oauth2/v2.0/token`
    pub fn token_endpoint(&self) -> Result<Url> {
        self.tenant_endpoint("token")
    }

    fn tenant_endpoint(&self, leaf: &str) -> Result<Url> {
        let base = self.authority.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!(
            "{base}/{}/oauth2/v2.0/{leaf}",
            self.tenant_id
        ))?)
    }
}

/// Defender API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Defender for Endpoint API base URL.
    #[serde(with = "url_serde")]
    pub base_url: Url,
    /// Request timeout in seconds. Unset means the HTTP client default.
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://api.securitycenter.microsoft.com/api")
                .expect("valid default URL"),
            timeout_secs: None,
        }
    }
}

/// Custom serde module for URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const AUTHORITY: &str = "MDE_AUTHORITY";
    pub const TENANT_ID: &str = "MDE_TENANT_ID";
    pub const CLIENT_ID: &str = "MDE_CLIENT_ID";
    pub const API_URL: &str = "MDE_API_URL";
    pub const LOG_LEVEL: &str = "MDE_LOG";
}

impl ConsoleConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(env::AUTHORITY) {
            if let Ok(parsed) = Url::parse(&url) {
                self.auth.authority = parsed;
            }
        }

        if let Ok(tenant) = std::env::var(env::TENANT_ID) {
            if !tenant.trim().is_empty() {
                self.auth.tenant_id = tenant.trim().to_string();
            }
        }

        if let Ok(client_id) = std::env::var(env::CLIENT_ID) {
            if !client_id.trim().is_empty() {
                self.auth.client_id = client_id.trim().to_string();
            }
        }

        if let Ok(url) = std::env::var(env::API_URL) {
            if let Ok(parsed) = Url::parse(&url) {
                self.api.base_url = parsed;
            }
        }

        self
    }

    /// Whether the client id is still the shipped placeholder.
    #[must_use]
    pub fn uses_placeholder_client_id(&self) -> bool {
        self.auth.client_id == DEFAULT_CLIENT_ID
    }
}
