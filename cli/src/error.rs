//! Error types and result aliases for mdeoff.
//!
//! Every failure in the console is captured as a [`ConsoleError`] whose
//! `Display` output is the message shown to the user. Nothing is retried
//! automatically; callers decide what to do with the message.

use thiserror::Error;

/// Main error type for mdeoff operations.
///
/// Variants are grouped by origin: authentication, transport, API contract,
/// directory lookups, and local concerns (config, IO, export).
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// An operation needs a bearer token but the session is not signed in.
    #[error("Not authenticated. Run 'login' (or re-run the command) to sign in.")]
    NotAuthenticated,

    /// The user closed or aborted the interactive sign-in.
    #[error("Authentication was cancelled.")]
    AuthenticationCancelled,

    /// The identity provider reported an error on the redirect.
    #[error("Authentication failed: {0}")]
    AuthorizationDenied(String),

    /// The redirect carried neither an error nor a code.
    #[error("Authentication failed: no authorization code received.")]
    MissingAuthorizationCode,

    /// The `state` returned on the redirect does not match the one we sent.
    #[error("Authentication failed: state mismatch on the authorization callback.")]
    StateMismatch,

    /// The redirect URL could not be understood.
    #[error("Authentication failed: invalid callback URL ({0}).")]
    InvalidCallback(String),

    /// The token endpoint rejected the code or returned an unusable body.
    #[error("Authentication failed: {0}")]
    TokenExchange(String),

    /// API returned a non-success status code.
    #[error("API request failed ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API, or a generic description.
        message: String,
    },

    /// The API answered 200 but the body did not have the expected shape.
    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    /// The device id is not part of the loaded device list.
    #[error("Device '{0}' not found in loaded devices.")]
    DeviceNotFound(String),

    /// The API host could not be reached.
    #[error("Defender API is unavailable. Check your network connection or try again later.")]
    ApiUnavailable,

    /// Request timed out.
    #[error("Request timed out. The server may be slow or unreachable.")]
    Timeout,

    /// Network error during HTTP request.
    #[error("Network error: {0}. Check your internet connection.")]
    Network(String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or TOML serialization/deserialization failed.
    #[error("Data serialization error: {0}")]
    Serialization(String),

    /// Writing the CSV export failed.
    #[error("CSV export failed: {0}")]
    Export(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ConsoleError {
    /// Checks if this error can be resolved by signing in again.
    ///
    /// Tokens are never refreshed, so an expired token surfaces as a 401
    /// and the only recovery is a fresh `login`.
    #[must_use]
    pub const fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::ApiError { status: 401, .. }
        )
    }

    /// Checks if this error came out of the sign-in flow.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationCancelled
                | Self::AuthorizationDenied(_)
                | Self::MissingAuthorizationCode
                | Self::StateMismatch
                | Self::InvalidCallback(_)
                | Self::TokenExchange(_)
        )
    }
}

/// Result type alias using [`ConsoleError`].
pub type Result<T> = std::result::Result<T, ConsoleError>;

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for ConsoleError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for ConsoleError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::ApiUnavailable
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for ConsoleError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Self::Network(e.to_string()),
        }
    }
}
