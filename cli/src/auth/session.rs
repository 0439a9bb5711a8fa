//! Sign-in session holding the bearer token for the Defender API.

use chrono::{DateTime, Utc};
use oauth2::AccessToken;

use crate::auth::prompt::AuthorizationPrompt;
use crate::auth::provider::{authorization_request, build_client, exchange_code, parse_callback};
use crate::config::AuthConfig;
use crate::error::{ConsoleError, Result};

/// Where the session stands in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Signed out, or the last attempt failed (see [`AuthSession::error`]).
    Idle,
    /// Waiting for the user or the token endpoint.
    Authenticating,
    /// A bearer token is available.
    Authenticated,
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "signed out"),
            Self::Authenticating => write!(f, "signing in"),
            Self::Authenticated => write!(f, "signed in"),
        }
    }
}

/// OAuth2 authorization-code session against one tenant.
///
/// The token lives only in memory. It is never refreshed or persisted;
/// when it expires the API starts answering 401 and the user signs in again.
pub struct AuthSession {
    config: AuthConfig,
    state: AuthState,
    token: Option<AccessToken>,
    error: Option<String>,
    authenticated_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    #[must_use]
    pub const fn new(config: AuthConfig) -> Self {
        Self {
            config,
            state: AuthState::Idle,
            token: None,
            error: None,
            authenticated_at: None,
        }
    }

    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Message of the last failed sign-in, cleared when a new one starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.secret().as_str())
    }

    /// The bearer token, or [`ConsoleError::NotAuthenticated`].
    pub fn require_token(&self) -> Result<&str> {
        self.access_token().ok_or(ConsoleError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub const fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.authenticated_at
    }

    /// Runs the authorization-code flow through `prompt`.
    ///
    /// Any previous token and error are discarded first. On failure the
    /// session returns to [`AuthState::Idle`] with the message available from
    /// [`error`](Self::error), and the same error is returned.
    pub async fn authenticate(&mut self, prompt: &dyn AuthorizationPrompt) -> Result<()> {
        self.token = None;
        self.authenticated_at = None;
        self.error = None;
        self.state = AuthState::Authenticating;
        tracing::info!(tenant = %self.config.tenant_id, "starting sign-in");

        match self.run_flow(prompt).await {
            Ok(token) => {
                self.token = Some(token);
                self.authenticated_at = Some(Utc::now());
                self.state = AuthState::Authenticated;
                tracing::info!("signed in");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "sign-in failed");
                self.error = Some(e.to_string());
                self.state = AuthState::Idle;
                Err(e)
            }
        }
    }

    async fn run_flow(&self, prompt: &dyn AuthorizationPrompt) -> Result<AccessToken> {
        let client = build_client(&self.config)?;
        let (authorization_url, csrf_state) = authorization_request(&client, &self.config);

        let callback = prompt.authorize(&authorization_url).await?;
        let code = parse_callback(&callback, csrf_state.secret())?;

        tracing::debug!("authorization code received, exchanging for token");
        exchange_code(&client, &self.config, code).await
    }

    /// Discards the token and returns to [`AuthState::Idle`].
    pub fn sign_out(&mut self) {
        self.token = None;
        self.authenticated_at = None;
        self.error = None;
        self.state = AuthState::Idle;
        tracing::info!("signed out");
    }
}
