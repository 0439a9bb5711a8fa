//! OAuth client setup for the Microsoft identity platform.

use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AccessToken, AuthUrl, AuthorizationCode, ClientId, CsrfToken, RedirectUrl, RequestTokenError,
    Scope, TokenResponse, TokenUrl,
};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{ConsoleError, Result};

/// Build an OAuth2 public client (no secret) for the configured tenant.
pub fn build_client(config: &AuthConfig) -> Result<BasicClient> {
    Ok(BasicClient::new(
        ClientId::new(config.client_id.clone()),
        None, // Public client: no client secret
        AuthUrl::from_url(config.authorize_endpoint()?),
        Some(TokenUrl::from_url(config.token_endpoint()?)),
    )
    .set_redirect_uri(RedirectUrl::from_url(config.redirect_uri.clone())))
}

/// Builds the authorization URL and the state nonce it carries.
///
/// The state is random per call.
pub fn authorization_request(client: &BasicClient, config: &AuthConfig) -> (Url, CsrfToken) {
    client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(config.scopes.iter().cloned().map(Scope::new))
        .add_extra_param("response_mode", "query")
        .add_extra_param("prompt", "select_account")
        .url()
}

/// Extracts the authorization code from the redirect URL.
///
/// Provider errors win over everything else; then the state must match the
/// one we issued (when the provider echoes it); then a code must be present.
pub fn parse_callback(callback: &Url, expected_state: &str) -> Result<AuthorizationCode> {
    let mut error = None;
    let mut description = None;
    let mut state = None;
    let mut code = None;

    for (key, value) in callback.query_pairs() {
        match key.as_ref() {
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "code" => code = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        tracing::debug!(%error, "identity provider returned an error");
        return Err(ConsoleError::AuthorizationDenied(
            description.unwrap_or_else(|| "unknown authorization error".to_string()),
        ));
    }

    if state.is_some_and(|s| s != expected_state) {
        return Err(ConsoleError::StateMismatch);
    }

    code.filter(|c| !c.is_empty())
        .map(AuthorizationCode::new)
        .ok_or(ConsoleError::MissingAuthorizationCode)
}

/// Exchanges an authorization code for an access token.
pub async fn exchange_code(
    client: &BasicClient,
    config: &AuthConfig,
    code: AuthorizationCode,
) -> Result<AccessToken> {
    let response: BasicTokenResponse = client
        .exchange_code(code)
        .add_extra_param("scope", config.scopes.join(" "))
        .request_async(async_http_client)
        .await
        .map_err(token_error)?;

    Ok(response.access_token().clone())
}

fn token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> ConsoleError
where
    RE: std::error::Error + 'static,
{
    let message = match err {
        RequestTokenError::ServerResponse(response) => response
            .error_description()
            .cloned()
            .unwrap_or_else(|| response.error().to_string()),
        RequestTokenError::Request(e) => format!("token request failed: {e}"),
        RequestTokenError::Parse(e, _) => format!("malformed token response: {e}"),
        RequestTokenError::Other(message) => message,
    };
    ConsoleError::TokenExchange(message)
}
