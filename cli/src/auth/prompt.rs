//! Interactive step of the sign-in: show the authorization page to the user
//! and hand back the redirect URL.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::Uri;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

use crate::error::{ConsoleError, Result};

/// Presents an authorization URL and returns the provider's redirect.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Returns the full redirect URL, including its query string.
    ///
    /// Fails with [`ConsoleError::AuthenticationCancelled`] if the user
    /// backs out.
    async fn authorize(&self, authorization_url: &Url) -> Result<Url>;
}

const SUCCESS_PAGE: &str = "<!doctype html><html><body>\
<h3>Sign-in complete.</h3><p>You can close this window and return to mdeoff.</p>\
</body></html>";

/// Opens the system browser and receives the redirect on a local listener.
///
/// The redirect URI must point at this machine (e.g.
/// `http://localhost:8400/callback`). Ctrl-C while waiting cancels.
pub struct LoopbackPrompt {
    redirect_uri: Url,
}

impl LoopbackPrompt {
    #[must_use]
    pub const fn new(redirect_uri: Url) -> Self {
        Self { redirect_uri }
    }
}

#[async_trait]
impl AuthorizationPrompt for LoopbackPrompt {
    async fn authorize(&self, authorization_url: &Url) -> Result<Url> {
        let host = self.redirect_uri.host_str().ok_or_else(|| {
            ConsoleError::Config(format!("redirect URI has no host: {}", self.redirect_uri))
        })?;
        let port = self.redirect_uri.port_or_known_default().ok_or_else(|| {
            ConsoleError::Config(format!("redirect URI has no port: {}", self.redirect_uri))
        })?;

        let listener = TcpListener::bind((host, port)).await?;
        tracing::debug!(%host, port, "waiting for authorization redirect");

        if open::that(authorization_url.as_str()).is_ok() {
            eprintln!("Browser opened. Complete the sign-in there (Ctrl-C to cancel).");
        } else {
            eprintln!("Could not open browser. To sign in, please visit:");
            eprintln!();
            eprintln!("  {authorization_url}");
            eprintln!();
        }

        tokio::select! {
            callback = wait_for_callback(listener, &self.redirect_uri) => callback,
            _ = tokio::signal::ctrl_c() => Err(ConsoleError::AuthenticationCancelled),
        }
    }
}

type RedirectSender = Arc<Mutex<Option<oneshot::Sender<String>>>>;

/// Serves the redirect path until the first request reaches it.
///
/// Other paths (a browser asking for `/favicon.ico`, say) get a 404, and
/// connections that never send a request are ignored.
async fn wait_for_callback(listener: TcpListener, redirect_uri: &Url) -> Result<Url> {
    let (sender, receiver) = oneshot::channel();
    let sender: RedirectSender = Arc::new(Mutex::new(Some(sender)));
    let app = Router::new().route(
        redirect_uri.path(),
        get(move |uri: Uri| receive_redirect(Arc::clone(&sender), uri)),
    );

    let (target_tx, target_rx) = oneshot::channel();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Ok(target) = receiver.await {
                let _ = target_tx.send(target);
            }
        })
        .await?;

    let target = target_rx.await.map_err(|_| {
        ConsoleError::InvalidCallback("redirect listener stopped without a request".to_string())
    })?;
    redirect_uri
        .join(&target)
        .map_err(|e| ConsoleError::InvalidCallback(e.to_string()))
}

async fn receive_redirect(sender: RedirectSender, uri: Uri) -> Html<&'static str> {
    let sender = sender.lock().ok().and_then(|mut slot| slot.take());
    if let Some(sender) = sender {
        tracing::debug!(path = uri.path(), "authorization redirect received");
        let _ = sender.send(uri.to_string());
    }
    Html(SUCCESS_PAGE)
}

/// Prints the authorization URL and reads the redirect URL from stdin.
///
/// For machines without a browser or where the redirect URI is not local.
/// An empty line cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct PastePrompt;

#[async_trait]
impl AuthorizationPrompt for PastePrompt {
    async fn authorize(&self, authorization_url: &Url) -> Result<Url> {
        println!("To sign in, please visit:");
        println!();
        println!("  {authorization_url}");
        println!();
        print!("Paste the URL you were redirected to (empty to cancel): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        parse_pasted(&input)
    }
}

fn parse_pasted(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ConsoleError::AuthenticationCancelled);
    }
    Url::parse(trimmed).map_err(|e| ConsoleError::InvalidCallback(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn loopback_returns_redirect_and_ignores_other_requests() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let redirect = Url::parse(&format!("http://127.0.0.1:{port}/callback")).unwrap();

        let browser = tokio::spawn(async move {
            // A preconnect that never sends a request.
            drop(TcpStream::connect(("127.0.0.1", port)).await.unwrap());

            let base = format!("http://127.0.0.1:{port}");
            let favicon = reqwest::get(format!("{base}/favicon.ico")).await.unwrap();
            let page = reqwest::get(format!("{base}/callback?code=abc&state=s1"))
                .await
                .unwrap();
            (favicon.status(), page.status(), page.text().await.unwrap())
        });

        let callback = wait_for_callback(listener, &redirect).await.unwrap();
        let (favicon, status, body) = browser.await.unwrap();

        assert_eq!(favicon, StatusCode::NOT_FOUND);
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Sign-in complete"));
        assert_eq!(callback.path(), "/callback");
        assert_eq!(callback.query(), Some("code=abc&state=s1"));
    }

    #[test]
    fn pasted_empty_line_cancels() {
        assert!(matches!(
            parse_pasted("  \n"),
            Err(ConsoleError::AuthenticationCancelled)
        ));
    }

    #[test]
    fn pasted_garbage_is_invalid_callback() {
        assert!(matches!(
            parse_pasted("not a url\n"),
            Err(ConsoleError::InvalidCallback(_))
        ));
    }

    #[test]
    fn pasted_url_is_trimmed() {
        let url = parse_pasted(" http://localhost:8400/callback?code=x \n").unwrap();
        assert_eq!(url.query(), Some("code=x"));
    }
}
