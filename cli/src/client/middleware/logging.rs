//! Request logging middleware.

use std::time::Instant;

use async_trait::async_trait;
use http::Extensions;
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next, Result};

/// Middleware that logs every Defender API request with its outcome.
///
/// Only the method and path are logged; query strings and headers (which
/// carry the bearer token) are left out.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogging;

#[async_trait]
impl Middleware for RequestLogging {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let path = req.url().path().to_string();
        let started = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(%method, %path, status = status.as_u16(), elapsed_ms, "request completed");

                if status == StatusCode::UNAUTHORIZED {
                    tracing::warn!("Received 401 Unauthorized - the access token may have expired");
                }
            }
            Err(e) => {
                tracing::warn!(%method, %path, elapsed_ms, error = %e, "request failed");
            }
        }

        result
    }
}
