//! Defender API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::Deserialize;
use url::Url;

use crate::client::middleware::RequestLogging;
use crate::config::ApiConfig;
use crate::directory::{DevicePage, LogonUser};
use crate::error::{ConsoleError, Result};

/// Fields requested from the machine listing.
pub const DEVICE_FIELDS: &str = "id,computerDnsName,aadDeviceId,healthStatus,osPlatform,lastSeen";

/// Operations the device directory needs from the Defender API.
///
/// The bearer token is passed on every call; implementations never hold one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DefenderApi: Send + Sync {
    /// URL of the first page of the machine listing.
    fn devices_url(&self) -> Result<Url>;

    /// Fetches one listing page. `url` is either [`devices_url`](Self::devices_url)
    /// or a next link returned by a previous page.
    async fn list_devices_page(&self, url: &Url, token: &str) -> Result<DevicePage>;

    /// Fetches the logon users of one device.
    ///
    /// Records that do not parse are skipped rather than failing the batch.
    async fn logon_users(&self, device_id: &str, token: &str) -> Result<Vec<LogonUser>>;

    /// Requests offboarding of one device.
    async fn offboard(&self, device_id: &str, comment: &str, token: &str) -> Result<()>;
}

/// HTTP client for the Defender for Endpoint REST API.
pub struct DefenderClient {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl DefenderClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(format!("mdeoff/{}", env!("CARGO_PKG_VERSION")));

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = ClientBuilder::new(builder.build()?)
            .with(RequestLogging)
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// `{base}/machines[/{device_id}[/{leaf}]]`, percent-encoding the id.
    fn machines_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ConsoleError::Config(format!("API base URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .push("machines")
            .extend(segments);
        Ok(url)
    }
}

#[derive(Deserialize)]
struct UserListing {
    value: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extracts `error.message` from a Defender error body, if there is one.
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

/// Builds an [`ConsoleError::ApiError`] from a failed response.
async fn api_error(response: reqwest::Response, what: &str) -> ConsoleError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message =
        api_error_message(&body).unwrap_or_else(|| format!("HTTP {status}: {what} failed"));
    ConsoleError::ApiError { status, message }
}

#[async_trait]
impl DefenderApi for DefenderClient {
    fn devices_url(&self) -> Result<Url> {
        let mut url = self.machines_url(&[])?;
        url.query_pairs_mut().append_pair("$select", DEVICE_FIELDS);
        Ok(url)
    }

    async fn list_devices_page(&self, url: &Url, token: &str) -> Result<DevicePage> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(api_error(response, "device listing").await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ConsoleError::UnexpectedResponse(format!("device listing page could not be read: {e}"))
        })
    }

    async fn logon_users(&self, device_id: &str, token: &str) -> Result<Vec<LogonUser>> {
        let url = self.machines_url(&[device_id, "logonusers"])?;
        let response = self.client.get(url).bearer_auth(token).send().await?;

        if response.status() != StatusCode::OK {
            return Err(api_error(response, "logon user request").await);
        }

        let body = response.text().await?;
        let listing: UserListing = serde_json::from_str(&body).map_err(|e| {
            ConsoleError::UnexpectedResponse(format!("logon users could not be read: {e}"))
        })?;

        let users = listing
            .value
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<LogonUser>(record) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::debug!(device_id, error = %e, "skipping malformed logon user record");
                    None
                }
            })
            .collect();

        Ok(users)
    }

    async fn offboard(&self, device_id: &str, comment: &str, token: &str) -> Result<()> {
        let url = self.machines_url(&[device_id, "offboard"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "Comment": comment }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => Ok(()),
            _ => Err(api_error(response, "offboard request").await),
        }
    }
}
