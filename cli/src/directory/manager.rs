//! In-memory device directory.
//!
//! [`DeviceDirectory`] owns the loaded device list and everything derived
//! from it: logon-user enrichment, favorites, and recent searches. It is the
//! only writer of that state; every mutation goes through `&mut self`.
//! Network work that may overlap (user loads) is handed out as `'static`
//! futures whose results are applied back with
//! [`complete_user_load`](DeviceDirectory::complete_user_load).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use url::Url;

use crate::client::DefenderApi;
use crate::directory::types::{Device, LogonUser};
use crate::error::{ConsoleError, Result};

/// Maximum number of recent search terms kept.
pub const MAX_RECENT_SEARCHES: usize = 10;

/// Upper bound on guarded user loads in flight from one batch.
const MAX_CONCURRENT_USER_LOADS: usize = 8;

/// Where a device stands with respect to the guarded user load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLoadState {
    /// No guarded load has been started since the last reset.
    NotRequested,
    /// A guarded load is in flight.
    Loading,
    /// Users were loaded and written into the stored device.
    Loaded,
    /// The last guarded load failed; another attempt is allowed.
    Failed(String),
}

/// A pending guarded logon-user fetch.
///
/// Holds only owned data, so it can be awaited alongside other loads or
/// moved onto a task.
pub struct UserLoad {
    device_id: String,
    fetch: BoxFuture<'static, Result<Vec<LogonUser>>>,
}

impl UserLoad {
    /// Drives the fetch to completion.
    pub async fn run(self) -> CompletedUserLoad {
        CompletedUserLoad {
            device_id: self.device_id,
            result: self.fetch.await,
        }
    }
}

/// Outcome of a [`UserLoad`], to be applied with
/// [`DeviceDirectory::complete_user_load`].
pub struct CompletedUserLoad {
    pub device_id: String,
    pub result: Result<Vec<LogonUser>>,
}

/// Device list, user enrichment, favorites and recent searches.
pub struct DeviceDirectory {
    api: Arc<dyn DefenderApi>,
    devices: Vec<Device>,
    loading: HashSet<String>,
    loaded: HashSet<String>,
    failed: HashMap<String, String>,
    favorites: Vec<Device>,
    recent_searches: Vec<String>,
    last_error: Option<String>,
    local_user: String,
}

impl DeviceDirectory {
    /// Creates an empty directory backed by `api`.
    ///
    /// The local user name (used in offboard comments) is taken from the OS.
    pub fn new(api: Arc<dyn DefenderApi>) -> Self {
        Self {
            api,
            devices: Vec::new(),
            loading: HashSet::new(),
            loaded: HashSet::new(),
            failed: HashMap::new(),
            favorites: Vec::new(),
            recent_searches: Vec::new(),
            last_error: None,
            local_user: whoami::username(),
        }
    }

    /// Overrides the local user name recorded in offboard comments.
    #[must_use]
    pub fn with_local_user(mut self, local_user: impl Into<String>) -> Self {
        self.local_user = local_user.into();
        self
    }

    /// Loaded devices in listing order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Looks up a loaded device by id.
    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    /// Message of the last failed device listing, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Name recorded in offboard comments.
    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    /// Drops the device list and all per-device load bookkeeping.
    ///
    /// Favorites and recent searches are kept. Loads still in flight finish
    /// normally but are not recorded as loaded unless their device
    /// reappears.
    pub fn reset(&mut self) {
        self.devices.clear();
        self.loaded.clear();
        self.failed.clear();
        self.last_error = None;
    }

    /// Replaces the device list with every page of the machine listing.
    ///
    /// Pages are fetched one after another, following `@odata.nextLink`
    /// until it is absent. If a page fails, the devices gathered so far are
    /// kept, the error is recorded in [`last_error`](Self::last_error), and
    /// the error is returned.
    ///
    /// Returns the number of devices loaded.
    pub async fn fetch_all_devices(&mut self, token: &str) -> Result<usize> {
        self.reset();

        let mut next = match self.api.devices_url() {
            Ok(url) => Some(url),
            Err(e) => return Err(self.record_error(e)),
        };
        let mut seen = HashSet::new();
        let mut pages = 0_usize;

        while let Some(url) = next.take() {
            tracing::debug!(page = pages + 1, "fetching device page");
            let page = match self.api.list_devices_page(&url, token).await {
                Ok(page) => page,
                Err(e) => return Err(self.record_error(e)),
            };
            pages += 1;

            for device in page.value {
                if seen.insert(device.id.clone()) {
                    self.devices.push(device);
                } else {
                    tracing::debug!(device_id = %device.id, "ignoring repeated device in listing");
                }
            }

            if let Some(link) = page.next_link {
                match Url::parse(&link) {
                    Ok(url) => next = Some(url),
                    Err(e) => {
                        let err = ConsoleError::UnexpectedResponse(format!(
                            "invalid next page link '{link}': {e}"
                        ));
                        return Err(self.record_error(err));
                    }
                }
            }
        }

        tracing::info!(devices = self.devices.len(), pages, "device list loaded");
        Ok(self.devices.len())
    }

    fn record_error(&mut self, err: ConsoleError) -> ConsoleError {
        tracing::warn!(
            kept = self.devices.len(),
            error = %err,
            "device listing stopped"
        );
        self.last_error = Some(err.to_string());
        err
    }

    /// Finds a loaded device by host name, ignoring case.
    ///
    /// Returns the first match in listing order.
    pub fn search_device(&self, name: &str) -> Option<&Device> {
        let needle = name.to_lowercase();
        self.devices
            .iter()
            .find(|d| d.host_name.to_lowercase() == needle)
    }

    /// Fetches logon users for a device, bypassing the load bookkeeping.
    pub async fn fetch_logon_users(&self, device_id: &str, token: &str) -> Result<Vec<LogonUser>> {
        self.api.logon_users(device_id, token).await
    }

    /// Returns a copy of a loaded device with freshly fetched users.
    ///
    /// The stored device is not modified.
    pub async fn fetch_device_with_users(&self, device_id: &str, token: &str) -> Result<Device> {
        let device = self
            .device(device_id)
            .ok_or_else(|| ConsoleError::DeviceNotFound(device_id.to_string()))?;
        let users = self.fetch_logon_users(device_id, token).await?;
        Ok(device.with_users(users))
    }

    /// Starts a guarded user load.
    ///
    /// Returns `None` when the device is already loading or already loaded.
    /// Otherwise marks it loading and returns the fetch for the caller to
    /// drive. A previous failure does not block a new attempt.
    pub fn begin_user_load(&mut self, device_id: &str, token: &str) -> Option<UserLoad> {
        if self.loading.contains(device_id) || self.loaded.contains(device_id) {
            return None;
        }

        self.failed.remove(device_id);
        self.loading.insert(device_id.to_string());

        let api = Arc::clone(&self.api);
        let id = device_id.to_string();
        let token = token.to_string();
        let fetch = async move { api.logon_users(&id, &token).await }.boxed();

        Some(UserLoad {
            device_id: device_id.to_string(),
            fetch,
        })
    }

    /// Applies the outcome of a guarded user load.
    ///
    /// A load for a device that is no longer listed leaves no trace and
    /// reports [`UserLoadState::NotRequested`].
    pub fn complete_user_load(&mut self, completed: CompletedUserLoad) -> UserLoadState {
        let CompletedUserLoad { device_id, result } = completed;
        self.loading.remove(&device_id);

        let Some(device) = self.devices.iter_mut().find(|d| d.id == device_id) else {
            tracing::debug!(%device_id, "user load finished for a device no longer listed");
            return UserLoadState::NotRequested;
        };

        match result {
            Ok(users) => {
                tracing::debug!(%device_id, users = users.len(), "logon users loaded");
                device.logon_users = users;
                device.users_loaded = true;
                self.loaded.insert(device_id);
                UserLoadState::Loaded
            }
            Err(e) => {
                tracing::warn!(%device_id, error = %e, "logon user load failed");
                let message = e.to_string();
                self.failed.insert(device_id, message.clone());
                UserLoadState::Failed(message)
            }
        }
    }

    /// Guarded load in one step: begin, await, and apply.
    ///
    /// Returns `None` if the load was skipped because the device is already
    /// loading or loaded.
    pub async fn load_users_for_device(
        &mut self,
        device_id: &str,
        token: &str,
    ) -> Option<UserLoadState> {
        let load = self.begin_user_load(device_id, token)?;
        let completed = load.run().await;
        Some(self.complete_user_load(completed))
    }

    /// Guarded loads for several devices, run concurrently.
    ///
    /// Devices already loading or loaded are skipped. Returns the resulting
    /// state of each device that was actually fetched, in completion order.
    pub async fn load_users_for_devices(
        &mut self,
        device_ids: &[String],
        token: &str,
    ) -> Vec<(String, UserLoadState)> {
        let loads: Vec<UserLoad> = device_ids
            .iter()
            .filter_map(|id| self.begin_user_load(id, token))
            .collect();

        let completed: Vec<CompletedUserLoad> = futures::stream::iter(loads)
            .map(UserLoad::run)
            .buffer_unordered(MAX_CONCURRENT_USER_LOADS)
            .collect()
            .await;

        completed
            .into_iter()
            .map(|done| {
                let id = done.device_id.clone();
                (id, self.complete_user_load(done))
            })
            .collect()
    }

    /// Current guarded-load state of a device.
    pub fn user_load_state(&self, device_id: &str) -> UserLoadState {
        if self.loading.contains(device_id) {
            UserLoadState::Loading
        } else if self.loaded.contains(device_id) {
            UserLoadState::Loaded
        } else if let Some(message) = self.failed.get(device_id) {
            UserLoadState::Failed(message.clone())
        } else {
            UserLoadState::NotRequested
        }
    }

    /// Requests offboarding of one device.
    ///
    /// The request comment names the local user who started it.
    pub async fn offboard_device(&self, device_id: &str, token: &str) -> Result<()> {
        let comment = offboard_comment(&self.local_user);
        self.api.offboard(device_id, &comment, token).await?;
        tracing::info!(%device_id, "offboard request accepted");
        Ok(())
    }

    /// Adds a snapshot of `device` to favorites, or removes it if present.
    ///
    /// Favorites are point-in-time copies: later changes to the listed
    /// device (such as its users loading) do not reach the snapshot.
    ///
    /// Returns `true` if the device is a favorite afterwards.
    pub fn toggle_favorite(&mut self, device: &Device) -> bool {
        if let Some(pos) = self.favorites.iter().position(|f| f.id == device.id) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.push(device.clone());
            true
        }
    }

    /// Whether the device id is among the favorites.
    pub fn is_favorite(&self, device_id: &str) -> bool {
        self.favorites.iter().any(|f| f.id == device_id)
    }

    /// Favorite snapshots in the order they were added.
    pub fn favorites(&self) -> &[Device] {
        &self.favorites
    }

    pub fn clear_favorites(&mut self) {
        self.favorites.clear();
    }

    /// Records a search term, newest first.
    ///
    /// Empty terms and terms already present are ignored. The list keeps at
    /// most [`MAX_RECENT_SEARCHES`] entries.
    pub fn add_recent_search(&mut self, term: &str) {
        if term.is_empty() || self.recent_searches.iter().any(|t| t == term) {
            return;
        }

        self.recent_searches.insert(0, term.to_string());
        self.recent_searches.truncate(MAX_RECENT_SEARCHES);
    }

    /// Recent search terms, newest first.
    pub fn recent_searches(&self) -> &[String] {
        &self.recent_searches
    }

    pub fn clear_recent_searches(&mut self) {
        self.recent_searches.clear();
    }
}

/// Comment attached to offboard requests.
#[must_use]
pub fn offboard_comment(local_user: &str) -> String {
    format!("Offboard machine by {local_user}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockDefenderApi;
    use crate::directory::types::DevicePage;
    use mockall::predicate::eq;

    const FIRST_PAGE: &str = "https://api.test/api/machines?$select=id";
    const SECOND_PAGE: &str = "https://api.test/api/machines?$skiptoken=2";

    fn device(id: &str, name: &str) -> Device {
        Device {
            id: id.to_string(),
            host_name: name.to_string(),
            aad_device_id: None,
            health_status: "Active".to_string(),
            os_platform: "Windows11".to_string(),
            last_seen: "2024-05-01T10:00:00Z".to_string(),
            logon_users: Vec::new(),
            users_loaded: false,
        }
    }

    fn user(name: &str) -> LogonUser {
        LogonUser {
            id: name.to_string(),
            account_name: name.to_string(),
            account_domain: "CONTOSO".to_string(),
            first_seen: "2024-01-01T00:00:00Z".to_string(),
            last_seen: "2024-05-01T00:00:00Z".to_string(),
            logon_types: "Interactive".to_string(),
            is_domain_admin: false,
            is_only_network_user: false,
        }
    }

    fn mock_listing(mock: &mut MockDefenderApi, devices: Vec<Device>) {
        mock.expect_devices_url()
            .returning(|| Ok(Url::parse(FIRST_PAGE).unwrap()));
        mock.expect_list_devices_page()
            .times(1)
            .returning(move |_, _| {
                Ok(DevicePage {
                    value: devices.clone(),
                    next_link: None,
                })
            });
    }

    async fn loaded_directory(mut mock: MockDefenderApi, devices: Vec<Device>) -> DeviceDirectory {
        mock_listing(&mut mock, devices);
        let mut directory = DeviceDirectory::new(Arc::new(mock)).with_local_user("tester");
        directory.fetch_all_devices("tok").await.unwrap();
        directory
    }

    #[tokio::test]
    async fn fetch_all_devices_follows_next_link_and_appends() {
        let mut mock = MockDefenderApi::new();
        mock.expect_devices_url()
            .returning(|| Ok(Url::parse(FIRST_PAGE).unwrap()));
        mock.expect_list_devices_page()
            .withf(|url, token| url.as_str() == FIRST_PAGE && token == "tok")
            .times(1)
            .returning(|_, _| {
                Ok(DevicePage {
                    value: vec![device("d1", "web-01"), device("d2", "web-02")],
                    next_link: Some(SECOND_PAGE.to_string()),
                })
            });
        mock.expect_list_devices_page()
            .withf(|url, _| url.as_str() == SECOND_PAGE)
            .times(1)
            .returning(|_, _| {
                Ok(DevicePage {
                    value: vec![device("d3", "db-01")],
                    next_link: None,
                })
            });

        let mut directory = DeviceDirectory::new(Arc::new(mock));
        let count = directory.fetch_all_devices("tok").await.unwrap();

        assert_eq!(count, 3);
        let ids: Vec<_> = directory.devices().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["d1", "d2", "d3"]);
        assert!(directory.last_error().is_none());
    }

    #[tokio::test]
    async fn failed_page_keeps_partial_list_and_records_error() {
        let mut mock = MockDefenderApi::new();
        mock.expect_devices_url()
            .returning(|| Ok(Url::parse(FIRST_PAGE).unwrap()));
        mock.expect_list_devices_page()
            .withf(|url, _| url.as_str() == FIRST_PAGE)
            .times(1)
            .returning(|_, _| {
                Ok(DevicePage {
                    value: vec![device("d1", "web-01")],
                    next_link: Some(SECOND_PAGE.to_string()),
                })
            });
        mock.expect_list_devices_page()
            .withf(|url, _| url.as_str() == SECOND_PAGE)
            .times(1)
            .returning(|_, _| {
                Err(ConsoleError::ApiError {
                    status: 500,
                    message: "HTTP 500: device listing failed".to_string(),
                })
            });

        let mut directory = DeviceDirectory::new(Arc::new(mock));
        let err = directory.fetch_all_devices("tok").await.unwrap_err();

        assert!(matches!(err, ConsoleError::ApiError { status: 500, .. }));
        assert_eq!(directory.devices().len(), 1);
        assert!(directory.last_error().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn repeated_ids_across_pages_keep_first_occurrence() {
        let mut mock = MockDefenderApi::new();
        mock.expect_devices_url()
            .returning(|| Ok(Url::parse(FIRST_PAGE).unwrap()));
        mock.expect_list_devices_page()
            .withf(|url, _| url.as_str() == FIRST_PAGE)
            .returning(|_, _| {
                Ok(DevicePage {
                    value: vec![device("d1", "web-01")],
                    next_link: Some(SECOND_PAGE.to_string()),
                })
            });
        mock.expect_list_devices_page()
            .withf(|url, _| url.as_str() == SECOND_PAGE)
            .returning(|_, _| {
                Ok(DevicePage {
                    value: vec![device("d1", "web-01-renamed"), device("d2", "web-02")],
                    next_link: None,
                })
            });

        let mut directory = DeviceDirectory::new(Arc::new(mock));
        directory.fetch_all_devices("tok").await.unwrap();

        assert_eq!(directory.devices().len(), 2);
        assert_eq!(directory.device("d1").unwrap().host_name, "web-01");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_exact() {
        let directory = loaded_directory(
            MockDefenderApi::new(),
            vec![device("d1", "web-01"), device("d2", "web-010")],
        )
        .await;

        assert_eq!(directory.search_device("WEB-01").unwrap().id, "d1");
        assert!(directory.search_device("web").is_none());
        assert!(directory.search_device("db-01").is_none());
    }

    #[tokio::test]
    async fn concurrent_guarded_loads_fetch_once() {
        let mut mock = MockDefenderApi::new();
        mock.expect_logon_users()
            .with(eq("d1"), eq("tok"))
            .times(1)
            .returning(|_, _| Ok(vec![user("alice")]));
        let mut directory = loaded_directory(mock, vec![device("d1", "web-01")]).await;

        let first = directory.begin_user_load("d1", "tok").expect("first load starts");
        assert!(directory.begin_user_load("d1", "tok").is_none());
        assert_eq!(directory.user_load_state("d1"), UserLoadState::Loading);

        let state = directory.complete_user_load(first.run().await);

        assert_eq!(state, UserLoadState::Loaded);
        let stored = directory.device("d1").unwrap();
        assert!(stored.users_loaded);
        assert_eq!(stored.logon_users.len(), 1);
        assert!(directory.load_users_for_device("d1", "tok").await.is_none());
    }

    #[tokio::test]
    async fn batch_load_skips_loaded_devices() {
        let mut mock = MockDefenderApi::new();
        mock.expect_logon_users()
            .with(eq("d1"), eq("tok"))
            .times(1)
            .returning(|_, _| Ok(vec![user("alice")]));
        mock.expect_logon_users()
            .with(eq("d2"), eq("tok"))
            .times(1)
            .returning(|_, _| Err(ConsoleError::Network("reset".to_string())));
        let mut directory =
            loaded_directory(mock, vec![device("d1", "web-01"), device("d2", "web-02")]).await;

        let ids = vec!["d1".to_string(), "d2".to_string(), "d1".to_string()];
        let mut results = directory.load_users_for_devices(&ids, "tok").await;
        results.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ("d1".to_string(), UserLoadState::Loaded));
        assert!(matches!(results[1].1, UserLoadState::Failed(_)));

        let again = directory.load_users_for_devices(&ids[..1], "tok").await;
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn failed_load_is_reported_and_retryable() {
        let mut mock = MockDefenderApi::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_logon_users()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ConsoleError::Timeout));
        mock.expect_logon_users()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Vec::new()));
        let mut directory = loaded_directory(mock, vec![device("d1", "web-01")]).await;

        let state = directory.load_users_for_device("d1", "tok").await.unwrap();
        assert!(matches!(state, UserLoadState::Failed(ref m) if m.contains("timed out")));
        assert!(!directory.device("d1").unwrap().users_loaded);
        assert_eq!(directory.user_load_state("d1"), state);

        let retried = directory.load_users_for_device("d1", "tok").await.unwrap();
        assert_eq!(retried, UserLoadState::Loaded);
        let stored = directory.device("d1").unwrap();
        assert!(stored.users_loaded);
        assert!(stored.logon_users.is_empty());
    }

    #[tokio::test]
    async fn refresh_clears_loaded_state() {
        let mut mock = MockDefenderApi::new();
        mock.expect_devices_url()
            .returning(|| Ok(Url::parse(FIRST_PAGE).unwrap()));
        mock.expect_list_devices_page()
            .times(2)
            .returning(|_, _| {
                Ok(DevicePage {
                    value: vec![device("d1", "web-01")],
                    next_link: None,
                })
            });
        mock.expect_logon_users()
            .times(2)
            .returning(|_, _| Ok(vec![user("alice")]));

        let mut directory = DeviceDirectory::new(Arc::new(mock));
        directory.fetch_all_devices("tok").await.unwrap();
        directory.load_users_for_device("d1", "tok").await.unwrap();

        directory.fetch_all_devices("tok").await.unwrap();

        assert_eq!(directory.user_load_state("d1"), UserLoadState::NotRequested);
        assert!(!directory.device("d1").unwrap().users_loaded);
        assert_eq!(
            directory.load_users_for_device("d1", "tok").await,
            Some(UserLoadState::Loaded)
        );
    }

    #[tokio::test]
    async fn late_completion_after_reset_is_dropped() {
        let mut mock = MockDefenderApi::new();
        mock.expect_logon_users()
            .with(eq("d1"), eq("tok"))
            .returning(|_, _| Ok(vec![user("alice")]));
        mock.expect_logon_users()
            .with(eq("d2"), eq("tok"))
            .returning(|_, _| Err(ConsoleError::Timeout));
        let mut directory = loaded_directory(
            mock,
            vec![device("d1", "web-01"), device("d2", "web-02")],
        )
        .await;

        let ok = directory.begin_user_load("d1", "tok").unwrap();
        let failing = directory.begin_user_load("d2", "tok").unwrap();
        directory.reset();

        assert_eq!(
            directory.complete_user_load(ok.run().await),
            UserLoadState::NotRequested
        );
        assert_eq!(
            directory.complete_user_load(failing.run().await),
            UserLoadState::NotRequested
        );
        assert_eq!(directory.user_load_state("d1"), UserLoadState::NotRequested);
        assert_eq!(directory.user_load_state("d2"), UserLoadState::NotRequested);
    }

    #[tokio::test]
    async fn fetch_device_with_users_returns_copy() {
        let mut mock = MockDefenderApi::new();
        mock.expect_logon_users()
            .returning(|_, _| Ok(vec![user("alice"), user("bob")]));
        let directory = loaded_directory(mock, vec![device("d1", "web-01")]).await;

        let copy = directory.fetch_device_with_users("d1", "tok").await.unwrap();

        assert!(copy.users_loaded);
        assert_eq!(copy.logon_users.len(), 2);
        assert!(!directory.device("d1").unwrap().users_loaded);
        assert_eq!(directory.user_load_state("d1"), UserLoadState::NotRequested);
    }

    #[tokio::test]
    async fn fetch_device_with_users_requires_loaded_device() {
        let mut mock = MockDefenderApi::new();
        mock.expect_logon_users().never();
        let directory = loaded_directory(mock, vec![device("d1", "web-01")]).await;

        let err = directory
            .fetch_device_with_users("nope", "tok")
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::DeviceNotFound(ref id) if id == "nope"));
    }

    #[tokio::test]
    async fn offboard_comment_names_local_user() {
        let mut mock = MockDefenderApi::new();
        mock.expect_offboard()
            .with(eq("d1"), eq("Offboard machine by tester"), eq("tok"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let directory = loaded_directory(mock, vec![device("d1", "web-01")]).await;

        assert!(directory.offboard_device("d1", "tok").await.is_ok());
    }

    #[tokio::test]
    async fn favorites_are_snapshots() {
        let mut mock = MockDefenderApi::new();
        mock.expect_logon_users()
            .returning(|_, _| Ok(vec![user("alice")]));
        let mut directory = loaded_directory(mock, vec![device("d1", "web-01")]).await;

        let listed = directory.device("d1").unwrap().clone();
        assert!(directory.toggle_favorite(&listed));
        directory.load_users_for_device("d1", "tok").await.unwrap();

        assert!(directory.is_favorite("d1"));
        assert!(!directory.favorites()[0].users_loaded);
        assert!(directory.device("d1").unwrap().users_loaded);
    }

    #[test]
    fn toggle_favorite_twice_restores_initial_state() {
        let mut directory = DeviceDirectory::new(Arc::new(MockDefenderApi::new()));
        let d = device("d1", "web-01");

        assert!(directory.toggle_favorite(&d));
        assert!(!directory.toggle_favorite(&d));

        assert!(!directory.is_favorite("d1"));
        assert!(directory.favorites().is_empty());
    }

    #[test]
    fn recent_search_goes_to_front() {
        let mut directory = DeviceDirectory::new(Arc::new(MockDefenderApi::new()));
        directory.add_recent_search("web-01");
        directory.add_recent_search("db-01");

        assert_eq!(directory.recent_searches(), ["db-01", "web-01"]);

        directory.add_recent_search("web-01");
        assert_eq!(directory.recent_searches(), ["db-01", "web-01"]);

        directory.add_recent_search("");
        assert_eq!(directory.recent_searches().len(), 2);
    }

    #[test]
    fn eleventh_recent_search_evicts_oldest() {
        let mut directory = DeviceDirectory::new(Arc::new(MockDefenderApi::new()));
        for i in 0..MAX_RECENT_SEARCHES {
            directory.add_recent_search(&format!("host-{i}"));
            assert_eq!(directory.recent_searches().len(), i + 1);
        }

        directory.add_recent_search("host-new");

        let recent = directory.recent_searches();
        assert_eq!(recent.len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent[0], "host-new");
        assert!(!recent.iter().any(|t| t == "host-0"));
        assert_eq!(recent[MAX_RECENT_SEARCHES - 1], "host-1");
    }

    #[test]
    fn recent_search_is_case_sensitive() {
        let mut directory = DeviceDirectory::new(Arc::new(MockDefenderApi::new()));
        directory.add_recent_search("web-01");
        directory.add_recent_search("WEB-01");

        assert_eq!(directory.recent_searches(), ["WEB-01", "web-01"]);

        directory.clear_recent_searches();
        assert!(directory.recent_searches().is_empty());
    }
}
