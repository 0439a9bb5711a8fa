//! Bulk offboarding.

use futures::future::join_all;

use crate::directory::manager::DeviceDirectory;

/// Aggregated outcome of a bulk offboard.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkOffboardSummary {
    /// Device ids whose offboard request was accepted.
    pub succeeded: Vec<String>,
    /// Device ids whose request failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl BulkOffboardSummary {
    /// Number of devices attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl std::fmt::Display for BulkOffboardSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Offboarded: {}, Failed: {}",
            self.succeeded.len(),
            self.failed.len()
        )
    }
}

/// Offboards every device in `device_ids`.
///
/// All requests are started together and the summary is returned once the
/// last one has finished. Nothing is cancelled or retried.
pub async fn offboard_devices(
    directory: &DeviceDirectory,
    device_ids: &[String],
    token: &str,
) -> BulkOffboardSummary {
    tracing::info!(count = device_ids.len(), "starting bulk offboard");

    let requests = device_ids.iter().map(|id| async move {
        let result = directory.offboard_device(id, token).await;
        (id.clone(), result)
    });

    let mut summary = BulkOffboardSummary::default();
    for (id, result) in join_all(requests).await {
        match result {
            Ok(()) => summary.succeeded.push(id),
            Err(e) => summary.failed.push((id, e.to_string())),
        }
    }

    tracing::info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "bulk offboard finished"
    );
    summary
}
