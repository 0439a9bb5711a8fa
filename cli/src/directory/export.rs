//! CSV export of the device list.

use std::io::Write;
use std::path::Path;

use crate::directory::types::Device;
use crate::error::Result;

const HEADER: [&str; 7] = [
    "Device Name",
    "Device ID",
    "Health Status",
    "OS Platform",
    "Last Seen",
    "AAD Device ID",
    "Logon User",
];

/// Writes one CSV row per device to `writer`.
///
/// The last column is the first logon user, or `No users` when none have
/// been loaded.
pub fn write_devices_csv<W: Write>(devices: &[Device], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for device in devices {
        csv.write_record([
            device.host_name.as_str(),
            device.id.as_str(),
            device.health_status.as_str(),
            device.os_platform.as_str(),
            device.last_seen.as_str(),
            device.aad_device_id.as_deref().unwrap_or(""),
            device.first_user_display().as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes the CSV export to a file, replacing it if it exists.
pub fn export_devices_csv(devices: &[Device], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_devices_csv(devices, file)?;
    tracing::info!(path = %path.display(), rows = devices.len(), "device list exported");
    Ok(())
}
