//! Device directory: the loaded device list and the operations on it.

pub mod export;
pub mod manager;
pub mod offboard;
pub mod types;

pub use export::export_devices_csv;
pub use manager::{DeviceDirectory, UserLoadState};
pub use offboard::{offboard_devices, BulkOffboardSummary};
pub use types::{Device, DevicePage, LogonUser};
