//! Command implementations.

pub mod auth;
pub mod console;
pub mod devices;
pub mod favorites;
pub mod info;
pub mod offboard;

pub use auth::{handle_login, handle_logout, handle_status};
pub use console::run_console;
pub use devices::{handle_device_users, handle_devices};
pub use info::{handle_completions, handle_config};
pub use offboard::handle_offboard_command;
