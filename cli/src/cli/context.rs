//! State shared by every command for the lifetime of the process.

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{AuthSession, AuthorizationPrompt, LoopbackPrompt, PastePrompt};
use crate::client::DefenderClient;
use crate::config::ConsoleConfig;
use crate::directory::DeviceDirectory;
use crate::error::Result;

/// Owns the sign-in session and the device directory.
///
/// Built once in `main` and handed to command handlers by `&mut`.
pub struct Context {
    pub config: ConsoleConfig,
    pub config_path: PathBuf,
    pub session: AuthSession,
    pub directory: DeviceDirectory,
    prompt: Box<dyn AuthorizationPrompt>,
}

impl Context {
    /// Create the session and directory from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ConsoleConfig, config_path: PathBuf, no_browser: bool) -> Result<Self> {
        let client = DefenderClient::new(&config.api)?;
        let prompt: Box<dyn AuthorizationPrompt> = if no_browser {
            Box::new(PastePrompt)
        } else {
            Box::new(LoopbackPrompt::new(config.auth.redirect_uri.clone()))
        };

        Ok(Self {
            session: AuthSession::new(config.auth.clone()),
            directory: DeviceDirectory::new(Arc::new(client)),
            config,
            config_path,
            prompt,
        })
    }

    /// Signs in and clears the device list loaded under any previous sign-in.
    pub async fn sign_in(&mut self) -> Result<()> {
        if self.config.uses_placeholder_client_id() {
            tracing::warn!("client_id is still the placeholder; set MDE_CLIENT_ID or edit the config file");
        }

        self.session.authenticate(self.prompt.as_ref()).await?;
        self.directory.reset();
        Ok(())
    }
}
