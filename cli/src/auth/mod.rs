//! Authentication for mdeoff.
//!
//! Interactive OAuth2 authorization-code sign-in against the Microsoft
//! identity platform. The resulting bearer token is held in memory only.

pub mod prompt;
pub mod provider;
pub mod session;

pub use prompt::{AuthorizationPrompt, LoopbackPrompt, PastePrompt};
pub use session::{AuthSession, AuthState};
