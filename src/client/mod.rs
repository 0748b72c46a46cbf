//! Client side of DevConnect
//!
//! Everything a front end needs to talk to the server:
//! - [`ApiClient`], a typed HTTP client for every endpoint
//! - [`SessionManager`], which owns the current token and user
//! - [`TokenStorage`] implementations for persisting the token between runs
//!
//! # Usage
//!
//! ```ignore
//! use devconnect::client::{ApiClient, FileTokenStorage, SessionManager};
//!
//! let api = ApiClient::new("http://localhost:5001/api")?;
//! let storage = FileTokenStorage::new("devconnect-session.json");
//! let mut session = SessionManager::new(api, storage);
//! session.bootstrap().await;
//! ```

pub mod api;
pub mod session;
pub mod storage;

pub use api::{ApiClient, AuthApi, RegisterForm};
pub use session::{SessionManager, SessionState};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

/// Errors surfaced to client callers.
///
/// `Display` is the message meant for the user.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error body
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The server could not be reached or answered with something unreadable
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The token could not be persisted
    #[error("Token storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ClientError {
    /// Machine-readable error code, when the server sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
