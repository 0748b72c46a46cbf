//! Client session manager
//!
//! Holds the current token and user. Methods take `&mut self`, so a manager
//! has at most one bootstrap or login in flight.

use super::api::{AuthApi, RegisterForm};
use super::storage::TokenStorage;
use super::ClientError;
use crate::api::responses::{AuthResponse, UserResponse};

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    /// A persisted token is being checked against the server
    Loading,
    Authenticated { user: UserResponse, token: String },
}

/// Owns the session token and the signed-in user
pub struct SessionManager<A, S> {
    api: A,
    storage: S,
    state: SessionState,
}

impl<A: AuthApi, S: TokenStorage> SessionManager<A, S> {
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&UserResponse> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Restore a session from the persisted token.
    ///
    /// Never fails: a missing, rejected or unverifiable token leaves the
    /// session unauthenticated and the stored token cleared.
    pub async fn bootstrap(&mut self) {
        let token = match self.storage.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.state = SessionState::Unauthenticated;
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Could not read persisted token");
                self.discard_token();
                return;
            }
        };

        self.state = SessionState::Loading;

        match self.api.current_user(&token).await {
            Ok(user) => {
                self.state = SessionState::Authenticated { user, token };
            }
            Err(e) => {
                tracing::debug!(error = %e, "Persisted token rejected");
                self.discard_token();
            }
        }
    }

    /// Sign in. On failure the current state is left as it was.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self.api.login(email, password).await?;
        self.establish(response)
    }

    /// Create an account and sign in. On failure the current state is left as it was.
    pub async fn register(&mut self, form: &RegisterForm) -> Result<(), ClientError> {
        let response = self.api.register(form).await?;
        self.establish(response)
    }

    /// Sign out locally. The server is not contacted.
    pub fn logout(&mut self) {
        self.discard_token();
    }

    fn establish(&mut self, response: AuthResponse) -> Result<(), ClientError> {
        self.storage.save(&response.token)?;
        self.state = SessionState::Authenticated {
            user: response.user,
            token: response.token,
        };
        Ok(())
    }

    fn discard_token(&mut self) {
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted token");
        }
        self.state = SessionState::Unauthenticated;
    }
}
