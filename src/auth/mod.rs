mod memory;

pub use memory::{AccountDirectory, InMemoryAuth};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// A signed-in user as reported by the authentication backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Failure reported by the authentication backend. The message is shown to
/// the user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct AuthError(pub String);

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self);

    fn current_session(&self) -> Option<Session>;

    /// Observes session changes (sign in, sign up, sign out).
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}
