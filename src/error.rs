use thiserror::Error;

use crate::auth::AuthError;
use crate::models::ValidationError;
use crate::share::ShareError;
use crate::store::StoreError;

/// Everything the dashboard can reject a user action with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Share(#[from] ShareError),
}

impl PollError {
    /// Short toast title for this error kind.
    pub fn title(&self) -> &'static str {
        match self {
            PollError::Validation(_) => "Invalid poll",
            PollError::Store(StoreError::NotFound(_)) => "Poll not found",
            PollError::Store(StoreError::InvalidOption { .. }) => "Invalid option",
            PollError::Auth(_) => "Authentication failed",
            PollError::Share(_) => "Sharing failed",
        }
    }
}
