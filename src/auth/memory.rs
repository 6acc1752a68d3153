use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use tokio::sync::watch;
use uuid::Uuid;

use super::{AuthError, AuthProvider, Session};

const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    // PHC string, never the password itself
    password_hash: String,
    display_name: String,
}

/// Process-local account list standing in for the hosted auth backend.
/// Shared by every client; nothing is written to disk.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    accounts: Mutex<HashMap<String, Account>>,
}

impl AccountDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn register(&self, email: &str, password: &str, display_name: &str) -> Result<Account, AuthError> {
        if !EMAIL_RE.is_match(email) {
            return Err(AuthError::new("Unable to validate email address: invalid format"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new("Password should be at least 6 characters."));
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::new("Please tell us your name."));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                AuthError::new("Unable to create account right now. Please try again.")
            })?
            .to_string();

        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| AuthError::new("Account directory unavailable"))?;
        if accounts.contains_key(email) {
            return Err(AuthError::new("User already registered"));
        }
        let account = Account {
            user_id: Uuid::new_v4().to_string(),
            password_hash,
            display_name: display_name.to_string(),
        };
        accounts.insert(email.to_string(), account.clone());
        Ok(account)
    }

    fn verify(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let invalid = || AuthError::new("Invalid login credentials");
        let account = self
            .accounts
            .lock()
            .map_err(|_| AuthError::new("Account directory unavailable"))?
            .get(email)
            .cloned()
            .ok_or_else(invalid)?;

        let parsed = PasswordHash::new(&account.password_hash).map_err(|e| {
            error!("Stored password hash for {} is unreadable: {}", account.user_id, e);
            invalid()
        })?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| invalid())?;
        Ok(account)
    }
}

/// One client's view of the account directory, with its own session.
#[derive(Debug)]
pub struct InMemoryAuth {
    directory: Arc<AccountDirectory>,
    session: watch::Sender<Option<Session>>,
}

impl InMemoryAuth {
    pub fn new(directory: Arc<AccountDirectory>) -> Self {
        let (session, _) = watch::channel(None);
        Self { directory, session }
    }

    fn start_session(&self, email: &str, account: Account) -> Session {
        let session = Session {
            user_id: account.user_id,
            email: email.to_string(),
            display_name: account.display_name,
            signed_in_at: Utc::now(),
        };
        self.session.send_replace(Some(session.clone()));
        session
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        match self.directory.verify(&email, password) {
            Ok(account) => {
                info!("User {} signed in", account.user_id);
                Ok(self.start_session(&email, account))
            }
            Err(e) => {
                warn!("Sign in rejected: {}", e);
                Err(e)
            }
        }
    }

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let account = self.directory.register(&email, password, display_name)?;
        info!("Registered user {}", account.user_id);
        Ok(self.start_session(&email, account))
    }

    async fn sign_out(&self) {
        if let Some(previous) = self.session.send_replace(None) {
            info!("User {} signed out", previous.user_id);
        }
    }

    fn current_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in_from_another_client() {
        let directory = AccountDirectory::new();
        let alice = InMemoryAuth::new(directory.clone());
        let created = alice.sign_up("Alice@Example.com", "hunter22", "Alice").await.unwrap();
        assert_eq!(created.email, "alice@example.com");

        let other = InMemoryAuth::new(directory);
        let session = other.sign_in("alice@example.com", "hunter22").await.unwrap();
        assert_eq!(session.user_id, created.user_id);
        assert_eq!(other.current_session().map(|s| s.display_name), Some("Alice".to_string()));
    }

    #[tokio::test]
    async fn wrong_password_is_an_opaque_error() {
        let directory = AccountDirectory::new();
        let auth = InMemoryAuth::new(directory);
        auth.sign_up("bob@example.com", "secret1", "Bob").await.unwrap();
        auth.sign_out().await;

        let err = auth.sign_in("bob@example.com", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn passwords_are_stored_hashed() {
        let directory = AccountDirectory::new();
        let auth = InMemoryAuth::new(directory.clone());
        auth.sign_up("frank@example.com", "hunter22", "Frank").await.unwrap();

        let stored = directory.accounts.lock().unwrap()["frank@example.com"].password_hash.clone();
        assert_ne!(stored, "hunter22");
        assert!(!stored.contains("hunter22"));
        assert!(stored.starts_with("$argon2"));

        auth.sign_out().await;
        assert!(auth.sign_in("frank@example.com", "hunter22").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_and_malformed_sign_ups_are_rejected() {
        let auth = InMemoryAuth::new(AccountDirectory::new());
        auth.sign_up("carol@example.com", "secret1", "Carol").await.unwrap();

        assert!(auth.sign_up("carol@example.com", "secret2", "Carol").await.is_err());
        assert!(auth.sign_up("not-an-email", "secret1", "X").await.is_err());
        assert!(auth.sign_up("dan@example.com", "short", "Dan").await.is_err());
    }

    #[tokio::test]
    async fn subscribers_see_session_changes() {
        let auth = InMemoryAuth::new(AccountDirectory::new());
        let mut rx = auth.subscribe();
        assert!(rx.borrow().is_none());

        auth.sign_up("erin@example.com", "secret1", "Erin").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|s| s.email.clone()), Some("erin@example.com".to_string()));

        auth.sign_out().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
