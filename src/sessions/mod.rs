use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::auth::{AccountDirectory, AuthError, AuthProvider, InMemoryAuth, Session};
use crate::dashboard::Dashboard;
use crate::error::PollError;
use crate::models::Poll;
use crate::share::QrEncoder;
use crate::store::StoreError;

/// Why a public vote button press was turned away.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoteRejection {
    #[error("This poll has ended.")]
    PollClosed,
    #[error("You have already voted in this poll.")]
    AlreadyVoted,
    #[error(transparent)]
    Poll(#[from] PollError),
}

struct Client {
    auth: Arc<dyn AuthProvider>,
    session: watch::Receiver<Option<Session>>,
    dashboard: Option<Dashboard>,
    last_seen: DateTime<Utc>,
}

/// Every chat user's auth client and dashboard, keyed by chat user id.
pub struct SessionRegistry {
    directory: Arc<AccountDirectory>,
    origin: String,
    qr_encoder: Arc<dyn QrEncoder>,
    clients: HashMap<u64, Client>,
    ballots: HashSet<(String, u64)>,
}

impl SessionRegistry {
    pub fn new(directory: Arc<AccountDirectory>, origin: impl Into<String>, qr_encoder: Arc<dyn QrEncoder>) -> Self {
        Self {
            directory,
            origin: origin.into(),
            qr_encoder,
            clients: HashMap::new(),
            ballots: HashSet::new(),
        }
    }

    /// The user's auth client, created on first use.
    fn auth_client(&mut self, user: u64) -> Arc<dyn AuthProvider> {
        let directory = &self.directory;
        let client = self.clients.entry(user).or_insert_with(|| {
            let auth = InMemoryAuth::new(Arc::clone(directory));
            let session = auth.subscribe();
            Client {
                auth: Arc::new(auth),
                session,
                dashboard: None,
                last_seen: Utc::now(),
            }
        });
        client.last_seen = Utc::now();
        Arc::clone(&client.auth)
    }

    // The registry lock is only held around bookkeeping, never across the
    // auth backend's awaits.

    pub async fn sign_up(
        sessions: &Mutex<Self>,
        user: u64,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        let auth = sessions.lock().await.auth_client(user);
        let session = auth.sign_up(email, password, name).await?;
        sessions.lock().await.attach_dashboard(user);
        Ok(session)
    }

    pub async fn sign_in(sessions: &Mutex<Self>, user: u64, email: &str, password: &str) -> Result<Session, AuthError> {
        let auth = sessions.lock().await.auth_client(user);
        let session = auth.sign_in(email, password).await?;
        sessions.lock().await.attach_dashboard(user);
        Ok(session)
    }

    /// Ends the user's session and discards their polls. Returns false if
    /// nobody was signed in.
    pub async fn sign_out(sessions: &Mutex<Self>, user: u64) -> bool {
        let Some(auth) = sessions.lock().await.end_session(user) else {
            return false;
        };
        let was_signed_in = auth.current_session().is_some();
        auth.sign_out().await;
        was_signed_in
    }

    fn end_session(&mut self, user: u64) -> Option<Arc<dyn AuthProvider>> {
        let client = self.clients.remove(&user)?;
        if let Some(dashboard) = &client.dashboard {
            self.forget_ballots(dashboard.polls().iter().map(|poll| poll.id.as_str()));
        }
        Some(client.auth)
    }

    pub fn whoami(&self, user: u64) -> Option<Session> {
        self.clients.get(&user).and_then(|client| client.auth.current_session())
    }

    /// The user's dashboard, if they are signed in.
    pub fn dashboard_mut(&mut self, user: u64) -> Option<&mut Dashboard> {
        let client = self.clients.get_mut(&user)?;
        client.last_seen = Utc::now();
        if client.session.borrow().is_none() {
            return None;
        }
        client.dashboard.as_mut()
    }

    /// Opens a dashboard for the session the user's auth client reports.
    /// Signing in as a different account starts from an empty store.
    fn attach_dashboard(&mut self, user: u64) {
        let Some(client) = self.clients.get_mut(&user) else {
            return;
        };
        let Some(session) = client.session.borrow_and_update().clone() else {
            return;
        };
        let same_account = client
            .dashboard
            .as_ref()
            .is_some_and(|dashboard| dashboard.session().user_id == session.user_id);
        if !same_account {
            info!("Opening dashboard for {} ({})", session.display_name, session.user_id);
            client.dashboard = Some(Dashboard::new(session, self.origin.clone(), Arc::clone(&self.qr_encoder)));
        }
    }

    /// Deletes one of the user's polls along with the ballots cast on it.
    /// Returns `None` when the user is not signed in.
    pub fn delete_poll(&mut self, user: u64, poll_id: &str) -> Option<bool> {
        let deleted = self.dashboard_mut(user)?.delete_poll(poll_id);
        if deleted {
            self.forget_ballots([poll_id]);
        }
        Some(deleted)
    }

    /// Records a public vote on whichever dashboard owns `poll_id`. A vote
    /// that lands counts as activity for the poll's owner.
    pub fn cast_public_vote(&mut self, poll_id: &str, option_id: &str, voter: u64) -> Result<Poll, VoteRejection> {
        let owner = self
            .clients
            .values_mut()
            .find(|client| {
                client
                    .dashboard
                    .as_ref()
                    .is_some_and(|dashboard| dashboard.store().contains(poll_id))
            })
            .ok_or_else(|| PollError::from(StoreError::NotFound(poll_id.to_string())))?;
        let Some(dashboard) = owner.dashboard.as_mut() else {
            return Err(PollError::from(StoreError::NotFound(poll_id.to_string())).into());
        };

        let is_active = dashboard.store().get(poll_id).is_some_and(|poll| poll.is_active);
        if !is_active {
            return Err(VoteRejection::PollClosed);
        }
        let ballot = (poll_id.to_string(), voter);
        if self.ballots.contains(&ballot) {
            return Err(VoteRejection::AlreadyVoted);
        }

        let poll = dashboard.cast_vote(poll_id, option_id)?;
        owner.last_seen = Utc::now();
        self.ballots.insert(ballot);
        Ok(poll)
    }

    /// Drops sessions idle for longer than `max_idle`. Returns the users
    /// whose sessions were removed.
    pub fn reap_idle(&mut self, now: DateTime<Utc>, max_idle: Duration) -> Vec<u64> {
        let expired: Vec<u64> = self
            .clients
            .iter()
            .filter(|(_, client)| now - client.last_seen > max_idle)
            .map(|(user, _)| *user)
            .collect();

        for user in &expired {
            if let Some(client) = self.clients.remove(user) {
                if let Some(dashboard) = client.dashboard {
                    warn!("Session for user {} expired with {} poll(s)", user, dashboard.polls().len());
                    self.forget_ballots(dashboard.polls().iter().map(|poll| poll.id.as_str()));
                }
            }
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    fn forget_ballots<'a>(&mut self, poll_ids: impl IntoIterator<Item = &'a str>) {
        let gone: HashSet<&str> = poll_ids.into_iter().collect();
        self.ballots.retain(|(poll_id, _)| !gone.contains(poll_id.as_str()));
    }

    #[cfg(test)]
    fn backdate(&mut self, user: u64, by: Duration) {
        if let Some(client) = self.clients.get_mut(&user) {
            client.last_seen = client.last_seen - by;
        }
    }
}
