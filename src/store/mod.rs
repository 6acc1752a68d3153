use log::{debug, info};
use thiserror::Error;

use crate::models::{NewPoll, Poll};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Poll {0} does not exist.")]
    NotFound(String),
    #[error("\"{option}\" is not an option on poll {poll_id}.")]
    InvalidOption { poll_id: String, option: String },
}

/// The polls of one session, most recent first.
#[derive(Debug, Default)]
pub struct PollStore {
    polls: Vec<Poll>,
}

impl PollStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, input: NewPoll) -> &Poll {
        let poll = Poll::new(input);
        info!("Created poll {} with {} options", poll.id, poll.options.len());
        self.polls.insert(0, poll);
        &self.polls[0]
    }

    /// Removes a poll. Returns false if there was nothing to remove.
    pub fn delete(&mut self, poll_id: &str) -> bool {
        let before = self.polls.len();
        self.polls.retain(|poll| poll.id != poll_id);
        let removed = self.polls.len() != before;
        if removed {
            info!("Deleted poll {}", poll_id);
        } else {
            debug!("Delete ignored, poll {} not found", poll_id);
        }
        removed
    }

    pub fn list(&self) -> &[Poll] {
        &self.polls
    }

    pub fn get(&self, poll_id: &str) -> Option<&Poll> {
        self.polls.iter().find(|poll| poll.id == poll_id)
    }

    pub fn contains(&self, poll_id: &str) -> bool {
        self.get(poll_id).is_some()
    }

    fn get_mut(&mut self, poll_id: &str) -> Result<&mut Poll, StoreError> {
        self.polls
            .iter_mut()
            .find(|poll| poll.id == poll_id)
            .ok_or_else(|| StoreError::NotFound(poll_id.to_string()))
    }

    /// Adds one vote to `option`, given as option text or option id.
    pub fn apply_vote(&mut self, poll_id: &str, option: &str) -> Result<&Poll, StoreError> {
        let poll = self.get_mut(poll_id)?;
        let Some(target) = poll.find_option_mut(option) else {
            return Err(StoreError::InvalidOption {
                poll_id: poll_id.to_string(),
                option: option.trim().to_string(),
            });
        };
        target.votes += 1;
        debug!("Vote recorded on poll {} for \"{}\"", poll_id, target.text);
        Ok(poll)
    }

    pub fn set_active(&mut self, poll_id: &str, active: bool) -> Result<&Poll, StoreError> {
        let poll = self.get_mut(poll_id)?;
        poll.is_active = active;
        info!("Poll {} is now {}", poll_id, poll.status_label());
        Ok(poll)
    }

    pub fn toggle_active(&mut self, poll_id: &str) -> Result<&Poll, StoreError> {
        let active = self.get_mut(poll_id)?.is_active;
        self.set_active(poll_id, !active)
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }

    pub fn total_votes_across_all_polls(&self) -> u64 {
        self.polls.iter().map(Poll::total_votes).sum()
    }

    pub fn active_poll_count(&self) -> usize {
        self.polls.iter().filter(|poll| poll.is_active).count()
    }

    /// Rounded mean of votes per poll, 0 for an empty store.
    pub fn average_votes_per_poll(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (self.total_votes_across_all_polls() as f64 / self.polls.len() as f64).round() as u64
    }
}
