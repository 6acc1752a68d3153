mod draft;

pub use draft::PollDraft;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poll {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub options: Vec<PollOption>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// One choice on a poll together with its tally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    pub votes: u64,
}

/// Validated input for a poll that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    pub title: String,
    pub description: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please give your poll a question.")]
    EmptyTitle,
    #[error("Please provide at least 2 options for your poll (got {found}).")]
    InvalidOptionCount { found: usize },
    #[error("A poll can have at most 6 options (got {found}).")]
    TooManyOptions { found: usize },
}

/// Checks user-submitted poll fields and normalizes them.
///
/// Options are trimmed, blanks are dropped and repeats collapse onto their
/// first occurrence. At least two options must survive; more than six are
/// rejected rather than silently truncated.
pub fn validate_new_poll(
    title: &str,
    description: Option<&str>,
    raw_options: &[String],
) -> Result<NewPoll, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let options = usable_options(raw_options);
    if options.len() < MIN_OPTIONS {
        return Err(ValidationError::InvalidOptionCount { found: options.len() });
    }
    if options.len() > MAX_OPTIONS {
        return Err(ValidationError::TooManyOptions { found: options.len() });
    }

    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(NewPoll {
        title: title.to_string(),
        description,
        options,
    })
}

/// Trimmed, non-blank options with repeats dropped, in the order given.
pub fn usable_options(raw_options: &[String]) -> Vec<String> {
    let mut options: Vec<String> = Vec::with_capacity(raw_options.len());
    for raw in raw_options {
        let text = raw.trim();
        if text.is_empty() || options.iter().any(|existing| existing == text) {
            continue;
        }
        options.push(text.to_string());
    }
    options
}

/// Zero tally for each option, in declaration order.
pub fn initialize_votes(options: &[String]) -> Vec<PollOption> {
    options
        .iter()
        .map(|text| PollOption {
            id: Uuid::new_v4().simple().to_string(),
            text: text.clone(),
            votes: 0,
        })
        .collect()
}

impl Poll {
    pub fn new(input: NewPoll) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            title: input.title,
            description: input.description,
            options: initialize_votes(&input.options),
            created_at: Utc::now(),
            is_active: true,
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|option| option.votes).sum()
    }

    /// The tally as (option text, count) pairs in declaration order.
    pub fn votes(&self) -> Vec<(&str, u64)> {
        self.options
            .iter()
            .map(|option| (option.text.as_str(), option.votes))
            .collect()
    }

    /// Finds an option by its generated id or by its (trimmed) text.
    pub fn find_option(&self, key: &str) -> Option<&PollOption> {
        let key = key.trim();
        self.options
            .iter()
            .find(|option| option.id == key || option.text == key)
    }

    pub(crate) fn find_option_mut(&mut self, key: &str) -> Option<&mut PollOption> {
        let key = key.trim();
        self.options
            .iter_mut()
            .find(|option| option.id == key || option.text == key)
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active { "Active" } else { "Closed" }
    }
}
