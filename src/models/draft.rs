use super::{usable_options, validate_new_poll, NewPoll, ValidationError, MAX_OPTIONS, MIN_OPTIONS};

/// Form state for composing a poll before it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub title: String,
    pub description: String,
    options: Vec<String>,
}

impl Default for PollDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            options: vec![String::new(); MIN_OPTIONS],
        }
    }
}

impl PollDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Appends an empty slot. Returns false once six slots exist.
    pub fn add_option(&mut self) -> bool {
        if self.options.len() >= MAX_OPTIONS {
            return false;
        }
        self.options.push(String::new());
        true
    }

    pub fn update_option(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.options.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Writes each usable value into its own slot, opening slots as needed.
    /// Fails without touching the form when the values need more than six.
    pub fn fill_options(&mut self, values: &[String]) -> Result<(), ValidationError> {
        let values = usable_options(values);
        if values.len() > MAX_OPTIONS {
            return Err(ValidationError::TooManyOptions { found: values.len() });
        }
        for (index, value) in values.into_iter().enumerate() {
            if index >= self.options.len() {
                self.add_option();
            }
            self.update_option(index, value);
        }
        Ok(())
    }

    pub fn submit(&self) -> Result<NewPoll, ValidationError> {
        validate_new_poll(&self.title, Some(&self.description), &self.options)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
