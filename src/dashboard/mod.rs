use std::sync::Arc;

use log::{info, warn};

use crate::auth::Session;
use crate::error::PollError;
use crate::models::{NewPoll, Poll, PollDraft, ValidationError};
use crate::share::{self, QrEncoder, QrImage, QrRenderOptions, ShareTarget};
use crate::store::{PollStore, StoreError};
use crate::voting::{self, PollResults};

/// Which dialog is open. Polls are referenced by id and looked up again
/// whenever the dialog is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Closed,
    Create(PollDraft),
    Results { poll_id: String },
    Share { poll_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl Notification {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self { title: title.to_string(), description: description.into(), destructive: false }
    }

    fn error(title: &str, description: impl Into<String>) -> Self {
        Self { title: title.to_string(), description: description.into(), destructive: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_polls: usize,
    pub active_polls: usize,
    pub total_votes: u64,
    pub average_votes_per_poll: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub poll: Poll,
    pub results: PollResults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareView {
    pub poll_id: String,
    pub target: ShareTarget,
    pub qr: Option<QrImage>,
    pub qr_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogView {
    Create(PollDraft),
    Results(ResultsView),
    Share(ShareView),
}

/// One signed-in user's poll dashboard.
pub struct Dashboard {
    session: Session,
    store: PollStore,
    dialog: Dialog,
    notifications: Vec<Notification>,
    origin: String,
    qr_encoder: Arc<dyn QrEncoder>,
}

impl Dashboard {
    pub fn new(session: Session, origin: impl Into<String>, qr_encoder: Arc<dyn QrEncoder>) -> Self {
        Self {
            session,
            store: PollStore::new(),
            dialog: Dialog::Closed,
            notifications: Vec::new(),
            origin: origin.into(),
            qr_encoder,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &PollStore {
        &self.store
    }

    pub fn polls(&self) -> &[Poll] {
        self.store.list()
    }

    pub fn open_create(&mut self) -> &mut PollDraft {
        if !matches!(self.dialog, Dialog::Create(_)) {
            self.dialog = Dialog::Create(PollDraft::new());
        }
        match &mut self.dialog {
            Dialog::Create(draft) => draft,
            _ => unreachable!("create dialog was just opened"),
        }
    }

    /// Submits the open create dialog. On failure the dialog stays open.
    pub fn submit_create(&mut self) -> Result<Poll, PollError> {
        let input = match &self.dialog {
            Dialog::Create(draft) => draft.submit(),
            _ => PollDraft::new().submit(),
        };
        self.finish_create(input)
    }

    /// Fills a fresh create dialog from one complete form and submits it.
    pub fn create_poll(
        &mut self,
        title: &str,
        description: Option<&str>,
        options: &[String],
    ) -> Result<Poll, PollError> {
        let draft = self.open_create();
        draft.reset();
        draft.set_title(title);
        draft.set_description(description.unwrap_or_default());
        if let Err(e) = draft.fill_options(options) {
            return self.finish_create(Err(e));
        }
        self.submit_create()
    }

    fn finish_create(&mut self, input: Result<NewPoll, ValidationError>) -> Result<Poll, PollError> {
        match input {
            Ok(input) => {
                let poll = self.store.create(input).clone();
                self.dialog = Dialog::Closed;
                self.notifications.push(Notification::info(
                    "Poll created!",
                    "Your poll has been created successfully and is now live.",
                ));
                Ok(poll)
            }
            Err(e) => {
                let err = PollError::from(e);
                self.report(&err);
                Err(err)
            }
        }
    }

    pub fn view_results(&mut self, poll_id: &str) -> Result<ResultsView, PollError> {
        let view = self.results_for(poll_id).inspect_err(|e| self.report(e))?;
        self.dialog = Dialog::Results { poll_id: poll_id.to_string() };
        Ok(view)
    }

    pub fn share(&mut self, poll_id: &str) -> Result<ShareView, PollError> {
        let view = self.share_for(poll_id).inspect_err(|e| self.report(e))?;
        self.dialog = Dialog::Share { poll_id: poll_id.to_string() };
        Ok(view)
    }

    /// Renders the open dialog from the current store contents. A dialog
    /// whose poll is gone is closed.
    pub fn current_view(&mut self) -> Option<DialogView> {
        let view = match &self.dialog {
            Dialog::Closed => return None,
            Dialog::Create(draft) => Ok(DialogView::Create(draft.clone())),
            Dialog::Results { poll_id } => self.results_for(poll_id).map(DialogView::Results),
            Dialog::Share { poll_id } => self.share_for(poll_id).map(DialogView::Share),
        };
        match view {
            Ok(view) => Some(view),
            Err(_) => {
                self.dialog = Dialog::Closed;
                None
            }
        }
    }

    pub fn delete_poll(&mut self, poll_id: &str) -> bool {
        let removed = self.store.delete(poll_id);
        let selected = match &self.dialog {
            Dialog::Results { poll_id: id } | Dialog::Share { poll_id: id } => id == poll_id,
            _ => false,
        };
        if selected {
            self.dialog = Dialog::Closed;
        }
        if removed {
            self.notifications.push(Notification::info("Poll deleted", "The poll has been removed."));
        }
        removed
    }

    pub fn toggle_poll(&mut self, poll_id: &str) -> Result<Poll, PollError> {
        let poll = self
            .store
            .toggle_active(poll_id)
            .map(Poll::clone)
            .map_err(PollError::from)
            .inspect_err(|e| self.report(e))?;
        self.notifications.push(Notification::info(
            if poll.is_active { "Poll reopened" } else { "Poll closed" },
            format!("\"{}\" is now {}.", poll.title, poll.status_label().to_lowercase()),
        ));
        Ok(poll)
    }

    /// Applies a vote from one of the poll's voters. Rejections go back to the
    /// voter and are not queued as the owner's notifications.
    pub fn cast_vote(&mut self, poll_id: &str, option: &str) -> Result<Poll, PollError> {
        self.store
            .apply_vote(poll_id, option)
            .map(Poll::clone)
            .map_err(PollError::from)
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            total_polls: self.store.len(),
            active_polls: self.store.active_poll_count(),
            total_votes: self.store.total_votes_across_all_polls(),
            average_votes_per_poll: self.store.average_votes_per_poll(),
        }
    }

    /// Queues a user-facing notification for `err`.
    pub fn report(&mut self, err: &PollError) {
        warn!("Rejected action for user {}: {}", self.session.user_id, err);
        self.notifications.push(Notification::error(err.title(), err.to_string()));
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn results_for(&self, poll_id: &str) -> Result<ResultsView, PollError> {
        let poll = self.lookup(poll_id)?;
        Ok(ResultsView {
            results: voting::summarize(poll),
            poll: poll.clone(),
        })
    }

    fn share_for(&self, poll_id: &str) -> Result<ShareView, PollError> {
        let poll = self.lookup(poll_id)?;
        let target = share::share_target(&self.origin, poll);
        let qr = match self.qr_encoder.encode(&target.url, &QrRenderOptions::default()) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Error generating QR code for poll {}: {}", poll_id, e);
                None
            }
        };
        info!("Prepared share link for poll {}", poll_id);
        Ok(ShareView {
            poll_id: poll.id.clone(),
            qr_file_name: share::qr_file_name(&poll.id),
            target,
            qr,
        })
    }

    fn lookup(&self, poll_id: &str) -> Result<&Poll, PollError> {
        self.store
            .get(poll_id)
            .ok_or_else(|| StoreError::NotFound(poll_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::{RemoteQrEncoder, ShareError};
    use chrono::Utc;

    struct FailingQr;

    impl QrEncoder for FailingQr {
        fn encode(&self, _data: &str, _options: &QrRenderOptions) -> Result<QrImage, ShareError> {
            Err(ShareError::QrEncoding("offline".to_string()))
        }
    }

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            display_name: "User One".to_string(),
            signed_in_at: Utc::now(),
        }
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(
            session(),
            "https://pollshare.app",
            Arc::new(RemoteQrEncoder::new("https://qr.example/create")),
        )
    }

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn lunch_poll_end_to_end() {
        let mut dash = dashboard();
        let poll = dash.create_poll("Lunch?", None, &opts(&["Pizza", "Salad"])).unwrap();

        assert_eq!(dash.polls().len(), 1);
        assert_eq!(dash.polls()[0].votes(), vec![("Pizza", 0), ("Salad", 0)]);
        assert_eq!(dash.polls()[0].total_votes(), 0);

        for _ in 0..3 {
            dash.cast_vote(&poll.id, "Pizza").unwrap();
        }
        dash.cast_vote(&poll.id, "Salad").unwrap();

        let view = dash.view_results(&poll.id).unwrap();
        let ranking: Vec<(String, u64, u8)> = view
            .results
            .ranking
            .into_iter()
            .map(|r| (r.option, r.votes, r.percentage))
            .collect();
        assert_eq!(ranking, vec![("Pizza".into(), 3, 75), ("Salad".into(), 1, 25)]);
        assert_eq!(view.results.winner, Some(("Pizza".to_string(), 3)));
    }

    #[test]
    fn create_dialog_flow() {
        let mut dash = dashboard();
        let draft = dash.open_create();
        draft.set_title("Meeting time?");
        draft.update_option(0, "Monday");

        let err = dash.submit_create().unwrap_err();
        assert_eq!(err, PollError::Validation(ValidationError::InvalidOptionCount { found: 1 }));
        assert!(matches!(dash.dialog, Dialog::Create(_)));
        let toast = dash.drain_notifications().pop().unwrap();
        assert!(toast.destructive);
        assert_eq!(toast.title, "Invalid poll");

        dash.open_create().update_option(1, "Friday");
        let poll = dash.submit_create().unwrap();
        assert_eq!(poll.title, "Meeting time?");
        assert_eq!(dash.dialog, Dialog::Closed);
        assert_eq!(dash.drain_notifications()[0].title, "Poll created!");
    }

    #[test]
    fn seven_options_are_rejected() {
        let mut dash = dashboard();
        let err = dash
            .create_poll("Letters", None, &opts(&["a", "b", "c", "d", "e", "f", "g"]))
            .unwrap_err();
        assert_eq!(err, PollError::Validation(ValidationError::TooManyOptions { found: 7 }));
        assert!(dash.polls().is_empty());
        assert_eq!(dash.drain_notifications()[0].title, "Invalid poll");
    }

    #[test]
    fn one_shot_create_goes_through_the_form() {
        let mut dash = dashboard();
        dash.open_create().set_title("Stale draft");

        let poll = dash
            .create_poll("Lunch?", Some("  "), &opts(&["Pizza", "Salad", "Soup", "Tacos"]))
            .unwrap();
        assert_eq!(poll.title, "Lunch?");
        assert_eq!(poll.description, None);
        assert_eq!(poll.options.len(), 4);
        assert_eq!(dash.dialog, Dialog::Closed);

        dash.create_poll("Half done", None, &opts(&["Only"])).unwrap_err();
        match dash.current_view() {
            Some(DialogView::Create(draft)) => assert_eq!(draft.title, "Half done"),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn rejected_votes_do_not_notify_the_owner() {
        let mut dash = dashboard();
        let poll = dash.create_poll("Q", None, &opts(&["A", "B"])).unwrap();
        dash.drain_notifications();

        assert!(matches!(
            dash.cast_vote(&poll.id, "C"),
            Err(PollError::Store(StoreError::InvalidOption { .. }))
        ));
        assert!(dash.drain_notifications().is_empty());
        assert_eq!(dash.polls()[0].total_votes(), 0);
    }

    #[test]
    fn results_view_tracks_store_and_closes_on_delete() {
        let mut dash = dashboard();
        let poll = dash.create_poll("Q", None, &opts(&["A", "B"])).unwrap();
        dash.view_results(&poll.id).unwrap();

        dash.cast_vote(&poll.id, "B").unwrap();
        match dash.current_view() {
            Some(DialogView::Results(view)) => assert_eq!(view.results.total_votes, 1),
            other => panic!("unexpected view {:?}", other),
        }

        assert!(dash.delete_poll(&poll.id));
        assert_eq!(dash.dialog, Dialog::Closed);
        assert!(dash.current_view().is_none());
        assert!(!dash.delete_poll(&poll.id));
    }

    #[test]
    fn share_builds_link_and_qr() {
        let mut dash = dashboard();
        let poll = dash.create_poll("Lunch?", Some("Friday"), &opts(&["Pizza", "Salad"])).unwrap();
        let view = dash.share(&poll.id).unwrap();

        assert_eq!(view.target.url, format!("https://pollshare.app/poll/{}", poll.id));
        assert!(view.qr.is_some());
        assert_eq!(dash.dialog, Dialog::Share { poll_id: poll.id.clone() });
    }

    #[test]
    fn share_without_qr_still_yields_link() {
        let mut dash = Dashboard::new(session(), "https://pollshare.app", Arc::new(FailingQr));
        let poll = dash.create_poll("Q", None, &opts(&["A", "B"])).unwrap();
        let view = dash.share(&poll.id).unwrap();
        assert!(view.qr.is_none());
        assert!(view.target.url.ends_with(&poll.id));
    }

    #[test]
    fn errors_become_notifications() {
        let mut dash = dashboard();
        let poll = dash.create_poll("Q", None, &opts(&["A", "B"])).unwrap();
        dash.drain_notifications();

        assert!(matches!(dash.view_results("missing"), Err(PollError::Store(StoreError::NotFound(_)))));
        dash.toggle_poll("missing").unwrap_err();
        let titles: Vec<String> = dash.drain_notifications().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Poll not found", "Poll not found"]);
        assert_eq!(dash.polls()[0].total_votes(), 0);
    }

    #[test]
    fn stats_fold_over_store() {
        let mut dash = dashboard();
        let a = dash.create_poll("A", None, &opts(&["x", "y"])).unwrap();
        dash.create_poll("B", None, &opts(&["x", "y"])).unwrap();
        dash.cast_vote(&a.id, "x").unwrap();
        dash.toggle_poll(&a.id).unwrap();

        assert_eq!(
            dash.stats(),
            DashboardStats { total_polls: 2, active_polls: 1, total_votes: 1, average_votes_per_poll: 1 }
        );
    }
}
