//! Plain-text renderings of dashboard data for chat messages.

use serde::Serialize;

use crate::dashboard::{DashboardStats, ResultsView, ShareView};
use crate::models::Poll;
use crate::voting::{render_bar, PollResults};

// Discord limits, counted in characters
pub const MESSAGE_MAX: usize = 2000;
pub const EMBED_TITLE_MAX: usize = 256;
pub const FIELD_VALUE_MAX: usize = 1024;
// Kept well under the 4096 limit so a whole embed stays below 6000
const EMBED_DESCRIPTION_MAX: usize = 512;
const RANKED_OPTION_MAX: usize = 150;

const BAR_WIDTH: usize = 12;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Cuts `text` to at most `max` characters, marking the cut with `...`.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Embed content kept apart from the chat builder types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<(String, String, bool)>,
    pub footer: String,
}

impl Card {
    fn field(&mut self, name: &str, value: impl AsRef<str>, inline: bool) {
        self.fields.push((name.to_string(), clip(value.as_ref(), FIELD_VALUE_MAX), inline));
    }
}

pub fn results_card(view: &ResultsView) -> Card {
    let poll = &view.poll;
    let mut card = Card {
        title: clip(&format!("Poll Results: {}", poll.title), EMBED_TITLE_MAX),
        url: None,
        description: poll.description.as_deref().map(|d| clip(d, EMBED_DESCRIPTION_MAX)),
        fields: Vec::new(),
        footer: format!("Poll ID: {}", poll.id),
    };
    card.field("Total Votes", view.results.total_votes.to_string(), true);
    card.field("Leading Option", leading_option(view), true);
    card.field("Status", format!("{}\nCreated {}", poll.status_label(), created_on(poll)), true);
    if let Some(chart) = distribution(view) {
        card.field("Vote Distribution", chart, false);
        card.field("Detailed Results", breakdown(view), false);
    }
    card
}

pub fn share_card(poll: &Poll, view: &ShareView) -> Card {
    let description = match &poll.description {
        Some(details) => format!("{}\n{}", view.target.text, details),
        None => view.target.text.clone(),
    };
    let mut card = Card {
        title: clip(&view.target.title, EMBED_TITLE_MAX),
        url: Some(view.target.url.clone()),
        description: Some(clip(&description, EMBED_DESCRIPTION_MAX)),
        fields: Vec::new(),
        footer: "Scan the QR code or tap an option to vote".to_string(),
    };
    card.field("Poll ID", &poll.id, false);
    card
}

pub fn created_on(poll: &Poll) -> String {
    poll.created_at.format(DATE_FORMAT).to_string()
}

/// One line per poll card: title, status, counts and id.
pub fn poll_list(polls: &[Poll]) -> String {
    if polls.is_empty() {
        return "**No polls yet**\nGet started by creating your first poll with `/poll create`. \
                You can share it with others using a link or QR code."
            .to_string();
    }

    let mut out = String::from("**Your Polls**\n");
    for poll in polls {
        out.push_str(&format!(
            "\n**{}** [{}]\n{} votes · {} options · Created {}\nID: `{}`\n",
            poll.title,
            poll.status_label(),
            poll.total_votes(),
            poll.options.len(),
            created_on(poll),
            poll.id,
        ));
        if let Some(description) = &poll.description {
            out.push_str(&format!("> {}\n", description));
        }
    }
    out
}

pub fn stats(stats: &DashboardStats) -> String {
    format!(
        "**Total Polls:** {} ({} active polls)\n**Total Votes:** {} across all polls\n**Engagement:** {} avg votes per poll",
        stats.total_polls, stats.active_polls, stats.total_votes, stats.average_votes_per_poll,
    )
}

pub fn leading_option(view: &ResultsView) -> String {
    match &view.results.winner {
        Some((option, votes)) => format!("{}\n{} votes", clip(option, RANKED_OPTION_MAX), votes),
        None => "No votes yet\n0 votes".to_string(),
    }
}

/// Bar chart of the vote distribution, or `None` before the first vote.
pub fn distribution(view: &ResultsView) -> Option<String> {
    if view.results.total_votes == 0 {
        return None;
    }
    let lines: Vec<String> = view
        .results
        .series
        .iter()
        .map(|point| {
            format!(
                "`{}` {} {}% ({})",
                render_bar(point.percentage, BAR_WIDTH),
                point.label,
                point.percentage,
                point.votes
            )
        })
        .collect();
    Some(lines.join("\n"))
}

/// Ranked breakdown, best first.
pub fn breakdown(view: &ResultsView) -> String {
    view.results
        .ranking
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. {} ({} votes, {}%)",
                i + 1,
                clip(&entry.option, RANKED_OPTION_MAX),
                entry.votes,
                entry.percentage
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct ResultsExport<'a> {
    poll: &'a Poll,
    total_votes: u64,
    results: &'a PollResults,
}

/// Poll plus derived results as pretty-printed JSON.
pub fn export_json(view: &ResultsView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ResultsExport {
        poll: &view.poll,
        total_votes: view.results.total_votes,
        results: &view.results,
    })
}
