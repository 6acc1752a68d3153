use crate::models::Poll;
use crate::voting::{ChartPoint, PollResults, RankedOption, CHART_LABEL_MAX};

/// Share of `total_votes` held by one option, rounded to a whole percent.
///
/// Zero total means zero percent, not an error.
pub fn percentage_of(option_votes: u64, total_votes: u64) -> u8 {
    if total_votes == 0 {
        return 0;
    }
    let pct = (option_votes as f64 / total_votes as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Options ordered by votes, highest first. Equal counts keep the order the
/// options were declared in.
pub fn rank_options(poll: &Poll) -> Vec<RankedOption> {
    let total = poll.total_votes();
    let mut ranked: Vec<RankedOption> = poll
        .votes()
        .into_iter()
        .map(|(option, votes)| RankedOption {
            option: option.to_string(),
            votes,
            percentage: percentage_of(votes, total),
        })
        .collect();

    // slice::sort_by is stable
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
    ranked
}

/// The leading option, or `None` while nobody has voted.
pub fn winning_option(poll: &Poll) -> Option<(String, u64)> {
    if poll.total_votes() == 0 {
        return None;
    }
    rank_options(poll)
        .into_iter()
        .next()
        .map(|top| (top.option, top.votes))
}

/// Bars for the distribution chart in declaration order. Labels are cut for
/// display; the option itself is untouched.
pub fn chart_series(poll: &Poll) -> Vec<ChartPoint> {
    let total = poll.total_votes();
    poll.votes()
        .into_iter()
        .map(|(option, votes)| ChartPoint {
            label: truncate_label(option, CHART_LABEL_MAX),
            votes,
            percentage: percentage_of(votes, total),
        })
        .collect()
}

pub fn summarize(poll: &Poll) -> PollResults {
    let total_votes = poll.total_votes();
    let ranking = rank_options(poll);
    let winner = winning_option(poll);

    if total_votes == 0 {
        return PollResults {
            winner: None,
            series: chart_series(poll),
            ranking,
            total_votes,
            summary: "No votes yet.".to_string(),
        };
    }

    let winner_name = winner.as_ref().map(|(name, _)| name.as_str());
    let mut summary = String::new();
    for entry in &ranking {
        // Format the line differently for the winner
        let line = if Some(entry.option.as_str()) == winner_name {
            format!("**{}**: {} votes ({}%)", entry.option, entry.votes, entry.percentage)
        } else {
            format!("{}: {} votes ({}%)", entry.option, entry.votes, entry.percentage)
        };
        summary.push_str(&line);
        summary.push('\n');
    }
    summary.push_str(&format!("\n{} votes cast.", total_votes));

    PollResults {
        winner,
        series: chart_series(poll),
        ranking,
        total_votes,
        summary,
    }
}

/// Text progress bar, `width` cells wide.
pub fn render_bar(percentage: u8, width: usize) -> String {
    let filled = (usize::from(percentage.min(100)) * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{validate_new_poll, Poll};

    fn poll_with(tally: &[(&str, u64)]) -> Poll {
        let options: Vec<String> = tally.iter().map(|(name, _)| name.to_string()).collect();
        let mut poll = Poll::new(validate_new_poll("Test", None, &options).unwrap());
        for (option, (_, votes)) in poll.options.iter_mut().zip(tally) {
            option.votes = *votes;
        }
        poll
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage_of(0, 0), 0);
        assert_eq!(percentage_of(7, 0), 0);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(1, 8), 13);
        assert_eq!(percentage_of(4, 4), 100);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let poll = poll_with(&[("A", 5), ("B", 5), ("C", 3)]);
        let order: Vec<String> = rank_options(&poll).into_iter().map(|r| r.option).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn ranking_sorts_descending() {
        let poll = poll_with(&[("A", 1), ("B", 4), ("C", 2)]);
        let order: Vec<(String, u64)> = rank_options(&poll).into_iter().map(|r| (r.option, r.votes)).collect();
        assert_eq!(order, vec![("B".into(), 4), ("C".into(), 2), ("A".into(), 1)]);
    }

    #[test]
    fn no_winner_without_votes() {
        assert_eq!(winning_option(&poll_with(&[("A", 0), ("B", 0)])), None);
    }

    #[test]
    fn winner_is_highest_count() {
        assert_eq!(winning_option(&poll_with(&[("A", 3), ("B", 7)])), Some(("B".to_string(), 7)));
    }

    #[test]
    fn percentages_are_not_forced_to_sum_to_100() {
        let poll = poll_with(&[("A", 1), ("B", 1), ("C", 1)]);
        let sum: u32 = rank_options(&poll).iter().map(|r| u32::from(r.percentage)).sum();
        assert_eq!(sum, 99);
    }

    #[test]
    fn chart_labels_are_truncated_but_options_are_not() {
        let long = "An extremely long option label here";
        let poll = poll_with(&[(long, 2), ("Short", 2)]);
        let series = chart_series(&poll);

        assert_eq!(series[0].label, "An extremely long op...");
        assert_eq!(series[0].percentage, 50);
        assert_eq!(series[1].label, "Short");
        assert_eq!(poll.options[0].text, long);
        assert_eq!(rank_options(&poll)[0].option, long);
    }

    #[test]
    fn summary_marks_the_winner() {
        let results = summarize(&poll_with(&[("Pizza", 3), ("Salad", 1)]));
        assert_eq!(results.winner, Some(("Pizza".to_string(), 3)));
        assert!(results.summary.starts_with("**Pizza**: 3 votes (75%)\nSalad: 1 votes (25%)"));
        assert_eq!(results.total_votes, 4);
    }

    #[test]
    fn summary_without_votes() {
        let results = summarize(&poll_with(&[("A", 0), ("B", 0)]));
        assert_eq!(results.winner, None);
        assert_eq!(results.summary, "No votes yet.");
        assert_eq!(results.series.len(), 2);
    }

    #[test]
    fn bars_scale_with_percentage() {
        assert_eq!(render_bar(0, 10), "░░░░░░░░░░");
        assert_eq!(render_bar(75, 4), "███░");
        assert_eq!(render_bar(100, 3), "███");
    }
}
