pub mod plurality;

pub use plurality::{render_bar, summarize};

use serde::Serialize;

/// Longest option label shown on a chart axis before it is cut.
pub const CHART_LABEL_MAX: usize = 20;

/// An option's place in the results, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedOption {
    pub option: String,
    pub votes: u64,
    pub percentage: u8,
}

/// One bar of the vote distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub votes: u64,
    pub percentage: u8,
}

// Generic structure for poll results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResults {
    pub winner: Option<(String, u64)>, // None until at least one vote is in
    pub ranking: Vec<RankedOption>,
    pub series: Vec<ChartPoint>,
    pub total_votes: u64,
    pub summary: String, // Detailed results as formatted text
}
