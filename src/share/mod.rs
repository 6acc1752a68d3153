mod qr;

pub use qr::{QrEncoder, QrImage, QrRenderOptions, RemoteQrEncoder};

use thiserror::Error;

use crate::models::Poll;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("Could not generate a QR code: {0}")]
    QrEncoding(String),
}

/// What a native share sheet receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTarget {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Canonical address of a poll: `<origin>/poll/<id>`.
pub fn share_url(origin: &str, poll_id: &str) -> String {
    format!("{}/poll/{}", origin.trim_end_matches('/'), poll_id)
}

pub fn share_target(origin: &str, poll: &Poll) -> ShareTarget {
    ShareTarget {
        title: poll.title.clone(),
        text: format!("Vote on this poll: {}", poll.title),
        url: share_url(origin, &poll.id),
    }
}

/// Download name for a poll's QR code.
pub fn qr_file_name(poll_id: &str) -> String {
    format!("poll-{}-qr.png", poll_id)
}
